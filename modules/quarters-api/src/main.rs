use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quarters_alloc::AllocationEngine;
use quarters_common::Config;
use quarters_store::{AllocationStore, RegistrantStore, RoomStore, SettingsStore};

mod rest;

pub struct AppState {
    pub engine: AllocationEngine<RegistrantStore, RoomStore, AllocationStore>,
    pub rooms: RoomStore,
    pub settings: SettingsStore,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quarters=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = quarters_store::connect(&config.database_url).await?;
    quarters_store::migrate(&pool).await?;
    info!("Connected to database, migrations complete");

    let state = Arc::new(AppState {
        engine: AllocationEngine::new(
            RegistrantStore::new(pool.clone()),
            RoomStore::new(pool.clone()),
            AllocationStore::new(pool.clone()),
        ),
        rooms: RoomStore::new(pool.clone()),
        settings: SettingsStore::new(pool, config.max_age_gap),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Allocation engine
        .route("/api/allocations/grouped", post(rest::allocate::grouped))
        .route("/api/allocations/random", post(rest::allocate::random))
        .route("/api/allocations/manual", post(rest::allocate::manual))
        .route(
            "/api/allocations/manual/{registrant_id}",
            delete(rest::allocate::unassign),
        )
        // Read surfaces
        .route("/api/rooms/occupancy", get(rest::occupancy::rooms))
        .with_state(state)
        // Logging layer: method + path + status + latency
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Quarters API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
