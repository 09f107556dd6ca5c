//! Postgres persistence for registrants, rooms, allocations, and settings.
//!
//! The allocation store is the single write serialization point: all
//! allocation inserts go through a per-room row lock with re-validation
//! against current state. Reads are plain snapshots.

pub mod allocations;
pub mod registrants;
pub mod rooms;
pub mod settings;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use allocations::{AllocationStore, CommitError};
pub use registrants::RegistrantStore;
pub use rooms::{OccupantRecord, RoomStore, RoomWithOccupants};
pub use settings::SettingsStore;

/// Open a connection pool against the given database URL.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
