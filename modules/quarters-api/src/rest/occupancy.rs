//! Read-only room occupancy listing for the admin surface.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use quarters_common::{compat, Gender};

use crate::AppState;

use super::internal_error;

#[derive(Serialize)]
pub struct OccupantView {
    pub registrant_id: Uuid,
    pub age: i32,
}

#[derive(Serialize)]
pub struct RoomOccupancy {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub capacity: i32,
    pub occupants: Vec<OccupantView>,
    pub available: i32,
}

/// All active rooms of both genders with occupant ages and free slots.
pub async fn rooms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let today = Utc::now().date_naive();
    let mut out = Vec::new();

    for gender in Gender::ALL {
        let rooms = match state.rooms.available_rooms(gender).await {
            Ok(rooms) => rooms,
            Err(e) => return internal_error(e),
        };
        for entry in rooms {
            let occupants: Vec<OccupantView> = entry
                .occupants
                .iter()
                .map(|o| OccupantView {
                    registrant_id: o.registrant_id,
                    age: compat::age_on(o.birth_date, today),
                })
                .collect();
            let available = entry.room.capacity - occupants.len() as i32;
            out.push(RoomOccupancy {
                id: entry.room.id,
                name: entry.room.name,
                gender: entry.room.gender,
                capacity: entry.room.capacity,
                occupants,
                available,
            });
        }
    }

    (StatusCode::OK, Json(out)).into_response()
}
