//! Read store for rooms and their current occupants. The engine's room
//! state view.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use quarters_common::{Gender, Room};

#[derive(Debug, Clone, sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    name: String,
    gender: String,
    capacity: i32,
    active: bool,
}

impl TryFrom<RoomRow> for Room {
    type Error = anyhow::Error;

    fn try_from(row: RoomRow) -> Result<Self> {
        Ok(Room {
            id: row.id,
            name: row.name,
            gender: row.gender.parse()?,
            capacity: row.capacity,
            active: row.active,
        })
    }
}

/// A current occupant of a room. Birth date rather than age: age is derived
/// by the consumer against its own reference date.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OccupantRecord {
    pub registrant_id: Uuid,
    pub birth_date: NaiveDate,
}

/// A room snapshot with its occupant list as of the query.
#[derive(Debug, Clone)]
pub struct RoomWithOccupants {
    pub room: Room,
    pub occupants: Vec<OccupantRecord>,
}

#[derive(Clone)]
pub struct RoomStore {
    pool: PgPool,
}

impl RoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All active rooms of one gender with their occupants, ordered by name
    /// then id. That ordering is the stable tie-break the planners rely on.
    pub async fn available_rooms(&self, gender: Gender) -> Result<Vec<RoomWithOccupants>> {
        let rooms = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, name, gender, capacity, active
            FROM rooms
            WHERE active = TRUE AND gender = $1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(gender.as_str())
        .fetch_all(&self.pool)
        .await?;

        let occupants = sqlx::query_as::<_, (Uuid, Uuid, NaiveDate)>(
            r#"
            SELECT a.room_id, a.registrant_id, r.birth_date
            FROM allocations a
            JOIN registrants r ON r.id = a.registrant_id
            JOIN rooms rm ON rm.id = a.room_id
            WHERE rm.active = TRUE AND rm.gender = $1
            "#,
        )
        .bind(gender.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut by_room: HashMap<Uuid, Vec<OccupantRecord>> = HashMap::new();
        for (room_id, registrant_id, birth_date) in occupants {
            by_room.entry(room_id).or_default().push(OccupantRecord {
                registrant_id,
                birth_date,
            });
        }

        rooms
            .into_iter()
            .map(|row| {
                let occupants = by_room.remove(&row.id).unwrap_or_default();
                Ok(RoomWithOccupants {
                    room: Room::try_from(row)?,
                    occupants,
                })
            })
            .collect()
    }

    /// Single room lookup including inactive rooms (manual path checks the
    /// active flag itself so it can report a precise rejection).
    pub async fn room(&self, id: Uuid) -> Result<Option<RoomWithOccupants>> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, name, gender, capacity, active
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let occupants = sqlx::query_as::<_, OccupantRecord>(
            r#"
            SELECT a.registrant_id, r.birth_date
            FROM allocations a
            JOIN registrants r ON r.id = a.registrant_id
            WHERE a.room_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RoomWithOccupants {
            room: Room::try_from(row)?,
            occupants,
        }))
    }
}
