//! Allocation persistence. The single write serialization point.
//!
//! Every insert runs in its own transaction holding a `FOR UPDATE` lock on
//! the target room row, and re-validates capacity, gender, and (when asked)
//! the age gap against the state visible inside that transaction. Planner
//! snapshots can therefore be arbitrarily stale without ever over-filling a
//! room or breaking the age-gap invariant.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use quarters_common::{compat, Allocation};

/// Why a commit was refused. Mirrors the precondition set of the manual
/// path: any of these can also surface on a batch pair when concurrent
/// writes invalidated the planner's snapshot.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("registrant is already allocated")]
    AlreadyAllocated,

    #[error("registrant not found")]
    RegistrantNotFound,

    #[error("room not found")]
    RoomNotFound,

    #[error("room is inactive")]
    RoomInactive,

    #[error("room is full")]
    RoomFull,

    #[error("registrant and room genders differ")]
    GenderMismatch,

    #[error("age gap exceeded: resulting range {resulting_range} exceeds limit {limit}")]
    AgeGapExceeded { resulting_range: i32, limit: i32 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AllocationRow {
    id: Uuid,
    registrant_id: Uuid,
    room_id: Uuid,
    allocated_by: String,
    allocated_at: DateTime<Utc>,
}

impl From<AllocationRow> for Allocation {
    fn from(row: AllocationRow) -> Self {
        Allocation {
            id: row.id,
            registrant_id: row.registrant_id,
            room_id: row.room_id,
            allocated_by: row.allocated_by,
            allocated_at: row.allocated_at,
        }
    }
}

#[derive(Clone)]
pub struct AllocationStore {
    pool: PgPool,
}

impl AllocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one allocation after re-validating against current state.
    ///
    /// `max_age_gap = None` skips the age check (the random path is
    /// capacity/gender only). The room row lock serializes concurrent
    /// commits per room; the unique index on `registrant_id` turns a racing
    /// double-allocate into `AlreadyAllocated` instead of a double write.
    pub async fn commit(
        &self,
        registrant_id: Uuid,
        room_id: Uuid,
        max_age_gap: Option<i32>,
        actor: &str,
    ) -> Result<Allocation, CommitError> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, (String, i32, bool)>(
            r#"
            SELECT gender, capacity, active
            FROM rooms
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((room_gender, capacity, active)) = room else {
            return Err(CommitError::RoomNotFound);
        };
        if !active {
            return Err(CommitError::RoomInactive);
        }

        let registrant = sqlx::query_as::<_, (String, NaiveDate)>(
            r#"
            SELECT gender, birth_date
            FROM registrants
            WHERE id = $1
            "#,
        )
        .bind(registrant_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((registrant_gender, birth_date)) = registrant else {
            return Err(CommitError::RegistrantNotFound);
        };
        if registrant_gender != room_gender {
            return Err(CommitError::GenderMismatch);
        }

        let occupants = sqlx::query_as::<_, (NaiveDate,)>(
            r#"
            SELECT r.birth_date
            FROM allocations a
            JOIN registrants r ON r.id = a.registrant_id
            WHERE a.room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_all(&mut *tx)
        .await?;

        if occupants.len() as i32 >= capacity {
            return Err(CommitError::RoomFull);
        }

        if let Some(limit) = max_age_gap {
            let today = Utc::now().date_naive();
            let mut ages: Vec<i32> = occupants
                .iter()
                .map(|(bd,)| compat::age_on(*bd, today))
                .collect();
            let candidate_age = compat::age_on(birth_date, today);
            if !compat::is_age_compatible(&ages, candidate_age, limit) {
                ages.push(candidate_age);
                return Err(CommitError::AgeGapExceeded {
                    resulting_range: compat::age_span(&ages),
                    limit,
                });
            }
        }

        let allocation = Allocation {
            id: Uuid::new_v4(),
            registrant_id,
            room_id,
            allocated_by: actor.to_string(),
            allocated_at: Utc::now(),
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO allocations (id, registrant_id, room_id, allocated_by, allocated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(allocation.id)
        .bind(allocation.registrant_id)
        .bind(allocation.room_id)
        .bind(&allocation.allocated_by)
        .bind(allocation.allocated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(CommitError::AlreadyAllocated);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(allocation)
    }

    /// Delete a registrant's allocation. Returns the removed record, or
    /// `None` when the registrant had none.
    pub async fn release(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            DELETE FROM allocations
            WHERE registrant_id = $1
            RETURNING id, registrant_id, room_id, allocated_by, allocated_at
            "#,
        )
        .bind(registrant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Allocation::from))
    }

    /// Current allocation for a registrant, if any.
    pub async fn allocation_for(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT id, registrant_id, room_id, allocated_by, allocated_at
            FROM allocations
            WHERE registrant_id = $1
            "#,
        )
        .bind(registrant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Allocation::from))
    }

    /// All allocations in a room, oldest first.
    pub async fn allocations_in(&self, room_id: Uuid) -> Result<Vec<Allocation>> {
        let rows = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT id, registrant_id, room_id, allocated_by, allocated_at
            FROM allocations
            WHERE room_id = $1
            ORDER BY allocated_at ASC, id ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Allocation::from).collect())
    }
}
