//! Seams between the engine and its collaborators.
//!
//! Implemented by the Postgres stores (production) and by
//! [`MemoryRegistry`](crate::persist::MemoryRegistry) (tests).

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use quarters_common::{Allocation, Gender, Registrant};
use quarters_store::CommitError;

use crate::types::{Candidate, RoomSnapshot};

/// The set of registrants eligible for assignment.
#[async_trait]
pub trait CandidatePool: Send + Sync {
    /// Verified, unallocated registrants of one gender, youngest first.
    async fn unallocated_verified(&self, gender: Gender) -> Result<Vec<Candidate>>;

    /// Single registrant lookup for the manual path.
    async fn registrant(&self, id: Uuid) -> Result<Option<Registrant>>;
}

/// Read model of rooms and their occupants.
#[async_trait]
pub trait RoomState: Send + Sync {
    /// Active rooms of one gender with occupants, in stable store order
    /// (the order planners use to break ranking ties).
    async fn available_rooms(&self, gender: Gender) -> Result<Vec<RoomSnapshot>>;

    /// Single room lookup, inactive rooms included.
    async fn room(&self, id: Uuid) -> Result<Option<RoomSnapshot>>;
}

/// What the write boundary must re-validate before inserting.
/// `max_age_gap: None` means capacity and gender only (the random path).
#[derive(Debug, Clone, Copy)]
pub struct CommitGuard {
    pub max_age_gap: Option<i32>,
}

impl CommitGuard {
    pub fn age_bounded(limit: i32) -> Self {
        Self {
            max_age_gap: Some(limit),
        }
    }

    pub fn capacity_only() -> Self {
        Self { max_age_gap: None }
    }
}

/// The only component permitted to create or remove allocation records.
///
/// Implementations must make check-and-insert atomic per room so that
/// concurrent requests cannot jointly exceed capacity or break the age-gap
/// invariant.
#[async_trait]
pub trait AllocationLedger: Send + Sync {
    async fn commit(
        &self,
        registrant_id: Uuid,
        room_id: Uuid,
        guard: CommitGuard,
        actor: &str,
    ) -> Result<Allocation, CommitError>;

    /// Remove a registrant's allocation. `None` when there was none.
    async fn release(&self, registrant_id: Uuid) -> Result<Option<Allocation>>;

    async fn allocation_for(&self, registrant_id: Uuid) -> Result<Option<Allocation>>;

    async fn allocations_in(&self, room_id: Uuid) -> Result<Vec<Allocation>>;
}
