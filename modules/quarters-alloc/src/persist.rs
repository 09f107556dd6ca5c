//! Collaborator implementations.
//!
//! Production wires the Postgres stores; tests wire [`MemoryRegistry`],
//! which applies the same commit validation rules synchronously.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use quarters_common::{compat, Allocation, Gender, Registrant, Room};
use quarters_store::{AllocationStore, CommitError, RegistrantStore, RoomStore};

use crate::traits::{AllocationLedger, CandidatePool, CommitGuard, RoomState};
use crate::types::{Candidate, Occupant, RoomSnapshot};

// ---------------------------------------------------------------------------
// Postgres adapters (production)
// ---------------------------------------------------------------------------

#[async_trait]
impl CandidatePool for RegistrantStore {
    async fn unallocated_verified(&self, gender: Gender) -> Result<Vec<Candidate>> {
        let registrants = RegistrantStore::unallocated_verified(self, gender).await?;
        Ok(registrants
            .into_iter()
            .map(|r| Candidate {
                id: r.id,
                gender: r.gender,
                birth_date: r.birth_date,
            })
            .collect())
    }

    async fn registrant(&self, id: Uuid) -> Result<Option<Registrant>> {
        RegistrantStore::registrant(self, id).await
    }
}

fn snapshot_from(room: Room, occupants: Vec<quarters_store::OccupantRecord>, today: NaiveDate) -> RoomSnapshot {
    RoomSnapshot {
        id: room.id,
        name: room.name,
        gender: room.gender,
        capacity: room.capacity,
        active: room.active,
        occupants: occupants
            .into_iter()
            .map(|o| Occupant {
                registrant_id: o.registrant_id,
                age: compat::age_on(o.birth_date, today),
            })
            .collect(),
    }
}

#[async_trait]
impl RoomState for RoomStore {
    async fn available_rooms(&self, gender: Gender) -> Result<Vec<RoomSnapshot>> {
        let today = Utc::now().date_naive();
        let rooms = RoomStore::available_rooms(self, gender).await?;
        Ok(rooms
            .into_iter()
            .map(|r| snapshot_from(r.room, r.occupants, today))
            .collect())
    }

    async fn room(&self, id: Uuid) -> Result<Option<RoomSnapshot>> {
        let today = Utc::now().date_naive();
        let room = RoomStore::room(self, id).await?;
        Ok(room.map(|r| snapshot_from(r.room, r.occupants, today)))
    }
}

#[async_trait]
impl AllocationLedger for AllocationStore {
    async fn commit(
        &self,
        registrant_id: Uuid,
        room_id: Uuid,
        guard: CommitGuard,
        actor: &str,
    ) -> Result<Allocation, CommitError> {
        AllocationStore::commit(self, registrant_id, room_id, guard.max_age_gap, actor).await
    }

    async fn release(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        AllocationStore::release(self, registrant_id).await
    }

    async fn allocation_for(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        AllocationStore::allocation_for(self, registrant_id).await
    }

    async fn allocations_in(&self, room_id: Uuid) -> Result<Vec<Allocation>> {
        AllocationStore::allocations_in(self, room_id).await
    }
}

// ---------------------------------------------------------------------------
// MemoryRegistry (tests, no database required)
// ---------------------------------------------------------------------------

/// In-memory registrant/room/allocation registry. Thread-safe. Applies the
/// same commit validation as the Postgres store, minus the SQL.
pub struct MemoryRegistry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    registrants: Vec<Registrant>,
    rooms: Vec<Room>,
    allocations: Vec<Allocation>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn add_registrant(&self, registrant: Registrant) {
        self.inner.lock().unwrap().registrants.push(registrant);
    }

    pub fn add_room(&self, room: Room) {
        self.inner.lock().unwrap().rooms.push(room);
    }

    /// All persisted allocations (for test assertions).
    pub fn allocations(&self) -> Vec<Allocation> {
        self.inner.lock().unwrap().allocations.clone()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn occupants_of(&self, room_id: Uuid, today: NaiveDate) -> Vec<Occupant> {
        self.allocations
            .iter()
            .filter(|a| a.room_id == room_id)
            .filter_map(|a| {
                self.registrants
                    .iter()
                    .find(|r| r.id == a.registrant_id)
                    .map(|r| Occupant {
                        registrant_id: r.id,
                        age: compat::age_on(r.birth_date, today),
                    })
            })
            .collect()
    }

    fn snapshot(&self, room: &Room, today: NaiveDate) -> RoomSnapshot {
        RoomSnapshot {
            id: room.id,
            name: room.name.clone(),
            gender: room.gender,
            capacity: room.capacity,
            active: room.active,
            occupants: self.occupants_of(room.id, today),
        }
    }
}

#[async_trait]
impl CandidatePool for MemoryRegistry {
    async fn unallocated_verified(&self, gender: Gender) -> Result<Vec<Candidate>> {
        let inner = self.inner.lock().unwrap();
        let mut candidates: Vec<Candidate> = inner
            .registrants
            .iter()
            .filter(|r| r.verified && r.gender == gender)
            .filter(|r| !inner.allocations.iter().any(|a| a.registrant_id == r.id))
            .map(|r| Candidate {
                id: r.id,
                gender: r.gender,
                birth_date: r.birth_date,
            })
            .collect();
        // Same ordering contract as the Postgres store: youngest first.
        candidates.sort_by(|a, b| b.birth_date.cmp(&a.birth_date).then(a.id.cmp(&b.id)));
        Ok(candidates)
    }

    async fn registrant(&self, id: Uuid) -> Result<Option<Registrant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.registrants.iter().find(|r| r.id == id).cloned())
    }
}

#[async_trait]
impl RoomState for MemoryRegistry {
    async fn available_rooms(&self, gender: Gender) -> Result<Vec<RoomSnapshot>> {
        let today = Utc::now().date_naive();
        let inner = self.inner.lock().unwrap();
        let mut rooms: Vec<&Room> = inner
            .rooms
            .iter()
            .filter(|r| r.active && r.gender == gender)
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rooms
            .into_iter()
            .map(|r| inner.snapshot(r, today))
            .collect())
    }

    async fn room(&self, id: Uuid) -> Result<Option<RoomSnapshot>> {
        let today = Utc::now().date_naive();
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rooms
            .iter()
            .find(|r| r.id == id)
            .map(|r| inner.snapshot(r, today)))
    }
}

#[async_trait]
impl AllocationLedger for MemoryRegistry {
    async fn commit(
        &self,
        registrant_id: Uuid,
        room_id: Uuid,
        guard: CommitGuard,
        actor: &str,
    ) -> Result<Allocation, CommitError> {
        let mut inner = self.inner.lock().unwrap();

        let room = inner
            .rooms
            .iter()
            .find(|r| r.id == room_id)
            .cloned()
            .ok_or(CommitError::RoomNotFound)?;
        if !room.active {
            return Err(CommitError::RoomInactive);
        }

        let registrant = inner
            .registrants
            .iter()
            .find(|r| r.id == registrant_id)
            .cloned()
            .ok_or(CommitError::RegistrantNotFound)?;
        if registrant.gender != room.gender {
            return Err(CommitError::GenderMismatch);
        }

        let today = Utc::now().date_naive();
        let occupants = inner.occupants_of(room_id, today);
        if occupants.len() as i32 >= room.capacity {
            return Err(CommitError::RoomFull);
        }

        if let Some(limit) = guard.max_age_gap {
            let mut ages: Vec<i32> = occupants.iter().map(|o| o.age).collect();
            let candidate_age = compat::age_on(registrant.birth_date, today);
            if !compat::is_age_compatible(&ages, candidate_age, limit) {
                ages.push(candidate_age);
                return Err(CommitError::AgeGapExceeded {
                    resulting_range: compat::age_span(&ages),
                    limit,
                });
            }
        }

        if inner
            .allocations
            .iter()
            .any(|a| a.registrant_id == registrant_id)
        {
            return Err(CommitError::AlreadyAllocated);
        }

        let allocation = Allocation {
            id: Uuid::new_v4(),
            registrant_id,
            room_id,
            allocated_by: actor.to_string(),
            allocated_at: Utc::now(),
        };
        inner.allocations.push(allocation.clone());
        Ok(allocation)
    }

    async fn release(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        let mut inner = self.inner.lock().unwrap();
        let position = inner
            .allocations
            .iter()
            .position(|a| a.registrant_id == registrant_id);
        Ok(position.map(|idx| inner.allocations.remove(idx)))
    }

    async fn allocation_for(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .allocations
            .iter()
            .find(|a| a.registrant_id == registrant_id)
            .cloned())
    }

    async fn allocations_in(&self, room_id: Uuid) -> Result<Vec<Allocation>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .allocations
            .iter()
            .filter(|a| a.room_id == room_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Arc<T> blankets so tests can share one registry across all three seams
// ---------------------------------------------------------------------------

#[async_trait]
impl<P: CandidatePool + ?Sized> CandidatePool for Arc<P> {
    async fn unallocated_verified(&self, gender: Gender) -> Result<Vec<Candidate>> {
        (**self).unallocated_verified(gender).await
    }

    async fn registrant(&self, id: Uuid) -> Result<Option<Registrant>> {
        (**self).registrant(id).await
    }
}

#[async_trait]
impl<R: RoomState + ?Sized> RoomState for Arc<R> {
    async fn available_rooms(&self, gender: Gender) -> Result<Vec<RoomSnapshot>> {
        (**self).available_rooms(gender).await
    }

    async fn room(&self, id: Uuid) -> Result<Option<RoomSnapshot>> {
        (**self).room(id).await
    }
}

#[async_trait]
impl<L: AllocationLedger + ?Sized> AllocationLedger for Arc<L> {
    async fn commit(
        &self,
        registrant_id: Uuid,
        room_id: Uuid,
        guard: CommitGuard,
        actor: &str,
    ) -> Result<Allocation, CommitError> {
        (**self).commit(registrant_id, room_id, guard, actor).await
    }

    async fn release(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        (**self).release(registrant_id).await
    }

    async fn allocation_for(&self, registrant_id: Uuid) -> Result<Option<Allocation>> {
        (**self).allocation_for(registrant_id).await
    }

    async fn allocations_in(&self, room_id: Uuid) -> Result<Vec<Allocation>> {
        (**self).allocations_in(room_id).await
    }
}
