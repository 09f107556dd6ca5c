//! The allocation engine: read a snapshot, plan, commit through the ledger.
//!
//! Planning is optimistic: the ledger re-validates every pair against
//! current state under a per-room lock, so a stale snapshot degrades into
//! folded-in commit failures, never into a broken invariant.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use uuid::Uuid;

use quarters_common::{compat, Allocation, Gender};

use crate::error::{AllocationRejection, BatchError, ManualError};
use crate::traits::{AllocationLedger, CandidatePool, CommitGuard, RoomState};
use crate::types::{
    status_for, Candidate, GroupStatus, GroupedReport, RandomReport, RoomSnapshot,
};
use crate::{grouped, random};

pub struct AllocationEngine<P, R, L> {
    candidates: P,
    rooms: R,
    ledger: L,
}

impl<P, R, L> AllocationEngine<P, R, L>
where
    P: CandidatePool,
    R: RoomState,
    L: AllocationLedger,
{
    pub fn new(candidates: P, rooms: R, ledger: L) -> Self {
        Self {
            candidates,
            rooms,
            ledger,
        }
    }

    async fn snapshot(&self) -> Result<(Vec<Candidate>, Vec<RoomSnapshot>), anyhow::Error> {
        let mut candidates = Vec::new();
        let mut rooms = Vec::new();
        for gender in Gender::ALL {
            candidates.extend(self.candidates.unallocated_verified(gender).await?);
            rooms.extend(self.rooms.available_rooms(gender).await?);
        }
        Ok((candidates, rooms))
    }

    /// Batch allocation with fixed-width age bands, younger bands first.
    pub async fn allocate_grouped(
        &self,
        age_range_years: i32,
        max_age_gap: i32,
        actor: &str,
    ) -> Result<GroupedReport, BatchError> {
        if age_range_years < 1 {
            return Err(BatchError::InvalidAgeRange);
        }

        let (candidates, rooms) = self.snapshot().await?;
        let today = Utc::now().date_naive();
        let plan = grouped::plan(&candidates, &rooms, age_range_years, max_age_gap, today);
        let mut groups = plan.groups;

        for pair in &plan.pairs {
            let result = self
                .ledger
                .commit(
                    pair.registrant_id,
                    pair.room_id,
                    CommitGuard::age_bounded(max_age_gap),
                    actor,
                )
                .await;
            if let Err(e) = result {
                warn!(
                    registrant = %pair.registrant_id,
                    room = %pair.room_id,
                    "grouped commit refused: {e}"
                );
                let outcome = &mut groups[pair.group];
                outcome.allocated -= 1;
                outcome.remaining += 1;
                outcome.status = status_for(outcome.allocated, outcome.remaining);
                let note = format!("commit refused: {e}");
                outcome.reason = Some(match outcome.reason.take() {
                    Some(existing) => format!("{existing}; {note}"),
                    None => note,
                });
            }
        }

        let report = GroupedReport {
            total_candidates: groups.iter().map(|g| g.candidates).sum(),
            total_allocated: groups.iter().map(|g| g.allocated).sum(),
            total_remaining: groups.iter().map(|g| g.remaining).sum(),
            groups,
        };
        info!(
            allocated = report.total_allocated,
            remaining = report.total_remaining,
            "grouped allocation complete"
        );
        Ok(report)
    }

    /// Batch allocation with uniform shuffling, capacity/gender only.
    pub async fn allocate_random(&self, actor: &str) -> Result<RandomReport, anyhow::Error> {
        let mut rng = rand::rngs::StdRng::from_os_rng();
        self.allocate_random_with(&mut rng, actor).await
    }

    /// Same as [`allocate_random`](Self::allocate_random) with a
    /// caller-supplied RNG, so tests can pin the permutation.
    pub async fn allocate_random_with<G: Rng + ?Sized>(
        &self,
        rng: &mut G,
        actor: &str,
    ) -> Result<RandomReport, anyhow::Error> {
        let (candidates, rooms) = self.snapshot().await?;
        let plan = random::plan(&candidates, &rooms, rng);
        let mut groups = plan.groups;

        for pair in &plan.pairs {
            let result = self
                .ledger
                .commit(
                    pair.registrant_id,
                    pair.room_id,
                    CommitGuard::capacity_only(),
                    actor,
                )
                .await;
            if let Err(e) = result {
                warn!(
                    registrant = %pair.registrant_id,
                    room = %pair.room_id,
                    "random commit refused: {e}"
                );
                let outcome = &mut groups[pair.group];
                outcome.allocated -= 1;
                outcome.remaining += 1;
                // Random groups only ever report success or partial.
                outcome.status = GroupStatus::Partial;
                let note = format!("commit refused: {e}");
                outcome.reason = Some(match outcome.reason.take() {
                    Some(existing) => format!("{existing}; {note}"),
                    None => note,
                });
            }
        }

        let report = RandomReport {
            total_candidates: groups.iter().map(|g| g.candidates).sum(),
            total_allocated: groups.iter().map(|g| g.allocated).sum(),
            total_remaining: groups.iter().map(|g| g.remaining).sum(),
            groups,
        };
        info!(
            allocated = report.total_allocated,
            remaining = report.total_remaining,
            "random allocation complete"
        );
        Ok(report)
    }

    /// Operator-driven single assignment. Preconditions are checked in a
    /// fixed order so the caller always gets the first failing reason; the
    /// ledger then re-validates under the room lock.
    pub async fn allocate_manual(
        &self,
        registrant_id: Uuid,
        room_id: Uuid,
        max_age_gap: i32,
        actor: &str,
    ) -> Result<Allocation, ManualError> {
        let registrant = self
            .candidates
            .registrant(registrant_id)
            .await
            .map_err(ManualError::Store)?
            .ok_or(AllocationRejection::RegistrantNotFound(registrant_id))?;
        if !registrant.verified {
            return Err(AllocationRejection::NotVerified(registrant_id).into());
        }
        if self
            .ledger
            .allocation_for(registrant_id)
            .await
            .map_err(ManualError::Store)?
            .is_some()
        {
            return Err(AllocationRejection::AlreadyAllocated(registrant_id).into());
        }

        let room = self
            .rooms
            .room(room_id)
            .await
            .map_err(ManualError::Store)?
            .ok_or(AllocationRejection::RoomNotFound(room_id))?;
        if !room.active {
            return Err(AllocationRejection::RoomInactive(room_id).into());
        }
        if room.available() <= 0 {
            return Err(AllocationRejection::RoomFull(room_id).into());
        }
        if registrant.gender != room.gender {
            return Err(AllocationRejection::GenderMismatch {
                registrant: registrant.gender,
                room: room.gender,
            }
            .into());
        }

        let ages = room.occupant_ages();
        let age = compat::age_on(registrant.birth_date, Utc::now().date_naive());
        if !compat::is_age_compatible(&ages, age, max_age_gap) {
            let mut combined = ages;
            combined.push(age);
            return Err(AllocationRejection::AgeGapExceeded {
                resulting_range: compat::age_span(&combined),
                limit: max_age_gap,
            }
            .into());
        }

        let allocation = self
            .ledger
            .commit(
                registrant_id,
                room_id,
                CommitGuard::age_bounded(max_age_gap),
                actor,
            )
            .await
            .map_err(|e| {
                ManualError::from_commit(e, registrant_id, room_id, registrant.gender, room.gender)
            })?;

        info!(
            registrant = %registrant_id,
            room = %room_id,
            by = actor,
            "manual allocation created"
        );
        Ok(allocation)
    }

    /// Remove a registrant's allocation. The inverse of the manual path.
    pub async fn unassign(&self, registrant_id: Uuid) -> Result<Allocation, ManualError> {
        match self
            .ledger
            .release(registrant_id)
            .await
            .map_err(ManualError::Store)?
        {
            Some(allocation) => {
                info!(registrant = %registrant_id, "allocation removed");
                Ok(allocation)
            }
            None => Err(AllocationRejection::NotAllocated(registrant_id).into()),
        }
    }
}
