//! The randomized planner.
//!
//! Rooms are flattened into unit slots, candidates and slots are shuffled
//! independently, and candidates walk the slot list round-robin. This path
//! checks capacity and gender only; it deliberately does not apply the
//! age-gap rule (the deterministic and manual paths do).
//!
//! The RNG is injected so tests can seed it and assert exact outcomes.

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use quarters_common::Gender;

use crate::types::{Candidate, GroupStatus, PlannedPair, RandomOutcome, RandomPlan, RoomSnapshot};

/// Compute a random plan for both genders.
pub fn plan<R: Rng + ?Sized>(
    candidates: &[Candidate],
    rooms: &[RoomSnapshot],
    rng: &mut R,
) -> RandomPlan {
    let mut pairs = Vec::new();
    let mut groups = Vec::new();

    for gender in Gender::ALL {
        let group = groups.len();

        let mut pool: Vec<Uuid> = candidates
            .iter()
            .filter(|c| c.gender == gender)
            .map(|c| c.id)
            .collect();

        // One slot per unit of free capacity.
        let mut slots: Vec<Uuid> = rooms
            .iter()
            .filter(|r| r.active && r.gender == gender)
            .flat_map(|r| std::iter::repeat(r.id).take(r.available().max(0) as usize))
            .collect();

        pool.shuffle(rng);
        slots.shuffle(rng);

        let total = pool.len();
        let mut allocated = 0usize;
        let mut used = vec![false; slots.len()];

        if !slots.is_empty() {
            for (i, registrant_id) in pool.iter().enumerate() {
                if allocated == slots.len() {
                    break;
                }
                // Prefer slot i mod n; scan forward (wrapping) past
                // exhausted slots. Termination: at least one slot is free.
                let mut idx = i % slots.len();
                while used[idx] {
                    idx = (idx + 1) % slots.len();
                }
                used[idx] = true;
                pairs.push(PlannedPair {
                    registrant_id: *registrant_id,
                    room_id: slots[idx],
                    group,
                });
                allocated += 1;
            }
        }

        let remaining = total - allocated;
        // This path has no failure mode of its own; a group is either fully
        // placed or partially placed (including zero slots).
        let status = if remaining == 0 {
            GroupStatus::Success
        } else {
            GroupStatus::Partial
        };
        groups.push(RandomOutcome {
            gender,
            candidates: total,
            allocated,
            remaining,
            status,
            reason: None,
        });
    }

    RandomPlan { pairs, groups }
}
