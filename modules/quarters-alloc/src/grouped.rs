//! The deterministic age-grouped planner.
//!
//! Candidates are bucketed into fixed-width age bands per gender and bands
//! are processed youngest-first, so younger participants get first pick of
//! rooms. Pure: same snapshot, same width, same plan.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use quarters_common::{compat, Gender};

use crate::types::{
    status_for, Candidate, GroupOutcome, GroupedPlan, PlannedPair, RoomSnapshot,
};

const NO_COMPATIBLE_ROOM: &str = "no age-compatible room available";
const INSUFFICIENT_CAPACITY: &str = "insufficient capacity in age-compatible rooms";

/// Mutable working view of one room while the plan is being built.
/// Assignments made for earlier bands are visible to later bands.
struct WorkingRoom {
    id: Uuid,
    gender: Gender,
    capacity: i32,
    ages: Vec<i32>,
}

impl WorkingRoom {
    fn available(&self) -> i32 {
        self.capacity - self.ages.len() as i32
    }

    /// Empty rooms always suit. Occupied rooms suit only if their current
    /// span combined with the band's full [lo, hi] range stays within the
    /// gap limit. Band bounds, not member ages, so the test is independent
    /// of which members end up placed.
    fn suits(&self, bucket_lo: i32, bucket_hi: i32, max_age_gap: i32) -> bool {
        if self.ages.is_empty() {
            return true;
        }
        let min = self.ages.iter().min().copied().unwrap_or(bucket_lo).min(bucket_lo);
        let max = self.ages.iter().max().copied().unwrap_or(bucket_hi).max(bucket_hi);
        max - min <= max_age_gap
    }
}

/// Compute a full grouped plan for both genders.
///
/// `age_range_years` is the band width (validated ≥ 1 by the caller);
/// `today` is the reference date for all derived ages, passed in so runs
/// are reproducible in tests.
pub fn plan(
    candidates: &[Candidate],
    rooms: &[RoomSnapshot],
    age_range_years: i32,
    max_age_gap: i32,
    today: NaiveDate,
) -> GroupedPlan {
    // Input order is the tie-break order, so keep it.
    let mut working: Vec<WorkingRoom> = rooms
        .iter()
        .filter(|r| r.active)
        .map(|r| WorkingRoom {
            id: r.id,
            gender: r.gender,
            capacity: r.capacity,
            ages: r.occupant_ages(),
        })
        .collect();

    // BTreeMap iteration gives the processing order for free: gender in
    // canonical order, then band lower bound ascending.
    let mut buckets: BTreeMap<(Gender, i32), Vec<(Uuid, i32)>> = BTreeMap::new();
    for candidate in candidates {
        let age = compat::age_on(candidate.birth_date, today);
        let lo = (age / age_range_years) * age_range_years;
        buckets
            .entry((candidate.gender, lo))
            .or_default()
            .push((candidate.id, age));
    }

    let mut pairs = Vec::new();
    let mut groups = Vec::new();

    for ((gender, lo), mut members) in buckets {
        let hi = lo + age_range_years - 1;
        let total = members.len();
        let group = groups.len();

        // Youngest first within the band; stable sort keeps pool order for
        // equal ages.
        members.sort_by_key(|(_, age)| *age);

        // Rank suitable rooms: empty first, then by descending remaining
        // capacity, ties in input order.
        let mut ranked: Vec<usize> = working
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.gender == gender && r.available() > 0 && r.suits(lo, hi, max_age_gap)
            })
            .map(|(idx, _)| idx)
            .collect();
        ranked.sort_by_key(|&idx| {
            (
                !working[idx].ages.is_empty(),
                std::cmp::Reverse(working[idx].available()),
            )
        });

        let had_any_room = !ranked.is_empty();

        let mut allocated = 0usize;
        let mut members_iter = members.into_iter();
        'rooms: for idx in ranked {
            while working[idx].available() > 0 {
                let Some((registrant_id, age)) = members_iter.next() else {
                    break 'rooms;
                };
                working[idx].ages.push(age);
                pairs.push(PlannedPair {
                    registrant_id,
                    room_id: working[idx].id,
                    group,
                });
                allocated += 1;
            }
        }

        let remaining = total - allocated;
        let status = status_for(allocated, remaining);
        let reason = if remaining == 0 {
            None
        } else if !had_any_room {
            Some(NO_COMPATIBLE_ROOM.to_string())
        } else {
            Some(INSUFFICIENT_CAPACITY.to_string())
        };

        groups.push(GroupOutcome {
            gender,
            bucket_lo: lo,
            bucket_hi: hi,
            candidates: total,
            allocated,
            remaining,
            status,
            reason,
        });
    }

    GroupedPlan { pairs, groups }
}
