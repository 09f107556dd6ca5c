//! Snapshot and report types for the allocation engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quarters_common::Gender;

// --- Snapshots (planner input) ---

/// An allocatable registrant: verified, unallocated, of a known gender.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub gender: Gender,
    pub birth_date: NaiveDate,
}

/// A current occupant with their age as of the snapshot's reference date.
#[derive(Debug, Clone, Serialize)]
pub struct Occupant {
    pub registrant_id: Uuid,
    pub age: i32,
}

/// A room with its occupants as seen at planning time.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub capacity: i32,
    pub active: bool,
    pub occupants: Vec<Occupant>,
}

impl RoomSnapshot {
    pub fn available(&self) -> i32 {
        self.capacity - self.occupants.len() as i32
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn occupant_ages(&self) -> Vec<i32> {
        self.occupants.iter().map(|o| o.age).collect()
    }
}

// --- Plans (planner output) ---

/// One proposed assignment. `group` indexes into the plan's outcome list so
/// commit failures can be folded back into the right report row.
#[derive(Debug, Clone)]
pub struct PlannedPair {
    pub registrant_id: Uuid,
    pub room_id: Uuid,
    pub group: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Success,
    Partial,
    Failed,
}

/// Derive a group's status from its counts. Zero candidates is a success.
pub(crate) fn status_for(allocated: usize, remaining: usize) -> GroupStatus {
    if remaining == 0 {
        GroupStatus::Success
    } else if allocated > 0 {
        GroupStatus::Partial
    } else {
        GroupStatus::Failed
    }
}

/// Per age-band outcome of a grouped run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub gender: Gender,
    pub bucket_lo: i32,
    pub bucket_hi: i32,
    pub candidates: usize,
    pub allocated: usize,
    pub remaining: usize,
    pub status: GroupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupedPlan {
    pub pairs: Vec<PlannedPair>,
    pub groups: Vec<GroupOutcome>,
}

/// Batch report returned by the grouped endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedReport {
    pub groups: Vec<GroupOutcome>,
    pub total_candidates: usize,
    pub total_allocated: usize,
    pub total_remaining: usize,
}

/// Per gender outcome of a random run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomOutcome {
    pub gender: Gender,
    pub candidates: usize,
    pub allocated: usize,
    pub remaining: usize,
    pub status: GroupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RandomPlan {
    pub pairs: Vec<PlannedPair>,
    pub groups: Vec<RandomOutcome>,
}

/// Batch report returned by the random endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomReport {
    pub groups: Vec<RandomOutcome>,
    pub total_candidates: usize,
    pub total_allocated: usize,
    pub total_remaining: usize,
}
