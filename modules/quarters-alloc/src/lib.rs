//! The accommodation allocation engine.
//!
//! Assigns verified registrants to gender-segregated rooms under capacity
//! and age-gap constraints. Three paths share one write boundary:
//!
//! - the age-grouped planner (deterministic, younger bands pick first),
//! - the random planner (seeded shuffle, capacity/gender only),
//! - the manual path (single pair, fail-fast precondition ladder).
//!
//! Planners are pure functions over snapshots; all mutation goes through
//! the [`AllocationLedger`], which re-validates against current state at
//! write time. Consumers wire the Postgres stores in production and
//! [`MemoryRegistry`] in tests.

pub mod engine;
pub mod error;
pub mod grouped;
pub mod persist;
pub mod random;
pub mod traits;
pub mod types;

pub use quarters_common::compat;

pub use engine::AllocationEngine;
pub use error::{AllocationRejection, BatchError, ManualError};
pub use persist::MemoryRegistry;
pub use traits::{AllocationLedger, CandidatePool, CommitGuard, RoomState};
pub use types::{
    Candidate, GroupOutcome, GroupStatus, GroupedPlan, GroupedReport, Occupant, PlannedPair,
    RandomOutcome, RandomPlan, RandomReport, RoomSnapshot,
};
