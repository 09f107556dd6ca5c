//! Error taxonomy of the engine.
//!
//! Validation errors reject a batch before anything is read or written.
//! State-precondition rejections carry a stable machine-checkable code for
//! the manual path. Partial batch outcomes are not errors; they live in the
//! reports.

use thiserror::Error;
use uuid::Uuid;

use quarters_common::Gender;
use quarters_store::CommitError;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("age_range_years must be a positive integer")]
    InvalidAgeRange,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Why a manual allocation (or unassignment) was refused.
#[derive(Error, Debug)]
pub enum AllocationRejection {
    #[error("registrant {0} not found")]
    RegistrantNotFound(Uuid),

    #[error("registrant {0} is not verified")]
    NotVerified(Uuid),

    #[error("registrant {0} is already allocated")]
    AlreadyAllocated(Uuid),

    #[error("room {0} not found")]
    RoomNotFound(Uuid),

    #[error("room {0} is inactive")]
    RoomInactive(Uuid),

    #[error("room {0} is full")]
    RoomFull(Uuid),

    #[error("gender mismatch: registrant is {registrant}, room is {room}")]
    GenderMismatch { registrant: Gender, room: Gender },

    #[error("age gap exceeded: resulting range {resulting_range} exceeds limit {limit}")]
    AgeGapExceeded { resulting_range: i32, limit: i32 },

    #[error("registrant {0} has no allocation")]
    NotAllocated(Uuid),
}

impl AllocationRejection {
    /// Stable snake_case code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            AllocationRejection::RegistrantNotFound(_) => "registrant_not_found",
            AllocationRejection::NotVerified(_) => "not_verified",
            AllocationRejection::AlreadyAllocated(_) => "already_allocated",
            AllocationRejection::RoomNotFound(_) => "room_not_found",
            AllocationRejection::RoomInactive(_) => "room_inactive",
            AllocationRejection::RoomFull(_) => "room_full",
            AllocationRejection::GenderMismatch { .. } => "gender_mismatch",
            AllocationRejection::AgeGapExceeded { .. } => "age_gap_exceeded",
            AllocationRejection::NotAllocated(_) => "not_allocated",
        }
    }
}

#[derive(Error, Debug)]
pub enum ManualError {
    #[error(transparent)]
    Rejected(#[from] AllocationRejection),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl ManualError {
    /// Translate a write-time commit refusal into the manual rejection
    /// vocabulary. The genders are the ladder's already-loaded values; the
    /// commit error itself does not carry them.
    pub(crate) fn from_commit(
        err: CommitError,
        registrant_id: Uuid,
        room_id: Uuid,
        registrant_gender: Gender,
        room_gender: Gender,
    ) -> Self {
        match err {
            CommitError::AlreadyAllocated => {
                AllocationRejection::AlreadyAllocated(registrant_id).into()
            }
            CommitError::RegistrantNotFound => {
                AllocationRejection::RegistrantNotFound(registrant_id).into()
            }
            CommitError::RoomNotFound => AllocationRejection::RoomNotFound(room_id).into(),
            CommitError::RoomInactive => AllocationRejection::RoomInactive(room_id).into(),
            CommitError::RoomFull => AllocationRejection::RoomFull(room_id).into(),
            CommitError::GenderMismatch => AllocationRejection::GenderMismatch {
                registrant: registrant_gender,
                room: room_gender,
            }
            .into(),
            CommitError::AgeGapExceeded {
                resulting_range,
                limit,
            } => AllocationRejection::AgeGapExceeded {
                resulting_range,
                limit,
            }
            .into(),
            CommitError::Database(e) => ManualError::Store(e.into()),
        }
    }
}
