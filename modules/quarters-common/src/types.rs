//! Core domain types. Shared by the store, the engine, and the API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Gender ---

/// Room assignment is strictly gender-segregated. The derive order doubles
/// as the canonical processing order (`Female` before `Male`) wherever a
/// fixed iteration order is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// All supported categories in canonical order.
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = crate::QuartersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            other => Err(crate::QuartersError::Validation(format!(
                "unknown gender: {other}"
            ))),
        }
    }
}

// --- Registrant ---

/// A person record. Created at registration time by the surrounding
/// application; the verification flag is flipped by an external workflow.
/// Age is always derived from `birth_date`, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registrant {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub verified: bool,
    pub registered_at: DateTime<Utc>,
}

// --- Room ---

/// A named accommodation unit. Managed by room administration (external);
/// only active rooms of the matching gender are allocation targets.
/// Capacity is at least 1, enforced by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub capacity: i32,
    pub active: bool,
}

// --- Allocation ---

/// The one-to-one binding of a registrant to a room. Never mutated in
/// place: reassignment is release + commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub registrant_id: Uuid,
    pub room_id: Uuid,
    /// Operator or process identity that created the record.
    pub allocated_by: String,
    pub allocated_at: DateTime<Utc>,
}
