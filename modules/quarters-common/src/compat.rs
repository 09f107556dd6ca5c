//! Age-compatibility rules. Pure functions, no I/O.
//!
//! Every allocation path that honors the age-gap limit goes through these,
//! both at planning time (engine) and at write time (store re-validation).

use chrono::{Datelike, NaiveDate};

/// Whole years between `birth_date` and `as_of`, calendar-aware: one year is
/// subtracted when `as_of`'s month/day precedes the birthday's month/day.
/// A Feb 29 birthday counts from Mar 1 in common years.
pub fn age_on(birth_date: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut years = as_of.year() - birth_date.year();
    if (as_of.month(), as_of.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years
}

/// Difference between the oldest and youngest age. Zero for empty or
/// single-element input.
pub fn age_span(ages: &[i32]) -> i32 {
    match (ages.iter().min(), ages.iter().max()) {
        (Some(min), Some(max)) => max - min,
        _ => 0,
    }
}

/// True iff adding `candidate_age` to `existing` keeps the room's age span
/// within `max_gap`. An empty existing set is always compatible.
pub fn is_age_compatible(existing: &[i32], candidate_age: i32, max_gap: i32) -> bool {
    if existing.is_empty() {
        return true;
    }
    let min = existing.iter().min().copied().unwrap_or(candidate_age).min(candidate_age);
    let max = existing.iter().max().copied().unwrap_or(candidate_age).max(candidate_age);
    max - min <= max_gap
}
