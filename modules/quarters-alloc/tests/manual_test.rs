//! Integration tests for the manual allocation path and unassignment.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use quarters_alloc::{AllocationEngine, AllocationRejection, ManualError, MemoryRegistry};
use quarters_common::{Gender, Registrant, Room};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn birth_date_for(age: i32) -> NaiveDate {
    let today = Utc::now().date_naive();
    NaiveDate::from_ymd_opt(today.year() - age, 1, 1).unwrap()
}

fn registrant(age: i32, gender: Gender) -> Registrant {
    Registrant {
        id: Uuid::new_v4(),
        full_name: format!("registrant-{age}"),
        gender,
        birth_date: birth_date_for(age),
        verified: true,
        registered_at: Utc::now(),
    }
}

fn room(name: &str, gender: Gender, capacity: i32) -> Room {
    Room {
        id: Uuid::new_v4(),
        name: name.to_string(),
        gender,
        capacity,
        active: true,
    }
}

fn engine(
    registry: &Arc<MemoryRegistry>,
) -> AllocationEngine<Arc<MemoryRegistry>, Arc<MemoryRegistry>, Arc<MemoryRegistry>> {
    AllocationEngine::new(registry.clone(), registry.clone(), registry.clone())
}

fn rejection(err: ManualError) -> AllocationRejection {
    match err {
        ManualError::Rejected(r) => r,
        ManualError::Store(e) => panic!("expected rejection, got store error: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn allocates_and_records_the_operator() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    let dorm = room("dorm-a", Gender::Male, 2);
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let allocation = engine(&registry)
        .allocate_manual(person.id, dorm.id, 5, "alice")
        .await
        .unwrap();

    assert_eq!(allocation.registrant_id, person.id);
    assert_eq!(allocation.room_id, dorm.id);
    assert_eq!(allocation.allocated_by, "alice");
    assert_eq!(registry.allocations().len(), 1);
}

#[tokio::test]
async fn empty_room_accepts_any_age() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(63, Gender::Female);
    let dorm = room("dorm-f", Gender::Female, 1);
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    engine(&registry)
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Rejections, one per precondition
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejects_unknown_registrant() {
    let registry = Arc::new(MemoryRegistry::new());
    let dorm = room("dorm-a", Gender::Male, 2);
    registry.add_room(dorm.clone());

    let err = engine(&registry)
        .allocate_manual(Uuid::new_v4(), dorm.id, 5, "op")
        .await
        .unwrap_err();

    assert!(matches!(
        rejection(err),
        AllocationRejection::RegistrantNotFound(_)
    ));
}

#[tokio::test]
async fn rejects_unverified_registrant() {
    let registry = Arc::new(MemoryRegistry::new());
    let mut person = registrant(15, Gender::Male);
    person.verified = false;
    let dorm = room("dorm-a", Gender::Male, 2);
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let err = engine(&registry)
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap_err();

    assert!(matches!(rejection(err), AllocationRejection::NotVerified(_)));
    assert!(registry.allocations().is_empty());
}

#[tokio::test]
async fn second_allocation_always_rejects_without_writing() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    let dorm = room("dorm-a", Gender::Male, 4);
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let eng = engine(&registry);
    eng.allocate_manual(person.id, dorm.id, 5, "op").await.unwrap();

    let err = eng
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap_err();

    assert!(matches!(
        rejection(err),
        AllocationRejection::AlreadyAllocated(_)
    ));
    assert_eq!(registry.allocations().len(), 1);
}

#[tokio::test]
async fn rejects_unknown_room() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    registry.add_registrant(person.clone());

    let err = engine(&registry)
        .allocate_manual(person.id, Uuid::new_v4(), 5, "op")
        .await
        .unwrap_err();

    assert!(matches!(rejection(err), AllocationRejection::RoomNotFound(_)));
}

#[tokio::test]
async fn rejects_inactive_room() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    let mut dorm = room("dorm-a", Gender::Male, 2);
    dorm.active = false;
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let err = engine(&registry)
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap_err();

    assert!(matches!(rejection(err), AllocationRejection::RoomInactive(_)));
}

#[tokio::test]
async fn rejects_full_room_without_writing() {
    let registry = Arc::new(MemoryRegistry::new());
    let occupant = registrant(15, Gender::Male);
    let person = registrant(16, Gender::Male);
    let dorm = room("dorm-a", Gender::Male, 1);
    registry.add_registrant(occupant.clone());
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let eng = engine(&registry);
    eng.allocate_manual(occupant.id, dorm.id, 5, "op").await.unwrap();

    let err = eng
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap_err();

    assert!(matches!(rejection(err), AllocationRejection::RoomFull(_)));
    assert_eq!(registry.allocations().len(), 1);
}

#[tokio::test]
async fn rejects_gender_mismatch() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Female);
    let dorm = room("dorm-a", Gender::Male, 2);
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let err = engine(&registry)
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap_err();

    match rejection(err) {
        AllocationRejection::GenderMismatch { registrant, room } => {
            assert_eq!(registrant, Gender::Female);
            assert_eq!(room, Gender::Male);
        }
        other => panic!("expected gender mismatch, got {other}"),
    }
}

#[tokio::test]
async fn age_gap_rejection_reports_range_and_limit() {
    let registry = Arc::new(MemoryRegistry::new());
    let occupant = registrant(12, Gender::Male);
    let person = registrant(19, Gender::Male);
    let dorm = room("dorm-a", Gender::Male, 4);
    registry.add_registrant(occupant.clone());
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let eng = engine(&registry);
    eng.allocate_manual(occupant.id, dorm.id, 5, "op").await.unwrap();

    let err = eng
        .allocate_manual(person.id, dorm.id, 5, "op")
        .await
        .unwrap_err();

    match rejection(err) {
        AllocationRejection::AgeGapExceeded {
            resulting_range,
            limit,
        } => {
            assert_eq!(resulting_range, 7);
            assert_eq!(limit, 5);
        }
        other => panic!("expected age gap rejection, got {other}"),
    }
    assert_eq!(registry.allocations().len(), 1);
}

// ---------------------------------------------------------------------------
// Unassignment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unassign_removes_and_returns_the_allocation() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    let dorm = room("dorm-a", Gender::Male, 2);
    registry.add_registrant(person.clone());
    registry.add_room(dorm.clone());

    let eng = engine(&registry);
    let created = eng.allocate_manual(person.id, dorm.id, 5, "op").await.unwrap();

    let removed = eng.unassign(person.id).await.unwrap();
    assert_eq!(removed.id, created.id);
    assert!(registry.allocations().is_empty());
}

#[tokio::test]
async fn unassign_without_allocation_is_not_found() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    registry.add_registrant(person.clone());

    let err = engine(&registry).unassign(person.id).await.unwrap_err();

    assert!(matches!(rejection(err), AllocationRejection::NotAllocated(_)));
}

#[tokio::test]
async fn reassignment_is_release_then_commit() {
    let registry = Arc::new(MemoryRegistry::new());
    let person = registrant(15, Gender::Male);
    let first = room("dorm-a", Gender::Male, 2);
    let second = room("dorm-b", Gender::Male, 2);
    registry.add_registrant(person.clone());
    registry.add_room(first.clone());
    registry.add_room(second.clone());

    let eng = engine(&registry);
    eng.allocate_manual(person.id, first.id, 5, "op").await.unwrap();
    eng.unassign(person.id).await.unwrap();
    let moved = eng.allocate_manual(person.id, second.id, 5, "op").await.unwrap();

    assert_eq!(moved.room_id, second.id);
    assert_eq!(registry.allocations().len(), 1);
}
