//! Integration tests for the random allocation path.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use quarters_alloc::{AllocationEngine, GroupStatus, MemoryRegistry};
use quarters_common::{Gender, Registrant, Room};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn birth_date_for(age: i32) -> NaiveDate {
    let today = Utc::now().date_naive();
    NaiveDate::from_ymd_opt(today.year() - age, 1, 1).unwrap()
}

fn registrant_with_id(id: Uuid, age: i32, gender: Gender) -> Registrant {
    Registrant {
        id,
        full_name: format!("registrant-{age}"),
        gender,
        birth_date: birth_date_for(age),
        verified: true,
        registered_at: Utc::now(),
    }
}

fn registrant(age: i32, gender: Gender) -> Registrant {
    registrant_with_id(Uuid::new_v4(), age, gender)
}

fn room_with_id(id: Uuid, name: &str, gender: Gender, capacity: i32) -> Room {
    Room {
        id,
        name: name.to_string(),
        gender,
        capacity,
        active: true,
    }
}

fn room(name: &str, gender: Gender, capacity: i32) -> Room {
    room_with_id(Uuid::new_v4(), name, gender, capacity)
}

fn engine(
    registry: &Arc<MemoryRegistry>,
) -> AllocationEngine<Arc<MemoryRegistry>, Arc<MemoryRegistry>, Arc<MemoryRegistry>> {
    AllocationEngine::new(registry.clone(), registry.clone(), registry.clone())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn more_candidates_than_slots_is_partial() {
    let registry = Arc::new(MemoryRegistry::new());
    for age in [14, 16, 18] {
        registry.add_registrant(registrant(age, Gender::Male));
    }
    registry.add_room(room("dorm-a", Gender::Male, 2));

    let mut rng = StdRng::seed_from_u64(11);
    let report = engine(&registry)
        .allocate_random_with(&mut rng, "test")
        .await
        .unwrap();

    let male = report
        .groups
        .iter()
        .find(|g| g.gender == Gender::Male)
        .unwrap();
    assert_eq!(male.candidates, 3);
    assert_eq!(male.allocated, 2);
    assert_eq!(male.remaining, 1);
    assert_eq!(male.status, GroupStatus::Partial);
    assert_eq!(registry.allocations().len(), 2);
}

#[tokio::test]
async fn age_gap_is_not_enforced() {
    let registry = Arc::new(MemoryRegistry::new());
    registry.add_registrant(registrant(10, Gender::Female));
    registry.add_registrant(registrant(40, Gender::Female));
    registry.add_room(room("dorm-f", Gender::Female, 2));

    let mut rng = StdRng::seed_from_u64(2);
    let report = engine(&registry)
        .allocate_random_with(&mut rng, "test")
        .await
        .unwrap();

    // A 30-year span in one room: allowed on this path by design.
    assert_eq!(report.total_allocated, 2);
    assert_eq!(registry.allocations().len(), 2);
}

#[tokio::test]
async fn capacity_and_gender_hold_for_any_seed() {
    for seed in 0..8 {
        let registry = Arc::new(MemoryRegistry::new());
        let mut registrants = Vec::new();
        for i in 0..10 {
            let gender = if i % 3 == 0 { Gender::Female } else { Gender::Male };
            let r = registrant(12 + i, gender);
            registrants.push(r.clone());
            registry.add_registrant(r);
        }
        let rooms = vec![
            room("m-1", Gender::Male, 3),
            room("m-2", Gender::Male, 2),
            room("f-1", Gender::Female, 2),
        ];
        for r in &rooms {
            registry.add_room(r.clone());
        }

        let mut rng = StdRng::seed_from_u64(seed);
        engine(&registry)
            .allocate_random_with(&mut rng, "test")
            .await
            .unwrap();

        for room in &rooms {
            let occupants: Vec<_> = registry
                .allocations()
                .into_iter()
                .filter(|a| a.room_id == room.id)
                .collect();
            assert!(occupants.len() as i32 <= room.capacity);
            for a in occupants {
                let owner = registrants.iter().find(|r| r.id == a.registrant_id).unwrap();
                assert_eq!(owner.gender, room.gender);
            }
        }
    }
}

#[tokio::test]
async fn same_seed_is_reproducible_across_identical_registries() {
    let build = || {
        let registry = Arc::new(MemoryRegistry::new());
        for i in 0..6_u128 {
            registry.add_registrant(registrant_with_id(
                Uuid::from_u128(i + 1),
                14 + i as i32,
                Gender::Male,
            ));
        }
        registry.add_room(room_with_id(
            Uuid::from_u128(100),
            "m-1",
            Gender::Male,
            3,
        ));
        registry.add_room(room_with_id(
            Uuid::from_u128(101),
            "m-2",
            Gender::Male,
            2,
        ));
        registry
    };

    let run = |registry: Arc<MemoryRegistry>| async move {
        let mut rng = StdRng::seed_from_u64(99);
        engine(&registry)
            .allocate_random_with(&mut rng, "test")
            .await
            .unwrap();
        let mut pairs: Vec<(Uuid, Uuid)> = registry
            .allocations()
            .into_iter()
            .map(|a| (a.registrant_id, a.room_id))
            .collect();
        pairs.sort();
        pairs
    };

    assert_eq!(run(build()).await, run(build()).await);
}

#[tokio::test]
async fn no_rooms_means_nothing_is_written() {
    let registry = Arc::new(MemoryRegistry::new());
    registry.add_registrant(registrant(20, Gender::Male));

    let mut rng = StdRng::seed_from_u64(5);
    let report = engine(&registry)
        .allocate_random_with(&mut rng, "test")
        .await
        .unwrap();

    assert_eq!(report.total_allocated, 0);
    assert_eq!(report.total_remaining, 1);
    assert!(registry.allocations().is_empty());
}
