// libs/scheduling-cell/tests/availability_conflict_test.rs

mod common;

use uuid::Uuid;

use common::{hm, slot};
use scheduling_cell::models::{AvailabilityType, DayOfWeek};
use scheduling_cell::services::availability_conflict::{AvailabilityConflictChecker, SlotCandidate};

fn candidate(
    provider_id: Uuid,
    availability_type: AvailabilityType,
    location_id: Option<Uuid>,
    start: (u32, u32),
    end: (u32, u32),
) -> SlotCandidate {
    SlotCandidate {
        provider_id,
        day_of_week: DayOfWeek::Monday,
        start_time: hm(start.0, start.1),
        end_time: hm(end.0, end.1),
        availability_type,
        location_id,
        exclude_id: None,
    }
}

#[test]
fn test_offline_slots_at_same_location_conflict() {
    let provider = Uuid::new_v4();
    let clinic = Uuid::new_v4();
    let existing = vec![slot(1, provider, AvailabilityType::Offline, Some(clinic), DayOfWeek::Monday, hm(9, 0), hm(12, 0))];

    let new_slot = candidate(provider, AvailabilityType::Offline, Some(clinic), (11, 0), (13, 0));

    let conflicts = AvailabilityConflictChecker::find_conflicts(&new_slot, &existing);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, 1);
}

#[test]
fn test_offline_slots_at_different_locations_do_not_conflict() {
    let provider = Uuid::new_v4();
    let existing = vec![slot(1, provider, AvailabilityType::Offline, Some(Uuid::new_v4()), DayOfWeek::Monday, hm(9, 0), hm(12, 0))];

    let new_slot = candidate(provider, AvailabilityType::Offline, Some(Uuid::new_v4()), (11, 0), (13, 0));
    assert!(!AvailabilityConflictChecker::has_conflict(&new_slot, &existing));
}

#[test]
fn test_offline_and_virtual_slots_never_conflict() {
    let provider = Uuid::new_v4();
    let clinic = Uuid::new_v4();

    let offline = vec![slot(1, provider, AvailabilityType::Offline, Some(clinic), DayOfWeek::Monday, hm(9, 0), hm(12, 0))];
    let virtual_candidate = candidate(provider, AvailabilityType::Virtual, None, (11, 0), (13, 0));
    assert!(!AvailabilityConflictChecker::has_conflict(&virtual_candidate, &offline));

    let virtual_slots = vec![slot(2, provider, AvailabilityType::Virtual, None, DayOfWeek::Monday, hm(9, 0), hm(12, 0))];
    let offline_candidate = candidate(provider, AvailabilityType::Offline, Some(clinic), (11, 0), (13, 0));
    assert!(!AvailabilityConflictChecker::has_conflict(&offline_candidate, &virtual_slots));
}

#[test]
fn test_virtual_slots_conflict_regardless_of_location() {
    let provider = Uuid::new_v4();
    let existing = vec![slot(1, provider, AvailabilityType::Virtual, None, DayOfWeek::Monday, hm(14, 0), hm(16, 0))];

    let new_slot = candidate(provider, AvailabilityType::Virtual, None, (15, 30), (17, 0));
    assert!(AvailabilityConflictChecker::has_conflict(&new_slot, &existing));
}

#[test]
fn test_back_to_back_slots_are_allowed() {
    let provider = Uuid::new_v4();
    let clinic = Uuid::new_v4();
    let existing = vec![slot(1, provider, AvailabilityType::Offline, Some(clinic), DayOfWeek::Monday, hm(9, 0), hm(12, 0))];

    let new_slot = candidate(provider, AvailabilityType::Offline, Some(clinic), (12, 0), (14, 0));
    assert!(!AvailabilityConflictChecker::has_conflict(&new_slot, &existing));
}

#[test]
fn test_inactive_other_day_other_provider_and_excluded_slots_are_ignored() {
    let provider = Uuid::new_v4();
    let clinic = Uuid::new_v4();

    let mut inactive = slot(1, provider, AvailabilityType::Offline, Some(clinic), DayOfWeek::Monday, hm(9, 0), hm(12, 0));
    inactive.is_active = false;
    let other_day = slot(2, provider, AvailabilityType::Offline, Some(clinic), DayOfWeek::Tuesday, hm(9, 0), hm(12, 0));
    let other_provider = slot(3, Uuid::new_v4(), AvailabilityType::Offline, Some(clinic), DayOfWeek::Monday, hm(9, 0), hm(12, 0));
    let itself = slot(4, provider, AvailabilityType::Offline, Some(clinic), DayOfWeek::Monday, hm(9, 0), hm(12, 0));

    let existing = vec![inactive, other_day, other_provider, itself];

    let mut new_slot = candidate(provider, AvailabilityType::Offline, Some(clinic), (10, 0), (11, 0));
    new_slot.exclude_id = Some(4);

    assert!(!AvailabilityConflictChecker::has_conflict(&new_slot, &existing));
}

#[test]
fn test_comparison_filter_drops_location_for_virtual() {
    let provider = Uuid::new_v4();
    let filter = candidate(provider, AvailabilityType::Virtual, None, (9, 0), (10, 0)).comparison_filter();

    assert_eq!(filter.provider_id, Some(provider));
    assert_eq!(filter.availability_type, Some(AvailabilityType::Virtual));
    assert_eq!(filter.location_id, None);
    assert_eq!(filter.is_active, Some(true));
}
