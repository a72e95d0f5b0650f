// libs/scheduling-cell/tests/actor_test.rs

use chrono::NaiveDate;
use uuid::Uuid;

use scheduling_cell::models::{Actor, ActorRole, Appointment, AppointmentStatus};

#[test]
fn test_known_roles_map_to_actor_roles() {
    assert_eq!(ActorRole::from_claim(Some("patient")), Some(ActorRole::Patient));
    assert_eq!(ActorRole::from_claim(Some("Doctor")), Some(ActorRole::Provider));
    assert_eq!(ActorRole::from_claim(Some("provider")), Some(ActorRole::Provider));
    assert_eq!(ActorRole::from_claim(Some("ADMIN")), Some(ActorRole::Staff));
    assert_eq!(ActorRole::from_claim(Some("staff")), Some(ActorRole::Staff));
}

#[test]
fn test_missing_or_unknown_roles_get_no_access() {
    for role in [None, Some("authenticated"), Some("anon"), Some("")] {
        assert_eq!(ActorRole::from_claim(role), None, "{:?}", role);
    }
}

#[test]
fn test_ownership_by_role() {
    let patient = Uuid::new_v4();
    let provider = Uuid::new_v4();
    let appointment = Appointment {
        id: 1,
        uuid: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        time: None,
        patient_id: patient,
        provider_id: provider,
        location_id: None,
        chief_complaint: None,
        is_emergency: false,
        status: AppointmentStatus::Scheduled,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    assert!(Actor::new(patient, ActorRole::Patient).owns(&appointment));
    assert!(!Actor::new(provider, ActorRole::Patient).owns(&appointment));
    assert!(Actor::new(provider, ActorRole::Provider).owns(&appointment));
    assert!(!Actor::new(patient, ActorRole::Provider).owns(&appointment));
    assert!(Actor::new(Uuid::new_v4(), ActorRole::Staff).owns(&appointment));
}
