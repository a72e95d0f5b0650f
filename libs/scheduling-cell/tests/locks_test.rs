// libs/scheduling-cell/tests/locks_test.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use scheduling_cell::locks::SchedulingLocks;
use scheduling_cell::models::DayOfWeek;

#[tokio::test]
async fn test_same_key_is_serialized() {
    let locks = SchedulingLocks::new();
    let key = SchedulingLocks::appointment_key(
        Uuid::new_v4(),
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
    );
    let events = Arc::new(Mutex::new(Vec::new()));

    let first = locks.acquire(key.clone()).await;

    let waiter = {
        let locks = locks.clone();
        let events = events.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let _guard = locks.acquire(key).await;
            events.lock().await.push("second");
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    events.lock().await.push("first");
    drop(first);

    waiter.await.unwrap();
    assert_eq!(*events.lock().await, vec!["first", "second"]);
}

#[tokio::test]
async fn test_distinct_keys_do_not_block() {
    let locks = SchedulingLocks::new();
    let provider = Uuid::new_v4();

    let _monday = locks
        .acquire(SchedulingLocks::availability_key(provider, DayOfWeek::Monday, None))
        .await;
    let tuesday = tokio::time::timeout(
        Duration::from_secs(1),
        locks.acquire(SchedulingLocks::availability_key(provider, DayOfWeek::Tuesday, None)),
    )
    .await;

    assert!(tuesday.is_ok());
}

#[tokio::test]
async fn test_released_keys_are_removed() {
    let locks = SchedulingLocks::new();
    let patient = Uuid::new_v4();
    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let guards = locks
        .acquire_all(vec![
            SchedulingLocks::appointment_key(patient, day),
            SchedulingLocks::appointment_key(patient, day.succ_opt().unwrap()),
            SchedulingLocks::appointment_key(patient, day),
        ])
        .await;

    assert_eq!(guards.len(), 2);
    assert_eq!(locks.held_keys(), 2);

    drop(guards);
    assert_eq!(locks.held_keys(), 0);
}

#[test]
fn test_virtual_and_offline_keys_differ() {
    let provider = Uuid::new_v4();
    let location = Uuid::new_v4();

    assert_ne!(
        SchedulingLocks::availability_key(provider, DayOfWeek::Friday, None),
        SchedulingLocks::availability_key(provider, DayOfWeek::Friday, Some(location))
    );
}
