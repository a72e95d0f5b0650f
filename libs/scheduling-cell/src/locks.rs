// libs/scheduling-cell/src/locks.rs
//
// In-process serialization of check-then-write sequences. Two requests touching
// the same patient/day (or provider/day/location) run one after the other, so
// the second one sees the first one's write when it runs its conflict checks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::models::DayOfWeek;

type LockTable = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct SchedulingLocks {
    table: Arc<Mutex<LockTable>>,
}

impl SchedulingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appointment_key(patient_id: Uuid, date: NaiveDate) -> String {
        format!("appointment:{}:{}", patient_id, date)
    }

    pub fn availability_key(
        provider_id: Uuid,
        day_of_week: DayOfWeek,
        location_id: Option<Uuid>,
    ) -> String {
        match location_id {
            Some(location_id) => format!("availability:{}:{}:{}", provider_id, day_of_week, location_id),
            None => format!("availability:{}:{}:virtual", provider_id, day_of_week),
        }
    }

    pub async fn acquire(&self, key: String) -> SchedulingGuard {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            table.entry(key.clone()).or_default().clone()
        };

        debug!("Waiting for scheduling lock {}", key);
        let guard = mutex.lock_owned().await;

        SchedulingGuard {
            key,
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// Acquires every key in a stable order so overlapping key sets cannot deadlock.
    pub async fn acquire_all(&self, mut keys: Vec<String>) -> Vec<SchedulingGuard> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key).await);
        }
        guards
    }

    pub fn held_keys(&self) -> usize {
        self.table
            .lock()
            .map(|table| table.len())
            .unwrap_or_default()
    }
}

pub struct SchedulingGuard {
    key: String,
    table: Arc<Mutex<LockTable>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SchedulingGuard {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.guard.take();

        // Only the table still references the mutex: nobody holds or awaits it.
        if let Some(mutex) = table.get(&self.key) {
            if Arc::strong_count(mutex) == 1 {
                table.remove(&self.key);
            }
        }
    }
}
