//! Time and identifier sources injected into the workflows.

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of "now" for validation and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock pinned to a chosen instant; it only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Pins the clock to a local wall-clock time.
    pub fn at(local: NaiveDateTime) -> Self {
        let now = Local
            .from_local_datetime(&local)
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&local));
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Local>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Produces identifiers unique for the lifetime of a store.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids (`{prefix}-1`, `{prefix}-2`, ...).
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let clock = FixedClock::at(start);
        assert_eq!(clock.now().naive_local(), start);

        clock.advance(TimeDelta::minutes(30));
        assert_eq!(clock.now().naive_local(), start + TimeDelta::minutes(30));
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("id");
        assert_eq!(ids.next_id(), "id-1");
        assert_eq!(ids.next_id(), "id-2");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
