//! Test doubles shared by unit and integration tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::interval::{SharedClock, TimeStamp};

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: TimeStamp) -> Self {
        Self(Mutex::new(now.to_datetime_utc()))
    }

    /// Shared handle plus the same clock as a store-ready trait object.
    pub fn shared(now: TimeStamp) -> (Arc<Self>, SharedClock) {
        let clock = Arc::new(Self::new(now));
        let shared: SharedClock = clock.clone();
        (clock, shared)
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    pub fn set(&self, now: TimeStamp) {
        *self.lock_clock() = now.to_datetime_utc();
    }

    pub fn now(&self) -> TimeStamp {
        TimeStamp::from(*self.lock_clock())
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Whole-second timestamp, panics on an impossible date.
pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> TimeStamp {
    match TimeStamp::new_with(year, month, day, hour, min, sec) {
        Some(ts) => ts,
        None => panic!("invalid test timestamp {year}-{month}-{day} {hour}:{min}:{sec}"),
    }
}
