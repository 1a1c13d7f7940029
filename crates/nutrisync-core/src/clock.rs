//! Wall-clock capability.
//!
//! "Today" is asked of the clock once per operation and never cached, so
//! tests can pin or advance it.

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

/// Source of the current date and time.
pub trait Clock: Send + Sync {
    /// Current calendar date.
    fn today(&self) -> NaiveDate;

    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// System time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    inner: Mutex<(NaiveDate, i64)>,
}

impl FixedClock {
    pub fn at(today: NaiveDate, now_millis: i64) -> Self {
        Self {
            inner: Mutex::new((today, now_millis)),
        }
    }

    /// Clock pinned to midnight UTC of `today`.
    pub fn on(today: NaiveDate) -> Self {
        let millis = today
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::at(today, millis)
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.inner.lock().0 = today;
    }

    pub fn advance_millis(&self, millis: i64) {
        self.inner.lock().1 += millis;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.inner.lock().0
    }

    fn now_millis(&self) -> i64 {
        self.inner.lock().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves_on_request() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let clock = FixedClock::on(day);
        assert_eq!(clock.today(), day);

        let start = clock.now_millis();
        clock.advance_millis(250);
        assert_eq!(clock.now_millis(), start + 250);

        let next = day.succ_opt().unwrap();
        clock.set_today(next);
        assert_eq!(clock.today(), next);
    }
}
