//! Injected source of "today".
//!
//! Days-left is always computed relative to a [`Clock`] so callers can pin
//! the current date in tests instead of reading the wall clock.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Reads the host's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }

    #[test]
    fn system_clock_matches_local_date() {
        let before = Local::now().date_naive();
        let today = SystemClock.today();
        let after = Local::now().date_naive();
        assert!(today == before || today == after);
    }
}
