use std::fmt::Debug;

use chrono::{Local, NaiveDate};

/// Source of "today" for reports that leave the date unset.
pub trait Clock: Debug {
    fn today(&self) -> NaiveDate;
}

/// The machine's local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date. Mostly useful in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
