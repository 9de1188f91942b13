//! Calendar-month windows and the clock they are anchored to
//!
//! All activity and sales lookups use half-open `[start, end)` windows whose
//! boundaries fall on the first day of a month. Dates are UTC calendar
//! dates, both for stored timestamps and for the clock.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Half-open date interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window covering the whole calendar month `month` of `year`
    ///
    /// Out-of-range months fall back to January so the result is always a
    /// valid window.
    pub fn month(year: i32, month: u32) -> Self {
        let month = if (1..=12).contains(&month) { month } else { 1 };
        let start = first_of_month(year, month);
        let end = if month == 12 {
            first_of_month(year + 1, 1)
        } else {
            first_of_month(year, month + 1)
        };
        Self { start, end }
    }

    /// Window of the month containing `date`
    pub fn month_containing(date: NaiveDate) -> Self {
        Self::month(date.year(), date.month())
    }

    /// The calendar month `offset` months before the one containing `date`
    pub fn months_back(date: NaiveDate, offset: u32) -> Self {
        let mut year = date.year();
        let mut month = date.month() as i64 - offset as i64;
        while month <= 0 {
            month += 12;
            year -= 1;
        }
        Self::month(year, month as u32)
    }

    /// The `count` trailing months ending with the month containing `date`,
    /// most recent first
    pub fn trailing_months(date: NaiveDate, count: u32) -> Vec<Self> {
        (0..count).map(|offset| Self::months_back(date, offset)).collect()
    }

    /// Number of days in the window
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.contains_date(ts.date_naive())
    }

    /// Human readable month label, e.g. "October 2026"
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Source of "today" for current-month computations
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn current_month(&self) -> DateWindow {
        DateWindow::month_containing(self.today())
    }
}

/// Wall clock, UTC date
///
/// Timestamps are bucketed by their UTC date in [`DateWindow::contains`],
/// so "today" must come from the same timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a given date (tests, backfills)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
