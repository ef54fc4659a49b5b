//! Billing-cycle calendar
//!
//! Leave and permission accounting runs on a custom month that starts on
//! the 27th of the previous calendar month and ends on the 26th. A date on
//! or after the 27th therefore belongs to the *next* billing month.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Last day of a billing cycle within its own calendar month
pub const CYCLE_END_DAY: u32 = 26;
/// First day of a billing cycle within the preceding calendar month
pub const CYCLE_START_DAY: u32 = 27;

/// An inclusive date range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A billing month, identified by the calendar month its cycle ends in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u32,
}

impl BillingMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Effective billing month of a raw date.
    ///
    /// Days up to the 26th stay in their own month; later days roll into the
    /// next one, wrapping the year after December.
    pub fn of_date(date: NaiveDate) -> Self {
        let (year, month) = (date.year(), date.month());
        if date.day() <= CYCLE_END_DAY {
            Self { year, month }
        } else if month == 12 {
            Self {
                year: year + 1,
                month: 1,
            }
        } else {
            Self {
                year,
                month: month + 1,
            }
        }
    }

    /// Billing month preceding this one
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// `[27th of the previous month, 26th of this month]`
    ///
    /// `None` only when the year is outside chrono's representable range.
    pub fn window(&self) -> Option<DateWindow> {
        let prev = self.previous();
        Some(DateWindow {
            start: NaiveDate::from_ymd_opt(prev.year, prev.month, CYCLE_START_DAY)?,
            end: NaiveDate::from_ymd_opt(self.year, self.month, CYCLE_END_DAY)?,
        })
    }
}

/// Window covering the twelve billing months of `year`:
/// `[(year-1)-12-27, year-12-26]`.
pub fn year_window(year: i32) -> Option<DateWindow> {
    Some(DateWindow {
        start: NaiveDate::from_ymd_opt(year - 1, 12, CYCLE_START_DAY)?,
        end: NaiveDate::from_ymd_opt(year, 12, CYCLE_END_DAY)?,
    })
}

/// Resolve a `(year, month)` filter into a date window.
///
/// - year and month set: that billing month
/// - only year set (month `0`): the whole billing year
/// - neither set: the billing month named by today's calendar month
///
/// Out-of-range inputs fall back to the current month rather than failing.
pub fn resolve_window(year: i32, month: u32, today: NaiveDate) -> DateWindow {
    let requested = match (year > 0, month) {
        (true, 0) => year_window(year),
        (true, m) => BillingMonth::new(year, m).and_then(|b| b.window()),
        (false, _) => None,
    };
    requested.unwrap_or_else(|| current_window(today))
}

fn current_window(today: NaiveDate) -> DateWindow {
    BillingMonth {
        year: today.year(),
        month: today.month(),
    }
    .window()
    .unwrap_or(DateWindow {
        start: today,
        end: today,
    })
}
