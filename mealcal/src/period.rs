//! Fixed two-week periods.
//!
//! Every period is 14 days long and starts on a Monday that lies a whole
//! number of periods away from [`EPOCH_MONDAY`]. Periods tile the calendar
//! without gaps or overlaps, in both directions from the epoch.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Length of a period in days.
pub const PERIOD_DAYS: i64 = 14;

/// Anchor Monday (2024-09-02) from which all periods are counted.
pub const EPOCH_MONDAY: NaiveDate = match NaiveDate::from_ymd_opt(2024, 9, 2) {
    Some(date) => date,
    None => panic!("epoch Monday is a valid date"),
};

/// A fixed 14-day window, Monday through the second Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// The 14 dates of the period in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start_date.iter_days().take(PERIOD_DAYS as usize)
    }

    /// Mondays of the two weeks making up the period.
    pub fn week_starts(&self) -> [NaiveDate; 2] {
        [self.start_date, add_days(self.start_date, 7)]
    }

    pub fn previous(&self) -> Period {
        period_containing(previous_period_start(self.start_date))
    }

    pub fn next(&self) -> Period {
        period_containing(next_period_start(self.start_date))
    }
}

/// Period enclosing `date`.
pub fn period_containing(date: NaiveDate) -> Period {
    let diff_days = (date - EPOCH_MONDAY).num_days();
    let period_index = diff_days.div_euclid(PERIOD_DAYS);
    let start_date = add_days(EPOCH_MONDAY, period_index * PERIOD_DAYS);
    Period {
        start_date,
        end_date: add_days(start_date, PERIOD_DAYS - 1),
    }
}

/// Start of the period immediately before the one starting at `current_start`.
pub fn previous_period_start(current_start: NaiveDate) -> NaiveDate {
    period_containing(add_days(current_start, -1)).start_date
}

/// Start of the period immediately after the one starting at `current_start`.
pub fn next_period_start(current_start: NaiveDate) -> NaiveDate {
    period_containing(add_days(current_start, PERIOD_DAYS)).start_date
}

pub fn same_period(d1: NaiveDate, d2: NaiveDate) -> bool {
    period_containing(d1).start_date == period_containing(d2).start_date
}

pub fn current_period(today: NaiveDate) -> Period {
    period_containing(today)
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    add_days(date, -offset)
}

pub fn is_monday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

pub fn is_past_date(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    // chrono's range spans ~262k years; the calendar never gets near it.
    shifted.unwrap_or(date)
}
