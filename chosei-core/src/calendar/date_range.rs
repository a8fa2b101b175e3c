//! Inclusive day ranges selected on the calendar.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

/// Anything that can be reduced to a calendar day.
///
/// Range membership always compares days, so a probe carrying a time of day
/// is normalized to its date first.
pub trait CalendarDate {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDate for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDate for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDate for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// A possibly incomplete day range.
///
/// Once both bounds are set, `start <= end` holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: Some(day),
            end: Some(day),
        }
    }

    /// The range between two days, in whichever order they were given.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: Some(a.min(b)),
            end: Some(a.max(b)),
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive membership test at day granularity.
    pub fn contains(&self, probe: &impl CalendarDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let day = probe.calendar_day();
                start <= day && day <= end
            }
            _ => false,
        }
    }

    /// Both bounds, if the range is complete.
    pub fn finalized(&self) -> Option<SelectedRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(SelectedRange { start, end }),
            _ => None,
        }
    }
}

/// A complete range as reported to listeners when a drag ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SelectedRange {
    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for SelectedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ~ {}",
            self.start.format("%Y/%m/%d"),
            self.end.format("%Y/%m/%d")
        )
    }
}
