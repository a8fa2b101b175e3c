//! Month grid and drag-to-select date ranges.
//!
//! The grid always has six weeks of cells so the layout never jumps when the
//! visible month changes. Weeks start on Sunday.

mod date_range;
mod selector;
mod viewport;
mod widget;

pub use date_range::{CalendarDate, DateRange, SelectedRange};
pub use selector::{DateRangeSelector, RangeListener};
pub use viewport::{PointerRelease, Subscription, Viewport};
pub use widget::{CalendarWidget, GridEvent};

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, Days, Local, Months, NaiveDate};

use crate::error::{ChoseiError, ChoseiResult};

/// Number of cells in the grid (6 weeks x 7 days).
pub const GRID_CELLS: usize = 42;

/// Column headers, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// The month currently shown by the calendar.
///
/// Stored as the first day of the month, which keeps every accessor total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisibleMonth {
    first_day: NaiveDate,
}

/// Years whose six-week grid stays inside chrono's date range.
fn supported_years() -> RangeInclusive<i32> {
    NaiveDate::MIN.year() + 1..=NaiveDate::MAX.year() - 1
}

impl VisibleMonth {
    /// Returns `None` when `month` is outside 1..=12 or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !supported_years().contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    /// The month of `date`, clamped to the supported years.
    pub fn containing(date: NaiveDate) -> Self {
        let years = supported_years();
        let (year, month) = if date.year() < *years.start() {
            (*years.start(), 1)
        } else if date.year() > *years.end() {
            (*years.end(), 12)
        } else {
            (date.year(), date.month())
        };
        Self::new(year, month).unwrap_or(Self {
            first_day: date.with_day(1).unwrap_or(date),
        })
    }

    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// The following month. Saturates at the last supported month.
    pub fn next(&self) -> Self {
        self.first_day
            .checked_add_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    /// The preceding month. Saturates at the first supported month.
    pub fn prev(&self) -> Self {
        self.first_day
            .checked_sub_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    pub fn days_in_month(&self) -> u32 {
        match self.first_day.checked_add_months(Months::new(1)) {
            Some(next) => (next - self.first_day).num_days() as u32,
            None => 31,
        }
    }

    /// Heading shown above the grid, e.g. "2025 年 3 月".
    pub fn title(&self) -> String {
        format!("{} 年 {} 月", self.year(), self.month())
    }

    /// Cells for this month, with `is_today` resolved against the local clock.
    pub fn visible_days(&self) -> Vec<CalendarDay> {
        compute_visible_days(*self, Local::now().date_naive())
    }
}

impl Default for VisibleMonth {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for VisibleMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for VisibleMonth {
    type Err = ChoseiError;

    /// Parse "YYYY-MM".
    fn from_str(s: &str) -> ChoseiResult<Self> {
        let invalid = || ChoseiError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Which month a grid cell belongs to, relative to the visible month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthPlacement {
    Previous,
    Current,
    Next,
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub day_number: u32,
    pub full_date: NaiveDate,
    pub placement: MonthPlacement,
    pub is_today: bool,
}

impl CalendarDay {
    pub fn is_current_month(&self) -> bool {
        self.placement == MonthPlacement::Current
    }

    pub fn is_prev_month(&self) -> bool {
        self.placement == MonthPlacement::Previous
    }

    pub fn is_next_month(&self) -> bool {
        self.placement == MonthPlacement::Next
    }
}

/// Build the 42 cells shown for `month`.
///
/// Leading cells come from the previous month so the 1st lands under its
/// weekday, then the whole month, then the next month pads the rest.
/// `is_today` is only ever set on a current-month cell.
pub fn compute_visible_days(month: VisibleMonth, today: NaiveDate) -> Vec<CalendarDay> {
    let first = month.first_day();
    let leading = u64::from(first.weekday().num_days_from_sunday());
    let grid_start = first.checked_sub_days(Days::new(leading)).unwrap_or(first);

    grid_start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| {
            let placement = if date < first {
                MonthPlacement::Previous
            } else if month.contains(date) {
                MonthPlacement::Current
            } else {
                MonthPlacement::Next
            };

            CalendarDay {
                day_number: date.day(),
                full_date: date,
                placement,
                is_today: placement == MonthPlacement::Current && date == today,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn current_month_runs(days: &[CalendarDay]) -> Vec<usize> {
        let mut runs = Vec::new();
        let mut len = 0;
        for day in days {
            if day.is_current_month() {
                len += 1;
            } else if len > 0 {
                runs.push(len);
                len = 0;
            }
        }
        if len > 0 {
            runs.push(len);
        }
        runs
    }

    #[test]
    fn test_always_42_cells_with_one_current_run() {
        let today = date(2025, 3, 15);
        for year in [2023, 2024, 2025, 2026] {
            for m in 1..=12 {
                let month = VisibleMonth::new(year, m).unwrap();
                let days = compute_visible_days(month, today);
                assert_eq!(days.len(), GRID_CELLS, "{month}");
                assert_eq!(
                    current_month_runs(&days),
                    vec![month.days_in_month() as usize],
                    "{month}"
                );
            }
        }
    }

    #[test]
    fn test_first_cell_aligns_to_sunday() {
        // March 2025 starts on a Saturday: six leading days from February.
        let days = compute_visible_days(VisibleMonth::new(2025, 3).unwrap(), date(2025, 1, 1));
        assert_eq!(days[0].full_date, date(2025, 2, 23));
        assert!(days[..6].iter().all(|d| d.is_prev_month()));
        assert_eq!(days[6].full_date, date(2025, 3, 1));
        assert_eq!(days[6].day_number, 1);
        assert!(days[37..].iter().all(|d| d.is_next_month()));
        assert_eq!(days[41].full_date, date(2025, 4, 5));
    }

    #[test]
    fn test_month_starting_on_sunday_has_no_leading_days() {
        // June 2025 starts on a Sunday.
        let days = compute_visible_days(VisibleMonth::new(2025, 6).unwrap(), date(2025, 1, 1));
        assert!(days[0].is_current_month());
        assert_eq!(days[0].day_number, 1);
        assert_eq!(days.iter().filter(|d| d.is_next_month()).count(), 12);
    }

    #[test]
    fn test_is_today_only_in_current_month() {
        // 2025-03-01 is visible as a trailing cell of February 2025.
        let today = date(2025, 3, 1);
        let feb = compute_visible_days(VisibleMonth::new(2025, 2).unwrap(), today);
        assert!(feb.iter().all(|d| !d.is_today));

        let march = compute_visible_days(VisibleMonth::new(2025, 3).unwrap(), today);
        let todays: Vec<_> = march.iter().filter(|d| d.is_today).collect();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].full_date, today);
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        let dec = VisibleMonth::new(2024, 12).unwrap();
        assert_eq!(dec.next(), VisibleMonth::new(2025, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(VisibleMonth::new(2025, 1).unwrap().prev(), dec);
    }

    #[test]
    fn test_days_in_month_handles_leap_years() {
        assert_eq!(VisibleMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(VisibleMonth::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(VisibleMonth::new(2025, 4).unwrap().days_in_month(), 30);
    }

    #[test]
    fn test_grid_stays_whole_at_date_range_ends() {
        let today = date(2025, 3, 15);
        for month in [
            VisibleMonth::containing(NaiveDate::MAX),
            VisibleMonth::containing(NaiveDate::MIN),
        ] {
            let days = compute_visible_days(month, today);
            assert_eq!(days.len(), GRID_CELLS, "{month}");
            assert_eq!(days[0].full_date.weekday(), Weekday::Sun, "{month}");
            assert_eq!(
                current_month_runs(&days),
                vec![month.days_in_month() as usize],
                "{month}"
            );
        }

        let last = VisibleMonth::containing(NaiveDate::MAX);
        assert_eq!(last.month(), 12);
        assert_eq!(last.next(), last);
        let first = VisibleMonth::containing(NaiveDate::MIN);
        assert_eq!(first.month(), 1);
        assert_eq!(first.prev(), first);

        assert!(VisibleMonth::new(NaiveDate::MAX.year(), 1).is_none());
        assert!(VisibleMonth::new(NaiveDate::MIN.year(), 12).is_none());
        assert!(format!("{}-01", NaiveDate::MAX.year()).parse::<VisibleMonth>().is_err());
    }

    #[test]
    fn test_parse_and_title() {
        let month: VisibleMonth = "2025-03".parse().unwrap();
        assert_eq!(month.title(), "2025 年 3 月");
        assert_eq!(month.to_string(), "2025-03");
        assert!("2025-13".parse::<VisibleMonth>().is_err());
        assert!("march".parse::<VisibleMonth>().is_err());
    }
}
