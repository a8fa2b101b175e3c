//! Availability grid: one row per candidate time slot, one column per attendee.
//!
//! The grid is loaded from `schedule.toml` when present and otherwise falls
//! back to a built-in demonstration dataset.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{ChoseiError, ChoseiResult};

/// Format for slot datetimes sent to the calendar API.
pub const SLOT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    #[default]
    Unknown,
}

impl Availability {
    /// Cell marker: ○ when free, × otherwise.
    pub fn symbol(self) -> &'static str {
        match self {
            Availability::Available => "○",
            Availability::Unavailable | Availability::Unknown => "×",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Attendee {
    pub fn new(email: impl Into<String>, display_name: Option<&str>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.map(str::to_string),
        }
    }

    /// Display name, falling back to the address.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Month and day of a slot, written "M/D". The year is supplied when sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotDate {
    pub month: u32,
    pub day: u32,
}

impl SlotDate {
    pub fn in_year(&self, year: i32) -> ChoseiResult<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .ok_or_else(|| ChoseiError::InvalidSlotDate(format!("{year}/{self}")))
    }
}

impl FromStr for SlotDate {
    type Err = ChoseiError;

    fn from_str(s: &str) -> ChoseiResult<Self> {
        let invalid = || ChoseiError::InvalidSlotDate(s.to_string());
        let (month, day) = s.trim().split_once('/').ok_or_else(invalid)?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;
        let day: u32 = day.trim().parse().map_err(|_| invalid())?;

        // 2024 is a leap year, so 2/29 is accepted here.
        NaiveDate::from_ymd_opt(2024, month, day).ok_or_else(invalid)?;
        Ok(Self { month, day })
    }
}

impl TryFrom<String> for SlotDate {
    type Error = ChoseiError;

    fn try_from(s: String) -> ChoseiResult<Self> {
        s.parse()
    }
}

impl From<SlotDate> for String {
    fn from(date: SlotDate) -> String {
        date.to_string()
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.day)
    }
}

/// Start and end time of a slot, written "H:MM~H:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SlotTime {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }
}

/// Parse "9:00", "09:00" or a bare hour such as "9".
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.contains(':') {
        NaiveTime::parse_from_str(s, "%H:%M").ok()
    } else {
        s.parse::<u32>()
            .ok()
            .and_then(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
    }
}

impl FromStr for SlotTime {
    type Err = ChoseiError;

    fn from_str(s: &str) -> ChoseiResult<Self> {
        let invalid = || ChoseiError::InvalidSlotTime(s.to_string());
        let (start, end) = s.split_once('~').ok_or_else(invalid)?;
        let start = parse_clock(start).ok_or_else(invalid)?;
        let end = parse_clock(end).ok_or_else(invalid)?;
        Self::new(start, end).ok_or_else(invalid)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = ChoseiError;

    fn try_from(s: String) -> ChoseiResult<Self> {
        s.parse()
    }
}

impl From<SlotTime> for String {
    fn from(time: SlotTime) -> String {
        time.to_string()
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{}",
            self.start.format("%-H:%M"),
            self.end.format("%-H:%M")
        )
    }
}

/// A (date, start, end) window, without availability data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotWindow {
    pub date: SlotDate,
    pub time: SlotTime,
}

impl SlotWindow {
    pub fn start_in(&self, year: i32) -> ChoseiResult<NaiveDateTime> {
        Ok(self.date.in_year(year)?.and_time(self.time.start))
    }

    pub fn end_in(&self, year: i32) -> ChoseiResult<NaiveDateTime> {
        Ok(self.date.in_year(year)?.and_time(self.time.end))
    }
}

impl fmt::Display for SlotWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(flatten)]
    pub window: SlotWindow,
    /// Availability keyed by attendee address.
    #[serde(default)]
    pub availabilities: BTreeMap<String, Availability>,
}

impl TimeSlot {
    pub fn availability_of(&self, email: &str) -> Availability {
        self.availabilities.get(email).copied().unwrap_or_default()
    }

}

/// How a grid row is emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowHighlight {
    None,
    EveryoneAvailable,
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGrid {
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
    /// Slot drawn with the strongest emphasis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<SlotWindow>,
}

impl ScheduleGrid {
    /// Load a grid from a TOML file.
    pub fn load(path: &Path) -> ChoseiResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ChoseiResult<Self> {
        let grid: ScheduleGrid =
            toml::from_str(contents).map_err(|e| ChoseiError::Schedule(e.to_string()))?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn to_toml(&self) -> ChoseiResult<String> {
        toml::to_string_pretty(self).map_err(|e| ChoseiError::Schedule(e.to_string()))
    }

    /// Load `path` if it exists, otherwise use the demonstration data.
    pub fn load_or_demo(path: &Path) -> ChoseiResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::demo())
        }
    }

    fn validate(&self) -> ChoseiResult<()> {
        for slot in &self.slots {
            if let Some(email) = slot
                .availabilities
                .keys()
                .find(|email| !self.attendees.iter().any(|a| &a.email == *email))
            {
                return Err(ChoseiError::Schedule(format!(
                    "Slot {} lists availability for unknown attendee '{}'",
                    slot.window, email
                )));
            }
        }
        Ok(())
    }

    /// True when every attendee of the grid is `Available` in `slot`.
    /// An attendee missing from the slot counts as `Unknown`.
    pub fn is_everyone_available(&self, slot: &TimeSlot) -> bool {
        !self.attendees.is_empty()
            && self
                .attendees
                .iter()
                .all(|a| slot.availability_of(&a.email) == Availability::Available)
    }

    pub fn highlight(&self, slot: &TimeSlot) -> RowHighlight {
        if self.target == Some(slot.window) {
            RowHighlight::Target
        } else if self.is_everyone_available(slot) {
            RowHighlight::EveryoneAvailable
        } else {
            RowHighlight::None
        }
    }

    /// Rows the date cell at `index` spans, or `None` when the row continues
    /// the previous row's date.
    pub fn date_span(&self, index: usize) -> Option<usize> {
        let slot = self.slots.get(index)?;
        if index > 0 && self.slots[index - 1].window.date == slot.window.date {
            return None;
        }
        Some(
            self.slots[index..]
                .iter()
                .take_while(|s| s.window.date == slot.window.date)
                .count(),
        )
    }

    pub fn find(&self, window: &SlotWindow) -> Option<&TimeSlot> {
        self.slots.iter().find(|s| s.window == *window)
    }

    /// Three days of half-hour-staggered one-hour slots for four attendees,
    /// with a single slot where everyone is free.
    pub fn demo() -> Self {
        let attendees = vec![
            Attendee::new("akiyama@example.onmicrosoft.com", Some("Akiyama Ren")),
            Attendee::new("hayashi@example.onmicrosoft.com", Some("Hayashi Mio")),
            Attendee::new("kato@example.onmicrosoft.com", Some("Kato Sora")),
            Attendee::new("mori@example.com", Some("Mori Aoi")),
        ];

        let starts = [
            (9, 0),
            (9, 30),
            (10, 0),
            (10, 30),
            (13, 0),
            (13, 30),
            (14, 0),
            (14, 30),
            (15, 0),
            (15, 30),
            (16, 0),
            (16, 30),
            (17, 0),
        ];
        let dates = [
            SlotDate { month: 3, day: 27 },
            SlotDate { month: 3, day: 28 },
            SlotDate { month: 3, day: 31 },
        ];
        let target = SlotWindow {
            date: SlotDate { month: 3, day: 31 },
            time: demo_time(16, 0),
        };

        let slots = dates
            .iter()
            .flat_map(|&date| {
                starts.iter().map(move |&(hour, minute)| SlotWindow {
                    date,
                    time: demo_time(hour, minute),
                })
            })
            .map(|window| {
                let availability = if window == target {
                    Availability::Available
                } else {
                    Availability::Unavailable
                };
                TimeSlot {
                    window,
                    availabilities: attendees
                        .iter()
                        .map(|a| (a.email.clone(), availability))
                        .collect(),
                }
            })
            .collect();

        Self {
            attendees,
            slots,
            target: Some(target),
        }
    }
}

/// One-hour slot starting at `hour:minute`; only called with in-range literals.
fn demo_time(hour: u32, minute: u32) -> SlotTime {
    let start = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let end = NaiveTime::from_hms_opt(hour + 1, minute, 0).unwrap_or(NaiveTime::MIN);
    SlotTime { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(date: &str, time: &str) -> SlotWindow {
        SlotWindow {
            date: date.parse().unwrap(),
            time: time.parse().unwrap(),
        }
    }

    #[test]
    fn test_parse_slot_labels() {
        let w = window("3/31", "16:00~17:00");
        assert_eq!(w.to_string(), "3/31 16:00~17:00");
        assert_eq!(window("12/1", "9~10").to_string(), "12/1 9:00~10:00");
        assert!("3-31".parse::<SlotDate>().is_err());
        assert!("2/30".parse::<SlotDate>().is_err());
        assert!("17:00~16:00".parse::<SlotTime>().is_err());
        assert!("16:00".parse::<SlotTime>().is_err());
    }

    #[test]
    fn test_slot_datetimes_use_given_year() {
        let w = window("3/31", "9:30~10:30");
        assert_eq!(
            w.start_in(2025).unwrap().format(SLOT_DATETIME_FORMAT).to_string(),
            "2025-03-31T09:30:00"
        );
        assert_eq!(
            w.end_in(2025).unwrap().format(SLOT_DATETIME_FORMAT).to_string(),
            "2025-03-31T10:30:00"
        );
        assert!(window("2/29", "9~10").start_in(2025).is_err());
    }

    #[test]
    fn test_demo_has_single_everyone_available_row() {
        let grid = ScheduleGrid::demo();
        assert_eq!(grid.attendees.len(), 4);
        assert_eq!(grid.slots.len(), 39);

        let free: Vec<_> = grid
            .slots
            .iter()
            .filter(|s| grid.is_everyone_available(s))
            .collect();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].window, window("3/31", "16:00~17:00"));
        assert_eq!(grid.highlight(free[0]), RowHighlight::Target);
        assert_eq!(grid.highlight(&grid.slots[0]), RowHighlight::None);
    }

    #[test]
    fn test_date_span_groups_consecutive_rows() {
        let grid = ScheduleGrid::demo();
        assert_eq!(grid.date_span(0), Some(13));
        assert_eq!(grid.date_span(1), None);
        assert_eq!(grid.date_span(13), Some(13));
        assert_eq!(grid.date_span(39), None);
    }

    #[test]
    fn test_everyone_available_without_target() {
        let mut grid = ScheduleGrid::demo();
        grid.target = None;
        let slot = grid.find(&window("3/31", "16:00~17:00")).unwrap();
        assert_eq!(grid.highlight(slot), RowHighlight::EveryoneAvailable);
    }

    #[test]
    fn test_missing_availability_is_unknown() {
        let slot = TimeSlot {
            window: window("4/1", "9:00~10:00"),
            availabilities: BTreeMap::new(),
        };
        assert_eq!(slot.availability_of("x@example.com"), Availability::Unknown);
        assert_eq!(Availability::Unknown.symbol(), "×");
    }

    #[test]
    fn test_load_from_toml() {
        let toml = r#"
target = { date = "4/2", time = "10:00~11:00" }

[[attendees]]
email = "a@example.com"
display_name = "A"

[[attendees]]
email = "b@example.com"

[[slots]]
date = "4/2"
time = "10:00~11:00"
availabilities = { "a@example.com" = "available", "b@example.com" = "available" }

[[slots]]
date = "4/2"
time = "11:00~12:00"
availabilities = { "a@example.com" = "unavailable" }
"#;
        let grid = ScheduleGrid::from_toml(toml).unwrap();
        assert_eq!(grid.attendees[1].label(), "b@example.com");
        assert_eq!(grid.highlight(&grid.slots[0]), RowHighlight::Target);
        assert_eq!(
            grid.slots[1].availability_of("b@example.com"),
            Availability::Unknown
        );
    }

    #[test]
    fn test_partial_availability_is_not_everyone_available() {
        let toml = r#"
[[attendees]]
email = "a@example.com"

[[attendees]]
email = "b@example.com"

[[slots]]
date = "4/2"
time = "10:00~11:00"
availabilities = { "a@example.com" = "available" }

[[slots]]
date = "4/2"
time = "11:00~12:00"
"#;
        let grid = ScheduleGrid::from_toml(toml).unwrap();
        assert_eq!(
            grid.slots[0].availability_of("b@example.com"),
            Availability::Unknown
        );
        assert_eq!(grid.highlight(&grid.slots[0]), RowHighlight::None);
        assert_eq!(grid.highlight(&grid.slots[1]), RowHighlight::None);
    }

    #[test]
    fn test_rejects_unknown_attendee_in_slot() {
        let toml = r#"
[[attendees]]
email = "a@example.com"

[[slots]]
date = "4/2"
time = "10:00~11:00"
availabilities = { "z@example.com" = "available" }
"#;
        let err = ScheduleGrid::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("z@example.com"));
    }

    #[test]
    fn test_demo_survives_toml_round_trip() {
        let grid = ScheduleGrid::demo();
        let reparsed = ScheduleGrid::from_toml(&grid.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, grid);
    }
}
