//! Meeting length options offered by the duration dropdown.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChoseiError, ChoseiResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingDuration {
    #[default]
    ThirtyMinutes,
    OneHour,
    NinetyMinutes,
    TwoHours,
    TwoAndHalfHours,
    ThreeHours,
}

impl MeetingDuration {
    /// All options in dropdown order.
    pub const ALL: [MeetingDuration; 6] = [
        MeetingDuration::ThirtyMinutes,
        MeetingDuration::OneHour,
        MeetingDuration::NinetyMinutes,
        MeetingDuration::TwoHours,
        MeetingDuration::TwoAndHalfHours,
        MeetingDuration::ThreeHours,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MeetingDuration::ThirtyMinutes => "30分",
            MeetingDuration::OneHour => "1時間",
            MeetingDuration::NinetyMinutes => "1時間30分",
            MeetingDuration::TwoHours => "2時間",
            MeetingDuration::TwoAndHalfHours => "2時間30分",
            MeetingDuration::ThreeHours => "3時間",
        }
    }

    pub fn minutes(self) -> i64 {
        match self {
            MeetingDuration::ThirtyMinutes => 30,
            MeetingDuration::OneHour => 60,
            MeetingDuration::NinetyMinutes => 90,
            MeetingDuration::TwoHours => 120,
            MeetingDuration::TwoAndHalfHours => 150,
            MeetingDuration::ThreeHours => 180,
        }
    }

    pub fn as_duration(self) -> chrono::Duration {
        chrono::Duration::minutes(self.minutes())
    }

    fn from_minutes(minutes: u64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| u64::try_from(d.minutes()).ok() == Some(minutes))
    }
}

impl fmt::Display for MeetingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MeetingDuration {
    type Err = ChoseiError;

    /// Accepts the dropdown label ("1時間30分") or a humantime span ("90m", "1h 30m").
    fn from_str(s: &str) -> ChoseiResult<Self> {
        let s = s.trim();
        if let Some(d) = Self::ALL.into_iter().find(|d| d.label() == s) {
            return Ok(d);
        }

        humantime::parse_duration(s)
            .ok()
            .filter(|span| span.as_secs() % 60 == 0)
            .and_then(|span| Self::from_minutes(span.as_secs() / 60))
            .ok_or_else(|| ChoseiError::InvalidDuration(s.to_string()))
    }
}
