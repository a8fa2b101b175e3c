use anyhow::Result;
use chosei_core::duration::MeetingDuration;
use chosei_core::invite::{
    DEFAULT_BODY, DEFAULT_LOCATION, DEFAULT_SUBJECT, FAILURE_MESSAGE, MeetingInvite,
};
use chosei_core::schedule::Attendee;
use chosei_graph::actions;
use chrono::NaiveDateTime;
use owo_colors::OwoColorize;
use tracing::warn;

use crate::context::AppContext;
use crate::utils::tui::create_spinner;

pub struct InviteArgs {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub duration: Option<MeetingDuration>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
}

/// Parse "2025-03-31T16:00", "2025-03-31 16:00" or either with seconds.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .ok_or_else(|| format!("Invalid date/time '{s}'. Expected YYYY-MM-DDTHH:MM"))
}

impl InviteArgs {
    fn end(&self) -> NaiveDateTime {
        self.end.unwrap_or_else(|| {
            self.start + self.duration.unwrap_or_default().as_duration()
        })
    }

    fn into_invite(self, time_zone: &str) -> Result<MeetingInvite> {
        let end = self.end();
        if end <= self.start {
            anyhow::bail!("End time must be after start time");
        }

        Ok(MeetingInvite {
            subject: self.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body: self.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            location: self.location.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            start: self.start,
            end,
            time_zone: time_zone.to_string(),
            attendees: self
                .attendees
                .into_iter()
                .map(|email| Attendee::new(email, None))
                .collect(),
        })
    }
}

pub async fn run(args: InviteArgs) -> Result<()> {
    let mut ctx = AppContext::load()?;
    let invite = args.into_invite(&ctx.config.time_zone)?;

    let spinner = create_spinner("会議依頼を送信中...".to_string());
    let result = actions::send_invite(&mut ctx.identity, &ctx.graph, &invite).await;
    spinner.finish_and_clear();

    match result {
        Ok(created) => {
            println!(
                "{} {}の会議依頼を送信しました",
                "✓".green(),
                invite.start.format("%-m/%-d %-H:%M")
            );
            if let Some(join_url) = created.online_meeting.and_then(|m| m.join_url) {
                println!("   Teams: {}", join_url.dimmed());
            }
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Failed to send meeting invite");
            anyhow::bail!(FAILURE_MESSAGE)
        }
    }
}
