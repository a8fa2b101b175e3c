//! Per-slot meeting invite composer.
//!
//! Opening a slot from the availability grid shows an edit modal prefilled for
//! that slot. Submitting goes through `begin_submit`/`finish_submit`, which
//! hold the loading flag so a second submission is refused while one is in
//! flight.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::{ChoseiError, ChoseiResult};
use crate::schedule::{Attendee, SlotWindow};

pub const DEFAULT_SUBJECT: &str = "会議のお知らせ";
pub const DEFAULT_BODY: &str = "会議にご参加ください。";
pub const DEFAULT_LOCATION: &str = "オンライン";
pub const DEFAULT_TIME_ZONE: &str = "Asia/Tokyo";

/// Shown for any failed submission, whatever the cause.
pub const FAILURE_MESSAGE: &str = "会議依頼の送信に失敗しました";

/// How long the success modal stays up before closing itself.
pub const SUCCESS_DISMISS_AFTER: Duration = Duration::from_secs(3);

/// A meeting invite ready to hand to the calendar API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingInvite {
    pub subject: String,
    /// HTML body content.
    pub body: String,
    pub location: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// IANA zone the start and end are expressed in.
    pub time_zone: String,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Edit { slot: SlotWindow },
    Success { message: String },
}

pub struct InviteComposer {
    attendees: Vec<Attendee>,
    modal: ModalState,
    subject: String,
    body: String,
    location: String,
    selected: Vec<String>,
    loading: bool,
    error: Option<String>,
}

impl InviteComposer {
    pub fn new(attendees: Vec<Attendee>) -> Self {
        Self {
            attendees,
            modal: ModalState::Closed,
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            selected: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Open the edit modal for `slot`, resetting subject and body and
    /// selecting every attendee.
    pub fn open(&mut self, slot: SlotWindow) {
        self.subject = format!("会議: {slot}");
        self.body = format!("{slot}の会議にご参加ください。");
        self.selected = self.attendees.iter().map(|a| a.email.clone()).collect();
        self.modal = ModalState::Edit { slot };
    }

    pub fn close(&mut self) {
        self.modal = ModalState::Closed;
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn toggle_attendee(&mut self, email: &str) {
        if let Some(pos) = self.selected.iter().position(|e| e == email) {
            self.selected.remove(pos);
        } else {
            self.selected.push(email.to_string());
        }
    }

    pub fn is_attendee_selected(&self, email: &str) -> bool {
        self.selected.iter().any(|e| e == email)
    }

    /// Selected attendees, in grid column order.
    pub fn selected_attendees(&self) -> Vec<Attendee> {
        self.attendees
            .iter()
            .filter(|a| self.is_attendee_selected(&a.email))
            .cloned()
            .collect()
    }

    /// Mark the composer as sending and build the invite for the open slot.
    ///
    /// Fails when no slot is open or a submission is already in flight. A slot
    /// whose date does not exist in `year` fails with the failure message set.
    pub fn begin_submit(&mut self, year: i32, time_zone: &str) -> ChoseiResult<MeetingInvite> {
        let ModalState::Edit { slot } = &self.modal else {
            return Err(ChoseiError::ModalNotOpen);
        };
        if self.loading {
            return Err(ChoseiError::SubmitInProgress);
        }

        let window = slot
            .start_in(year)
            .and_then(|start| Ok((start, slot.end_in(year)?)));
        let (start, end) = match window {
            Ok(window) => window,
            Err(e) => {
                warn!(%slot, year, "Slot has no date in this year");
                self.error = Some(FAILURE_MESSAGE.to_string());
                return Err(e);
            }
        };

        let invite = MeetingInvite {
            subject: self.subject.clone(),
            body: self.body.clone(),
            location: self.location.clone(),
            start,
            end,
            time_zone: time_zone.to_string(),
            attendees: self.selected_attendees(),
        };

        self.loading = true;
        self.error = None;
        Ok(invite)
    }

    /// Record the outcome of the submission started by `begin_submit`.
    pub fn finish_submit<E>(&mut self, outcome: Result<(), E>) {
        self.loading = false;

        match (outcome, &self.modal) {
            (Ok(()), ModalState::Edit { slot }) => {
                let message = format!("{slot}の会議依頼を送信しました");
                info!(%slot, "Meeting invite sent");
                self.modal = ModalState::Success { message };
            }
            (Ok(()), _) => {}
            (Err(_), _) => self.error = Some(FAILURE_MESSAGE.to_string()),
        }
    }

    /// Close the success modal. Leaves any other modal state alone.
    pub fn dismiss_success(&mut self) {
        if matches!(self.modal, ModalState::Success { .. }) {
            self.modal = ModalState::Closed;
        }
    }
}
