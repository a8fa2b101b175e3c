//! Conversion from composed invites to Graph event payloads.

use chosei_core::invite::MeetingInvite;
use chosei_core::schedule::{Attendee, SLOT_DATETIME_FORMAT};
use chrono::NaiveDateTime;

use crate::types::{
    DateTimeTimeZone, EmailAddress, GraphAttendee, GraphEvent, ItemBody, Location,
};

pub const ONLINE_MEETING_PROVIDER: &str = "teamsForBusiness";

pub trait ToGraph {
    fn to_graph(&self) -> GraphEvent;
}

impl ToGraph for MeetingInvite {
    fn to_graph(&self) -> GraphEvent {
        GraphEvent {
            subject: self.subject.clone(),
            body: ItemBody {
                content_type: "HTML".to_string(),
                content: self.body.clone(),
            },
            start: date_time_to_graph(&self.start, &self.time_zone),
            end: date_time_to_graph(&self.end, &self.time_zone),
            location: Location {
                display_name: self.location.clone(),
            },
            attendees: self.attendees.iter().map(attendee_to_graph).collect(),
            is_online_meeting: true,
            online_meeting_provider: ONLINE_MEETING_PROVIDER.to_string(),
        }
    }
}

fn date_time_to_graph(dt: &NaiveDateTime, time_zone: &str) -> DateTimeTimeZone {
    DateTimeTimeZone {
        date_time: dt.format(SLOT_DATETIME_FORMAT).to_string(),
        time_zone: time_zone.to_string(),
    }
}

fn attendee_to_graph(attendee: &Attendee) -> GraphAttendee {
    GraphAttendee {
        email_address: EmailAddress {
            address: attendee.email.clone(),
            name: attendee.label().to_string(),
        },
        attendee_type: "required".to_string(),
    }
}
