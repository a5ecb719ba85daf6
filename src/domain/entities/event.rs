use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::recurrence::RecurrencePattern;

pub const MAX_TITLE_LEN: usize = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub creator_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub theme: EventTheme,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub timezone: String,
    pub recurrence: Option<RecurrencePattern>,
    pub parent_event_id: Option<u64>, // set on materialized occurrences
    pub community_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ends_at.map(|end| end - self.starts_at)
    }
}

/// Visual theme of the invitation card sent for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventTheme {
    #[default]
    Classic,
    Party,
    Minimal,
    Seasonal,
}

impl EventTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventTheme::Classic => "classic",
            EventTheme::Party => "party",
            EventTheme::Minimal => "minimal",
            EventTheme::Seasonal => "seasonal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Some(EventTheme::Classic),
            "party" => Some(EventTheme::Party),
            "minimal" => Some(EventTheme::Minimal),
            "seasonal" => Some(EventTheme::Seasonal),
            _ => None,
        }
    }
}

/// Validated event row, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewEventRecord {
    pub creator_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub theme: EventTheme,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub timezone: String,
    pub recurrence: Option<RecurrencePattern>,
    pub community: Option<NewCommunity>,
}

#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub description: Option<String>,
}

/// Child occurrence row produced when a recurring event is materialized
#[derive(Debug, Clone)]
pub struct OccurrenceRecord {
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEvent {
    pub event: Event,
    pub community: Option<Community>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Host,
    Guest,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Host => "host",
            ParticipantRole::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "host" => Some(ParticipantRole::Host),
            "guest" => Some(ParticipantRole::Guest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub event_id: u64,
    pub user_id: u64,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Community {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(MemberRole::Admin),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityMember {
    pub community_id: u64,
    pub user_id: u64,
    pub role: MemberRole,
}
