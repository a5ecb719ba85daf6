use crate::application::services::recurrence_parser::{RecurrenceForm, RecurrenceParseError};
use crate::application::services::timezone_service::{TimezoneError, TimezoneService};
use crate::domain::entities::event::MAX_TITLE_LEN;
use crate::domain::repositories::{EventRepository, RepositoryError};
use crate::domain::{
    CommunityMember, CreatedEvent, Event, EventTheme, NewCommunity, NewEventRecord,
    OccurrenceRecord, Participant, ParticipantRole, RecurrencePattern, generate,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum EventError {
    Validation(String),
    NotFound(u64),
    Forbidden(String),
    Repository(RepositoryError),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EventError::Validation(msg) => write!(f, "{}", msg),
            EventError::NotFound(id) => write!(f, "Couldn't find event with ID {}", id),
            EventError::Forbidden(msg) => write!(f, "{}", msg),
            EventError::Repository(RepositoryError::AlreadyExists) => {
                write!(f, "A community with that name already exists")
            }
            EventError::Repository(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EventError {}

impl From<RepositoryError> for EventError {
    fn from(err: RepositoryError) -> Self {
        EventError::Repository(err)
    }
}

impl From<TimezoneError> for EventError {
    fn from(err: TimezoneError) -> Self {
        EventError::Validation(err.to_string())
    }
}

impl From<RecurrenceParseError> for EventError {
    fn from(err: RecurrenceParseError) -> Self {
        EventError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EventError>;

/// Event as submitted by a user, with wall-clock times in `timezone`
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub creator_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub theme: EventTheme,
    pub starts_at_local: NaiveDateTime,
    pub ends_at_local: Option<NaiveDateTime>,
    pub timezone: String,
    pub recurrence: Option<RecurrenceForm>,
    pub community: Option<NewCommunity>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct EventService {
    event_repo: Arc<dyn EventRepository>,
    timezone_service: Arc<TimezoneService>,
    fuzzy_matcher: Arc<SkimMatcherV2>,
}

impl EventService {
    pub fn new(event_repo: Arc<dyn EventRepository>, timezone_service: Arc<TimezoneService>) -> Self {
        Self {
            event_repo,
            timezone_service,
            fuzzy_matcher: Arc::new(SkimMatcherV2::default()),
        }
    }

    // === EVENT CREATION ===

    /// Validates the submission and persists the event, its host and the optional community atomically.
    pub async fn create_event(&self, new_event: NewEvent) -> Result<CreatedEvent> {
        let title = new_event.title.trim().to_string();
        if title.is_empty() {
            return Err(EventError::Validation("Event title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(EventError::Validation(format!(
                "Event title cannot be longer than {} characters",
                MAX_TITLE_LEN
            )));
        }

        let tz = self.timezone_service.validate(&new_event.timezone)?;
        let starts_at = self.timezone_service.to_utc(new_event.starts_at_local, tz)?;
        let ends_at = new_event
            .ends_at_local
            .map(|local| self.timezone_service.to_utc(local, tz))
            .transpose()?;

        if let Some(end) = ends_at {
            if end <= starts_at {
                return Err(EventError::Validation(
                    "Event must end after it starts".to_string(),
                ));
            }
        }

        let recurrence = new_event
            .recurrence
            .map(|form| form.into_pattern(new_event.starts_at_local.date()))
            .transpose()?;

        let community = match new_event.community {
            Some(community) => {
                let name = community.name.trim().to_string();
                if name.is_empty() {
                    return Err(EventError::Validation(
                        "Community name cannot be empty".to_string(),
                    ));
                }
                Some(NewCommunity {
                    name,
                    description: non_blank(community.description),
                })
            }
            None => None,
        };

        let record = NewEventRecord {
            creator_id: new_event.creator_id,
            title,
            description: non_blank(new_event.description),
            location: non_blank(new_event.location),
            theme: new_event.theme,
            starts_at,
            ends_at,
            timezone: tz.name().to_string(),
            recurrence,
            community,
        };

        let created = self.event_repo.create_event(record).await?;
        info!(
            event_id = created.event.id,
            creator_id = created.event.creator_id,
            recurring = created.event.is_recurring(),
            "Created event"
        );
        Ok(created)
    }

    // === DISCOVERY ===

    pub async fn get_event(&self, event_id: u64) -> Result<Event> {
        self.event_repo
            .get_event(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))
    }

    pub async fn list_upcoming(&self, from: DateTime<Utc>, limit: usize) -> Result<Vec<Event>> {
        Ok(self.event_repo.list_events_from(from, limit).await?)
    }

    /// Fuzzy search over title, location and description. Materialized
    /// occurrences are left out so each series shows up once.
    pub async fn search_events(&self, query: &str, limit: usize) -> Result<Vec<Event>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list_upcoming(Utc::now(), limit).await;
        }

        let mut scored: Vec<(i64, bool, Event)> = self
            .event_repo
            .list_events()
            .await?
            .into_iter()
            .filter(|event| event.parent_event_id.is_none())
            .filter_map(|event| {
                let title = event.title.to_lowercase();
                let fields = [
                    Some(title.as_str()),
                    event.location.as_deref(),
                    event.description.as_deref(),
                ];
                let score = fields
                    .into_iter()
                    .flatten()
                    .filter_map(|field| {
                        self.fuzzy_matcher
                            .fuzzy_match(&field.to_lowercase(), &query)
                    })
                    .max()?;
                let title_hit = title.contains(&query);
                Some((score, title_hit, event))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.starts_at.cmp(&b.2.starts_at))
        });

        debug!(query = %query, matches = scored.len(), "Event search");
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, event)| event)
            .collect())
    }

    // === PARTICIPATION ===

    /// Returns false when the user had already joined
    pub async fn join_event(&self, event_id: u64, user_id: u64) -> Result<bool> {
        let joined = self
            .event_repo
            .add_participant(event_id, user_id, ParticipantRole::Guest)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => EventError::NotFound(event_id),
                other => EventError::Repository(other),
            })?;

        if joined {
            info!(event_id, user_id, "User joined event");
        }
        Ok(joined)
    }

    /// Returns false when the user was not participating
    pub async fn leave_event(&self, event_id: u64, user_id: u64) -> Result<bool> {
        let event = self.get_event(event_id).await?;
        if event.creator_id == user_id {
            return Err(EventError::Forbidden(
                "The host can't leave their own event".to_string(),
            ));
        }

        let left = self.event_repo.remove_participant(event_id, user_id).await?;
        if left {
            info!(event_id, user_id, "User left event");
        }
        Ok(left)
    }

    pub async fn participants(&self, event_id: u64) -> Result<Vec<Participant>> {
        self.get_event(event_id).await?;
        Ok(self.event_repo.participants(event_id).await?)
    }

    pub async fn community_members(&self, community_id: u64) -> Result<Vec<CommunityMember>> {
        Ok(self.event_repo.community_members(community_id).await?)
    }

    // === RECURRENCE ===

    pub fn preview_occurrences(&self, pattern: &RecurrencePattern, limit: usize) -> Vec<NaiveDate> {
        generate(pattern, limit)
    }

    pub async fn preview_event_occurrences(
        &self,
        event_id: u64,
        limit: usize,
    ) -> Result<Vec<NaiveDate>> {
        let event = self.get_event(event_id).await?;
        let pattern = Self::recurrence_of(&event)?;
        Ok(generate(pattern, limit))
    }

    /// Writes child rows for the occurrences after the anchor, keeping the
    /// parent's local start time and duration. Already written occurrences are
    /// skipped; the returned list holds only the new rows.
    pub async fn materialize_occurrences(&self, event_id: u64, limit: usize) -> Result<Vec<Event>> {
        let event = self.get_event(event_id).await?;
        let pattern = Self::recurrence_of(&event)?;
        let tz = self.timezone_service.validate(&event.timezone)?;

        let local_time = self.timezone_service.to_local(event.starts_at, tz).time();
        let duration = event.duration();

        let mut occurrences = Vec::new();
        for date in generate(pattern, limit).into_iter().skip(1) {
            let local = date.and_time(local_time);
            match self.timezone_service.to_utc(local, tz) {
                Ok(starts_at) => occurrences.push(OccurrenceRecord {
                    starts_at,
                    ends_at: duration.map(|d| starts_at + d),
                }),
                Err(e) => warn!(event_id, %date, "Skipping occurrence: {}", e),
            }
        }

        let created = self.event_repo.insert_occurrences(&event, occurrences).await?;
        info!(event_id, created = created.len(), "Materialized occurrences");
        Ok(created)
    }

    pub async fn occurrences_of(&self, event_id: u64) -> Result<Vec<Event>> {
        self.get_event(event_id).await?;
        Ok(self.event_repo.children_of(event_id).await?)
    }

    fn recurrence_of(event: &Event) -> Result<&RecurrencePattern> {
        event.recurrence.as_ref().ok_or_else(|| {
            EventError::Validation(format!("Event {} is not recurring", event.id))
        })
    }
}
