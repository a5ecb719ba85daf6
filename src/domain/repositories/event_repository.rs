use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::event::{
    CommunityMember, CreatedEvent, Event, NewEventRecord, OccurrenceRecord, Participant,
    ParticipantRole,
};

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    AlreadyExists,
    InvalidData(String),
    StorageError(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Record not found"),
            RepositoryError::AlreadyExists => write!(f, "Record already exists"),
            RepositoryError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            RepositoryError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert the event, its host participant and the optional community in one transaction
    async fn create_event(&self, record: NewEventRecord) -> Result<CreatedEvent>;

    async fn get_event(&self, event_id: u64) -> Result<Option<Event>>;

    /// Events starting at or after `from`, earliest first
    async fn list_events_from(&self, from: DateTime<Utc>, limit: usize) -> Result<Vec<Event>>;

    async fn list_events(&self) -> Result<Vec<Event>>;

    /// Returns false when the user already participates
    async fn add_participant(
        &self,
        event_id: u64,
        user_id: u64,
        role: ParticipantRole,
    ) -> Result<bool>;

    /// Returns false when the user was not a participant
    async fn remove_participant(&self, event_id: u64, user_id: u64) -> Result<bool>;

    async fn participants(&self, event_id: u64) -> Result<Vec<Participant>>;

    async fn community_members(&self, community_id: u64) -> Result<Vec<CommunityMember>>;

    /// Insert child occurrence rows for `parent`, skipping ones that already exist.
    /// Returns only the rows created by this call.
    async fn insert_occurrences(
        &self,
        parent: &Event,
        occurrences: Vec<OccurrenceRecord>,
    ) -> Result<Vec<Event>>;

    async fn children_of(&self, parent_event_id: u64) -> Result<Vec<Event>>;
}
