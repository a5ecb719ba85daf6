pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::event::{
    Community, CommunityMember, CreatedEvent, Event, EventTheme, MemberRole, NewCommunity,
    NewEventRecord, OccurrenceRecord, Participant, ParticipantRole,
};
pub use entities::recurrence::{RecurrenceKind, RecurrencePattern, generate};
