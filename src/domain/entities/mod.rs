pub mod event;
pub mod recurrence;
