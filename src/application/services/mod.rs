pub mod event_service;
pub mod recurrence_parser;
pub mod timezone_service;

pub use event_service::{EventError, EventService, NewEvent};
pub use recurrence_parser::{RecurrenceForm, describe_pattern, parse_date};
pub use timezone_service::TimezoneService;
