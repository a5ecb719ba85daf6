pub mod date_format;
pub mod event_format;

pub use date_format::DateFormat;
pub use event_format::format_event_line;
