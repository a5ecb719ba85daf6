pub mod weekday_format;
