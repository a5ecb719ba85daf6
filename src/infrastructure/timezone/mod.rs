pub mod timezone_manager;

pub use timezone_manager::TimezoneManager;
