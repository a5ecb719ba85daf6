pub mod bootstrap;
pub mod config;
pub mod database;
pub mod repositories;
pub mod timezone;
