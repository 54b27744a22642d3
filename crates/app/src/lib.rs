#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod app;
pub mod config;
pub mod log;
pub mod ticker;

pub use app::{App, Event, Output};
pub use config::{Config, ConfigError};
