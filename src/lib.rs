pub mod adapters;
pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod notify;
pub mod persistence;
pub mod services;
pub mod signing;

pub use config::AppConfig;
pub use error::{Result, WatcherError};
