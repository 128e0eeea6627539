//! Core library for the `wxlookup` CLI.
//!
//! This crate defines:
//! - Startup configuration (API key, endpoint, timeout)
//! - The OpenWeatherMap client behind the `WeatherProvider` trait
//! - Timezone resolution and local-time formatting
//! - Output sinks (console, CSV, JSON)
//!
//! It is used by `wxlookup-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod sink;
pub mod time_format;
pub mod timezone;

pub use config::{Config, Settings};
pub use error::FetchError;
pub use model::{Coordinates, WeatherRecord};
pub use provider::{WeatherProvider, provider_from_config};
pub use sink::{FileFormat, OutputTarget, Sink, SinkError};
pub use timezone::TimezoneResolver;
