//! OpenWeatherMap exporter for Prometheus.
//!
//! Polls the current weather for one configured location every ten minutes
//! and exposes the latest readings as gauges:
//! - `weather_temperature{location}`
//! - `weather_humidity{location}`
//! - `weather_pressure{location}`
//! - `weather_last_updated{location}` (Unix seconds of the last successful update)
//!
//! A failed fetch leaves the previous values in place; only
//! `weather_last_updated` shows that data has gone stale.

pub mod api;
pub mod config;
pub mod http_server;
pub mod metrics;
pub mod poller;

pub use api::{ApiError, OpenWeatherClient, WeatherObservation};
pub use config::{Config, ConfigError, Overrides};
pub use metrics::{MetricStore, MetricsError, Sample};
pub use poller::{Poller, POLL_INTERVAL};
