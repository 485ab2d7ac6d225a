//! Process configuration read from environment variables.
//!
//! Every required variable must be present and non-empty; the binary refuses
//! to start otherwise. Values are fixed for the life of the process.

use std::time::Duration;

/// Default OpenWeatherMap current-weather endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Default upper bound on a single fetch.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is empty")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Exporter configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub latitude: f64,
    pub longitude: f64,
    /// Unit system passed through to the API (`standard`, `metric`, `imperial`).
    pub units: String,
    /// Value of the `location` label on every exported series.
    pub location: String,
    pub api_key: String,
    pub port: u16,
    pub api_url: String,
    pub request_timeout: Duration,
}

/// Command-line values. When set, the matching environment variable is not read.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<String>,
}

impl Config {
    /// Load configuration from the process environment, with `overrides` taking precedence.
    pub fn from_env_with(overrides: &Overrides) -> Result<Self> {
        Self::from_lookup_with(|name| std::env::var(name).ok(), overrides)
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(lookup, &Overrides::default())
    }

    pub fn from_lookup_with<F>(lookup: F, overrides: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String> {
            match lookup(name) {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(ConfigError::Missing(name)),
            }
        };

        let latitude = parse_coordinate("LAT", &required("LAT")?, 90.0)?;
        let longitude = parse_coordinate("LON", &required("LON")?, 180.0)?;
        let units = required("UNITS")?;
        let location = required("CITY")?;
        let api_key = required("OPENWEATHER_API_KEY")?;
        let port = parse_port(&required("PORT")?)?;

        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| lookup("OPENWEATHER_API_URL"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = match &overrides.timeout_secs {
            Some(v) => parse_timeout("--timeout-secs", v.trim())?,
            None => match lookup("REQUEST_TIMEOUT_SECS") {
                Some(v) if !v.trim().is_empty() => {
                    parse_timeout("REQUEST_TIMEOUT_SECS", v.trim())?
                }
                _ => DEFAULT_REQUEST_TIMEOUT,
            },
        };

        Ok(Self {
            latitude,
            longitude,
            units,
            location,
            api_key,
            port,
            api_url,
            request_timeout,
        })
    }
}

fn parse_coordinate(var: &'static str, value: &str, limit: f64) -> Result<f64> {
    let parsed: f64 = value.parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: "not a number".to_string(),
    })?;
    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: format!("must be within -{limit}..={limit}"),
        });
    }
    Ok(parsed)
}

fn parse_port(value: &str) -> Result<u16> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: "PORT",
        value: value.to_string(),
        reason: "not a valid TCP port".to_string(),
    })
}

/// Parse a request timeout in whole seconds. Zero is rejected so a fetch can never hang.
fn parse_timeout(var: &'static str, value: &str) -> Result<Duration> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be a positive number of seconds".to_string(),
        }),
    }
}
