//! OpenWeatherMap current-weather client.
//!
//! One GET per call, no retries. The query string (coordinates, units, API
//! key) is built once from the startup configuration and reused verbatim.

use crate::config::Config;
use serde::Deserialize;

// ── Errors ──────────────────────────────────────────────────────────

/// Errors from a single fetch. All of them are recoverable: the poll cycle is
/// skipped and retried after the fixed interval.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("response failed with status code {status} and body: {body}")]
    Status { status: u16, body: String },

    #[error("cannot decode weather response: {0}")]
    Decode(String),

    #[error("invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

// ── Observation ─────────────────────────────────────────────────────

/// One set of current readings for the configured location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub temperature: f64,
    /// hPa
    pub pressure: u16,
    /// Relative humidity, 0-100.
    pub humidity: u8,
}

/// Wire format of the fields we read from the response. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    pressure: u16,
    humidity: u8,
}

/// Decode a response body into an observation.
pub fn parse_observation(body: &str) -> Result<WeatherObservation> {
    let response: CurrentWeatherResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let main = response.main;

    if main.humidity > 100 {
        return Err(ApiError::Decode(format!(
            "humidity {} is outside 0-100",
            main.humidity
        )));
    }

    Ok(WeatherObservation {
        temperature: main.temp,
        pressure: main.pressure,
        humidity: main.humidity,
    })
}

// ── Client ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    url: reqwest::Url,
}

impl OpenWeatherClient {
    /// Build a client whose every request carries `config.request_timeout`.
    pub fn new(config: &Config) -> Result<Self> {
        let url = reqwest::Url::parse_with_params(
            &config.api_url,
            &[
                ("lat", config.latitude.to_string()),
                ("lon", config.longitude.to_string()),
                ("units", config.units.clone()),
                ("appid", config.api_key.clone()),
            ],
        )
        .map_err(|e| ApiError::InvalidUrl {
            url: config.api_url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            url,
        })
    }

    /// Endpoint without the query string, safe to log.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and decode the current weather.
    pub async fn fetch(&self) -> Result<WeatherObservation> {
        log::debug!("Getting weather from {}", self.base_url);

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if status.as_u16() >= 300 {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_observation(&body)
    }
}

fn classify(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Http(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
