//! Fixed-interval fetch → decode → store loop for one location.

use crate::api::{ApiError, OpenWeatherClient, WeatherObservation};
use crate::metrics::MetricStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wait between two poll cycles, whatever the previous cycle's outcome.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct Poller {
    client: OpenWeatherClient,
    store: Arc<MetricStore>,
    location: String,
    interval: Duration,
}

impl Poller {
    pub fn new(client: OpenWeatherClient, store: Arc<MetricStore>, location: String) -> Self {
        Self {
            client,
            store,
            location,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one cycle without the trailing wait.
    ///
    /// The store is written only once the observation is fully decoded, so a
    /// failed cycle leaves every series for this location untouched.
    pub async fn poll_once(&self) -> Result<WeatherObservation, ApiError> {
        let obs = self.client.fetch().await?;
        self.store
            .record(&self.location, &obs, chrono::Utc::now().timestamp());
        Ok(obs)
    }

    /// Poll until `shutdown_rx` fires. Cycles never overlap.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<()>) {
        log::info!(
            "Polling {} for '{}' every {}s",
            self.client.base_url(),
            self.location,
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                result = self.poll_once() => match result {
                    Ok(obs) => log::info!(
                        "Updated '{}': temperature={} humidity={}% pressure={}hPa",
                        self.location,
                        obs.temperature,
                        obs.humidity,
                        obs.pressure
                    ),
                    Err(e) => log::warn!(
                        "Skipping update for '{}': {}",
                        self.location,
                        e
                    ),
                },
            }

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        log::debug!("Poller for '{}' stopping", self.location);
    }
}
