//! Gauge store shared between the poller (writer) and the `/metrics` handler (reader).
//!
//! The store owns its own [`prometheus::Registry`] instead of using the
//! process-global one, so tests and the binary each get an isolated set of
//! series. Series for a location only exist after the first successful
//! [`MetricStore::record`] for it; until then the exposition omits them.
//! Series are never removed: `weather_last_updated` is the only staleness signal.

use crate::api::WeatherObservation;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

pub const TEMPERATURE: &str = "weather_temperature";
pub const HUMIDITY: &str = "weather_humidity";
pub const PRESSURE: &str = "weather_pressure";
pub const LAST_UPDATED: &str = "weather_last_updated";

/// Label carried by every series.
pub const LOCATION_LABEL: &str = "location";

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One series value at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub location: String,
    pub value: f64,
}

pub struct MetricStore {
    registry: Registry,
    temperature: GaugeVec,
    humidity: GaugeVec,
    pressure: GaugeVec,
    last_updated: GaugeVec,
}

impl MetricStore {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let temperature = register(&registry, TEMPERATURE, "Outside temperature")?;
        let humidity = register(&registry, HUMIDITY, "Outside humidity in %")?;
        let pressure = register(&registry, PRESSURE, "Outside pressure in hPa")?;
        let last_updated = register(
            &registry,
            LAST_UPDATED,
            "Unix timestamp of the last successful weather update",
        )?;

        Ok(Self {
            registry,
            temperature,
            humidity,
            pressure,
            last_updated,
        })
    }

    /// Set all four series for `location` from one observation.
    ///
    /// Each gauge write is atomic on its own; a concurrent scrape may see the
    /// group half-applied but never a torn value.
    pub fn record(&self, location: &str, obs: &WeatherObservation, updated_at: i64) {
        let labels = [location];
        self.temperature
            .with_label_values(&labels)
            .set(obs.temperature);
        self.humidity
            .with_label_values(&labels)
            .set(f64::from(obs.humidity));
        self.pressure
            .with_label_values(&labels)
            .set(f64::from(obs.pressure));
        self.last_updated
            .with_label_values(&labels)
            .set(updated_at as f64);
    }

    /// Current value of every registered series and label combination.
    pub fn snapshot(&self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for family in self.registry.gather() {
            for metric in family.get_metric() {
                let location = metric
                    .get_label()
                    .iter()
                    .find(|l| l.get_name() == LOCATION_LABEL)
                    .map(|l| l.get_value().to_string())
                    .unwrap_or_default();
                samples.push(Sample {
                    name: family.get_name().to_string(),
                    location,
                    value: metric.get_gauge().get_value(),
                });
            }
        }
        samples
    }

    /// Value of series `name` for `location`, if it has been recorded.
    pub fn value(&self, name: &str, location: &str) -> Option<f64> {
        self.snapshot()
            .into_iter()
            .find(|s| s.name == name && s.location == location)
            .map(|s| s.value)
    }

    /// Text exposition of all series.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn register(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec, MetricsError> {
    let gauge = GaugeVec::new(Opts::new(name, help), &[LOCATION_LABEL])?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}
