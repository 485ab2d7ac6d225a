use argh::FromArgs;
use std::sync::Arc;
use weather_exporter::{
    config::{Config, Overrides},
    http_server, MetricStore, OpenWeatherClient, Poller,
};

#[derive(FromArgs)]
/// OpenWeatherMap exporter for Prometheus
#[argh(note = "Required environment: LAT, LON, UNITS, CITY, OPENWEATHER_API_KEY, PORT")]
struct Args {
    /// weather API endpoint (overrides OPENWEATHER_API_URL)
    #[argh(option)]
    api_url: Option<String>,

    /// per-request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[argh(option)]
    timeout_secs: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    log::info!("Starting weather-exporter");

    // Flags are applied before validation so a valid flag masks a bad env value
    let overrides = Overrides {
        api_url: args.api_url,
        timeout_secs: args.timeout_secs,
    };

    // Startup errors are fatal before anything binds or polls
    let config = match Config::from_env_with(&overrides) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Using location '{}' ({:.4}, {:.4}), units: {}",
        config.location,
        config.latitude,
        config.longitude,
        config.units
    );

    let store = match MetricStore::new() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            log::error!("Failed to register metrics: {}", e);
            std::process::exit(1);
        }
    };

    let client = match OpenWeatherClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to create weather client: {}", e);
            std::process::exit(1);
        }
    };

    let listener = match http_server::bind(config.port).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind port {}: {}", config.port, e);
            std::process::exit(1);
        }
    };

    // Create shutdown channel
    let shutdown_tx = tokio::sync::watch::Sender::new(());

    // Set up Ctrl+C / SIGTERM handler
    {
        let shutdown_tx = shutdown_tx.clone();
        ctrlc::set_handler(move || {
            log::info!("Received shutdown signal, stopping poller and HTTP server...");
            let _ = shutdown_tx.send(());
        })?;
    }

    let poller = Poller::new(client, store.clone(), config.location.clone());
    let poller_task = tokio::spawn(poller.run(shutdown_tx.subscribe()));

    http_server::serve(listener, store, shutdown_tx.subscribe()).await?;

    // Server only returns on shutdown or error; make sure the poller stops too
    let _ = shutdown_tx.send(());
    if let Err(e) = poller_task.await {
        log::warn!("Poller task for '{}' ended abnormally: {}", config.location, e);
    }

    log::info!("weather-exporter stopped");

    Ok(())
}
