use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use granja::config::{load_config, EngineConfig, GranjaConfig};
use granja::engine::FarmEngine;
use granja::feeding::schedule;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "granja=info".into()),
        )
        .init();

    info!("Granja engine starting...");

    let config_path =
        std::env::var("GRANJA_CONFIG").unwrap_or_else(|_| "granja.toml".to_string());
    let config = match load_config(&config_path) {
        Ok(config) => {
            info!(path = %config_path, "Configuration loaded");
            config
        }
        Err(e) => {
            warn!(path = %config_path, error = %e, "Config file unavailable, using defaults");
            GranjaConfig {
                engine: EngineConfig::from_env(),
                ..GranjaConfig::default()
            }
        }
    };

    let engine = Arc::new(FarmEngine::new(config.engine.clone()));
    engine.seed_demo()?;

    let ticker_engine = Arc::clone(&engine);
    let tick_interval = Duration::from_secs(config.schedule.tick_interval_seconds);
    tokio::spawn(async move {
        schedule::run_ticker(ticker_engine, tick_interval).await;
    });

    if config.simulation.enabled {
        let sim_engine = Arc::clone(&engine);
        let sim_interval = Duration::from_secs(config.simulation.interval_seconds);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sim_interval);
            loop {
                interval.tick().await;
                let readings = sim_engine.simulate_readings();
                info!(count = readings.len(), "Simulated sensor readings");
            }
        });
        info!(
            interval_seconds = config.simulation.interval_seconds,
            "Sensor simulation enabled"
        );
    }

    tokio::signal::ctrl_c().await?;
    info!("Granja engine shutting down");
    Ok(())
}
