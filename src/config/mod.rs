use serde::Deserialize;

/// Complete granja configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GranjaConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Core engine tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Consecutive out-of-range readings before a sensor flips to ERROR.
    #[serde(default = "default_sensor_error_threshold")]
    pub sensor_error_threshold: u32,
    /// Consecutive failed health checks before `check` forces CUARENTENA.
    #[serde(default = "default_quarantine_check_threshold")]
    pub quarantine_check_threshold: u32,
    /// Bounded retention of the command history append log.
    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,
    /// Bounded retention of the feeding record log.
    #[serde(default = "default_feeding_log_max_entries")]
    pub feeding_log_max_entries: usize,
    /// Bounded size of each sensor's recent-readings window.
    #[serde(default = "default_readings_window")]
    pub readings_window: usize,
}

fn default_sensor_error_threshold() -> u32 {
    3
}

fn default_quarantine_check_threshold() -> u32 {
    2
}

fn default_history_max_entries() -> usize {
    1000
}

fn default_feeding_log_max_entries() -> usize {
    1000
}

fn default_readings_window() -> usize {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sensor_error_threshold: default_sensor_error_threshold(),
            quarantine_check_threshold: default_quarantine_check_threshold(),
            history_max_entries: default_history_max_entries(),
            feeding_log_max_entries: default_feeding_log_max_entries(),
            readings_window: default_readings_window(),
        }
    }
}

impl EngineConfig {
    /// Builds from env vars, falling back to defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("GRANJA_SENSOR_ERROR_THRESHOLD") {
            if let Ok(n) = v.parse::<u32>() {
                cfg.sensor_error_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("GRANJA_QUARANTINE_CHECK_THRESHOLD") {
            if let Ok(n) = v.parse::<u32>() {
                cfg.quarantine_check_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("GRANJA_HISTORY_MAX_ENTRIES") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.history_max_entries = n;
            }
        }

        cfg
    }
}

/// Feeding schedule ticker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,
}

fn default_tick_interval_seconds() -> u64 {
    15
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: default_tick_interval_seconds(),
        }
    }
}

/// Synthetic sensor reading loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_simulation_interval_seconds")]
    pub interval_seconds: u64,
}

fn default_simulation_interval_seconds() -> u64 {
    30
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_simulation_interval_seconds(),
        }
    }
}

impl Default for GranjaConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            schedule: ScheduleConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Load configuration from TOML file.
pub fn load_config(path: &str) -> Result<GranjaConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: GranjaConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GranjaConfig::default();
        assert_eq!(config.engine.sensor_error_threshold, 3);
        assert_eq!(config.engine.quarantine_check_threshold, 2);
        assert_eq!(config.engine.history_max_entries, 1000);
        assert_eq!(config.schedule.tick_interval_seconds, 15);
        assert!(!config.simulation.enabled);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [engine]
            sensor_error_threshold = 5
            quarantine_check_threshold = 3
            history_max_entries = 200
            readings_window = 20

            [schedule]
            tick_interval_seconds = 5

            [simulation]
            enabled = true
            interval_seconds = 10
        "#;

        let config: GranjaConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.sensor_error_threshold, 5);
        assert_eq!(config.engine.readings_window, 20);
        assert_eq!(config.schedule.tick_interval_seconds, 5);
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.interval_seconds, 10);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections use defaults
        let toml = r#"
            [engine]
            sensor_error_threshold = 4
        "#;

        let config: GranjaConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.sensor_error_threshold, 4);
        assert_eq!(config.engine.readings_window, 50); // Default
        assert_eq!(config.schedule.tick_interval_seconds, 15); // Default
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nhistory_max_entries = 42").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.engine.history_max_entries, 42);
    }
}
