use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod monitor;

pub use monitor::{Alert, AlertLevel, AlertObserver, SensorMonitor};

/// The physical quantity a sensor measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Temp,
    Humid,
    Food,
    Water,
    Weight,
}

impl SensorType {
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Temp => "°C",
            SensorType::Humid => "%",
            SensorType::Food => "%",
            SensorType::Water => "%",
            SensorType::Weight => "kg",
        }
    }

    /// Physically plausible value range; the simulator clips to this.
    pub fn plausible_range(&self) -> (f64, f64) {
        match self {
            SensorType::Temp => (-10.0, 50.0),
            SensorType::Humid => (0.0, 100.0),
            SensorType::Food => (0.0, 100.0),
            SensorType::Water => (0.0, 100.0),
            SensorType::Weight => (0.0, 1500.0),
        }
    }

    /// Maximum step magnitude of the simulator's random walk.
    pub fn walk_step(&self) -> f64 {
        match self {
            SensorType::Temp => 1.5,
            SensorType::Humid => 3.0,
            SensorType::Food => 5.0,
            SensorType::Water => 5.0,
            SensorType::Weight => 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorStatus {
    Active,
    Error,
}

/// One reading, append-only per sensor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A sensor with thresholds and a cached last reading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sensor {
    /// Human-facing unique code, e.g. "TEMP-C1".
    pub id: String,
    pub name: String,
    pub sensor_type: SensorType,
    pub unit: String,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub status: SensorStatus,
    pub corral_id: Option<Uuid>,
    /// Cached, derived from the reading stream.
    pub last_reading: Option<f64>,
    /// Consecutive out-of-range readings; drives the ERROR flip.
    pub consecutive_out_of_range: u32,
}

impl Sensor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sensor_type: SensorType,
        min_threshold: f64,
        max_threshold: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sensor_type,
            unit: sensor_type.unit().to_string(),
            min_threshold,
            max_threshold,
            status: SensorStatus::Active,
            corral_id: None,
            last_reading: None,
            consecutive_out_of_range: 0,
        }
    }

    pub fn with_corral(mut self, corral_id: Uuid) -> Self {
        self.corral_id = Some(corral_id);
        self
    }

    pub fn in_range(&self, value: f64) -> bool {
        (self.min_threshold..=self.max_threshold).contains(&value)
    }
}
