//! Sensor ownership, threshold evaluation and alert fan-out.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::sensor::{Sensor, SensorReading, SensorStatus, SensorType};

/// An alert produced by one threshold evaluation. Generated fresh per
/// evaluation, never mutated.
#[derive(Clone, Debug, Serialize)]
pub struct Alert {
    pub sensor_id: String,
    pub sensor_name: String,
    pub sensor_type: SensorType,
    pub message: String,
    pub level: AlertLevel,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Warning,
    Critical,
}

/// Receives out-of-range alerts synchronously, in registration order.
/// A failing observer must not prevent delivery to the remainder, and
/// observers must not block.
pub trait AlertObserver: Send + Sync {
    fn name(&self) -> &str;
    fn notify(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// Owns per-sensor readings, evaluates thresholds and emits alerts.
pub struct SensorMonitor {
    sensors: DashMap<String, Sensor>,
    readings: DashMap<String, VecDeque<SensorReading>>,
    /// Latest alert per sensor; removed on the next in-range reading.
    current_alerts: DashMap<String, Alert>,
    observers: RwLock<Vec<Box<dyn AlertObserver>>>,
    alert_tx: broadcast::Sender<Alert>,
    /// Consecutive out-of-range readings before a sensor flips to ERROR.
    error_threshold: u32,
    /// Bounded size of each sensor's recent-readings window.
    window: usize,
}

impl SensorMonitor {
    pub fn new(error_threshold: u32, window: usize) -> Self {
        let (alert_tx, _) = broadcast::channel(256);
        Self {
            sensors: DashMap::new(),
            readings: DashMap::new(),
            current_alerts: DashMap::new(),
            observers: RwLock::new(Vec::new()),
            alert_tx,
            error_threshold,
            window,
        }
    }

    /// Registers a sensor. Ids are unique.
    pub fn add_sensor(&self, sensor: Sensor) -> EngineResult<()> {
        if self.sensors.contains_key(&sensor.id) {
            return Err(EngineError::validation(format!(
                "sensor '{}' already registered",
                sensor.id
            )));
        }
        if sensor.min_threshold > sensor.max_threshold {
            return Err(EngineError::validation(format!(
                "sensor '{}': min_threshold above max_threshold",
                sensor.id
            )));
        }
        self.sensors.insert(sensor.id.clone(), sensor);
        Ok(())
    }

    pub fn get_sensor(&self, sensor_id: &str) -> EngineResult<Sensor> {
        self.sensors
            .get(sensor_id)
            .map(|s| s.clone())
            .ok_or_else(|| EngineError::not_found("sensor", sensor_id))
    }

    pub fn list_sensors(&self) -> Vec<Sensor> {
        let mut sensors: Vec<Sensor> = self.sensors.iter().map(|s| s.clone()).collect();
        sensors.sort_by(|a, b| a.id.cmp(&b.id));
        sensors
    }

    /// Registers an observer at the end of the notification order.
    pub fn register_observer(&self, observer: Box<dyn AlertObserver>) {
        self.observers.write().unwrap().push(observer);
    }

    /// Async subscription to the alert stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    /// Ingests one reading: updates the cache and window, evaluates
    /// thresholds, flips sensor status and notifies observers. Returns the
    /// updated sensor.
    pub fn add_reading(&self, sensor_id: &str, value: f64) -> EngineResult<Sensor> {
        let now = Utc::now();
        let (updated, alert) = {
            let mut sensor = self
                .sensors
                .get_mut(sensor_id)
                .ok_or_else(|| EngineError::not_found("sensor", sensor_id))?;

            let reading = SensorReading {
                sensor_id: sensor_id.to_string(),
                value,
                timestamp: now,
            };
            let mut window = self.readings.entry(sensor_id.to_string()).or_default();
            window.push_back(reading);
            while window.len() > self.window {
                window.pop_front();
            }
            drop(window);

            sensor.last_reading = Some(value);

            if sensor.in_range(value) {
                sensor.consecutive_out_of_range = 0;
                if sensor.status == SensorStatus::Error {
                    sensor.status = SensorStatus::Active;
                    info!(sensor_id = %sensor_id, value, "Sensor recovered, back to ACTIVE");
                }
                self.current_alerts.remove(sensor_id);
                (sensor.clone(), None)
            } else {
                sensor.consecutive_out_of_range += 1;
                if sensor.consecutive_out_of_range >= self.error_threshold
                    && sensor.status == SensorStatus::Active
                {
                    sensor.status = SensorStatus::Error;
                    warn!(
                        sensor_id = %sensor_id,
                        consecutive = sensor.consecutive_out_of_range,
                        "Sensor flipped to ERROR"
                    );
                }
                let alert = build_alert(&sensor, value, now);
                self.current_alerts
                    .insert(sensor_id.to_string(), alert.clone());
                (sensor.clone(), Some(alert))
            }
        };

        // Sensor entry released before observer callbacks run.
        if let Some(alert) = alert {
            self.notify_observers(&alert);
            let _ = self.alert_tx.send(alert);
        }

        Ok(updated)
    }

    fn notify_observers(&self, alert: &Alert) {
        let observers = self.observers.read().unwrap();
        for observer in observers.iter() {
            if let Err(e) = observer.notify(alert) {
                warn!(
                    observer = observer.name(),
                    sensor_id = %alert.sensor_id,
                    error = %e,
                    "Alert observer failed, continuing with remainder"
                );
            }
        }
    }

    /// Recent readings for one sensor, newest first, bounded by `limit`.
    pub fn recent_readings(&self, sensor_id: &str, limit: usize) -> EngineResult<Vec<SensorReading>> {
        if !self.sensors.contains_key(sensor_id) {
            return Err(EngineError::not_found("sensor", sensor_id));
        }
        Ok(self
            .readings
            .get(sensor_id)
            .map(|w| w.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    /// Current alerts across all sensors, ordered by sensor id.
    pub fn get_alerts(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.current_alerts.iter().map(|a| a.clone()).collect();
        alerts.sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
        alerts
    }

    /// Current alerts for sensors attached to one corral.
    pub fn alerts_for_corral(&self, corral_id: Uuid) -> Vec<Alert> {
        self.get_alerts()
            .into_iter()
            .filter(|alert| {
                self.sensors
                    .get(&alert.sensor_id)
                    .map(|s| s.corral_id == Some(corral_id))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Generates one synthetic reading per ACTIVE sensor: a bounded random
    /// walk around the last value, clipped to the type's plausible range.
    pub fn simulate_readings(&self) -> Vec<SensorReading> {
        let mut rng = rand::thread_rng();
        let targets: Vec<(String, SensorType, Option<f64>, f64, f64)> = self
            .sensors
            .iter()
            .filter(|s| s.status == SensorStatus::Active)
            .map(|s| {
                (
                    s.id.clone(),
                    s.sensor_type,
                    s.last_reading,
                    s.min_threshold,
                    s.max_threshold,
                )
            })
            .collect();

        let mut produced = Vec::with_capacity(targets.len());
        for (sensor_id, sensor_type, last, min, max) in targets {
            let base = last.unwrap_or_else(|| (min + max) / 2.0);
            let step = sensor_type.walk_step();
            let (lo, hi) = sensor_type.plausible_range();
            let value = (base + rng.gen_range(-step..=step)).clamp(lo, hi);
            if let Ok(sensor) = self.add_reading(&sensor_id, value) {
                produced.push(SensorReading {
                    sensor_id: sensor.id,
                    value,
                    timestamp: Utc::now(),
                });
            }
        }
        produced
    }

    /// Clears sensors, readings and alerts. For engine reset only.
    pub fn clear(&self) {
        self.sensors.clear();
        self.readings.clear();
        self.current_alerts.clear();
    }
}

fn build_alert(sensor: &Sensor, value: f64, timestamp: DateTime<Utc>) -> Alert {
    let span = (sensor.max_threshold - sensor.min_threshold).max(f64::EPSILON);
    let (overshoot, direction) = if value > sensor.max_threshold {
        (value - sensor.max_threshold, "above max threshold")
    } else {
        (sensor.min_threshold - value, "below min threshold")
    };
    let level = if overshoot > 0.2 * span {
        AlertLevel::Critical
    } else {
        AlertLevel::Warning
    };
    let bound = if value > sensor.max_threshold {
        sensor.max_threshold
    } else {
        sensor.min_threshold
    };
    Alert {
        sensor_id: sensor.id.clone(),
        sensor_name: sensor.name.clone(),
        sensor_type: sensor.sensor_type,
        message: format!(
            "{}: reading {:.1} {} {} {:.1} {}",
            sensor.name, value, sensor.unit, direction, bound, sensor.unit
        ),
        level,
        value,
        timestamp,
    }
}
