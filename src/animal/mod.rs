use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod capability;
pub mod creation;
pub mod health;

pub use capability::{Capability, CapabilityKind, CapabilitySet, DecoratorParams};
pub use creation::{BuilderPreset, CreationRequest, FarmFamilyKit, FarmType};
pub use health::{HealthAction, HealthState};

use crate::error::{EngineError, EngineResult};

/// Species handled by the farm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimalType {
    Cow,
    Pig,
    Chicken,
}

impl AnimalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalType::Cow => "COW",
            AnimalType::Pig => "PIG",
            AnimalType::Chicken => "CHICKEN",
        }
    }

    /// Default purpose assigned by the type-keyed factory.
    pub fn default_purpose(&self) -> &'static str {
        match self {
            AnimalType::Cow => "milk",
            AnimalType::Pig => "meat",
            AnimalType::Chicken => "eggs",
        }
    }

    /// Tag prefix used when generating tag ids.
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            AnimalType::Cow => "COW",
            AnimalType::Pig => "PIG",
            AnimalType::Chicken => "CHK",
        }
    }

    /// Typical adult weight in kg, used as the factory default.
    pub fn default_weight_kg(&self) -> f64 {
        match self {
            AnimalType::Cow => 450.0,
            AnimalType::Pig => 90.0,
            AnimalType::Chicken => 2.5,
        }
    }
}

/// An animal's identity, biological attributes and current health state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalRecord {
    pub id: Uuid,
    /// Human-facing unique tag, e.g. "COW-018f3a".
    pub tag_id: String,
    pub animal_type: AnimalType,
    pub name: String,
    pub breed: String,
    /// Kilograms, strictly positive.
    pub weight: f64,
    pub age_months: u32,
    pub health_state: HealthState,
    pub purpose: String,
    pub daily_production: Option<String>,
    pub corral_id: Option<Uuid>,
    pub capabilities: CapabilitySet,
    /// Consecutive failed health checks, drives the quarantine condition.
    pub failed_checks: u32,
    pub last_action_at: Option<DateTime<Utc>>,
    pub last_fed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AnimalRecord {
    /// Checks the record invariants shared by every creation protocol.
    pub fn validate(&self) -> EngineResult<()> {
        if self.tag_id.is_empty() {
            return Err(EngineError::validation("tag_id must not be empty"));
        }
        if self.name.is_empty() {
            return Err(EngineError::validation("name must not be empty"));
        }
        if self.weight <= 0.0 {
            return Err(EngineError::validation(format!(
                "weight must be positive, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

/// Partial update applied to an existing animal. `None` fields are left
/// untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnimalUpdate {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<f64>,
    pub age_months: Option<u32>,
    pub purpose: Option<String>,
    pub daily_production: Option<String>,
    pub health_state: Option<HealthState>,
}

/// Generates a short time-ordered tag id for a species.
pub fn generate_tag_id(animal_type: AnimalType) -> String {
    let id = Uuid::now_v7().simple().to_string();
    format!("{}-{}", animal_type.tag_prefix(), &id[id.len() - 6..])
}
