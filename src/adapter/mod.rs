//! One-way translation from internal animal records to external legacy
//! schemas. Read-only: the source record is never mutated.

use serde::{Deserialize, Serialize};

use crate::animal::{AnimalRecord, AnimalType, HealthState};
use crate::error::{EngineError, EngineResult};

/// External systems the adapter can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalSystem {
    LegacyFarm,
}

impl ExternalSystem {
    /// Resolves a target identifier; unknown targets are unsupported.
    pub fn parse(name: &str) -> EngineResult<Self> {
        match name {
            "LEGACY_FARM" => Ok(ExternalSystem::LegacyFarm),
            other => Err(EngineError::UnsupportedTarget(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalSystem::LegacyFarm => "LEGACY_FARM",
        }
    }
}

/// The LEGACY_FARM record shape: imperial weight, yearly age, one-letter
/// species and status codes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub system: String,
    /// The internal tag_id.
    pub animal_code: String,
    /// "BOV", "POR" or "AVI".
    pub species_code: String,
    pub description: String,
    pub weight_lbs: f64,
    pub age_years: f64,
    /// "H" healthy, "S" sick, "T" treatment, "Q" quarantine.
    pub status_flag: String,
}

const KG_TO_LBS: f64 = 2.20462;

fn species_code(animal_type: AnimalType) -> &'static str {
    match animal_type {
        AnimalType::Cow => "BOV",
        AnimalType::Pig => "POR",
        AnimalType::Chicken => "AVI",
    }
}

fn status_flag(state: HealthState) -> &'static str {
    match state {
        HealthState::Sano => "H",
        HealthState::Enfermo => "S",
        HealthState::EnTratamiento => "T",
        HealthState::Cuarentena => "Q",
    }
}

/// Maps an animal to the target system's record shape.
pub fn to_legacy_format(animal: &AnimalRecord, external_system: &str) -> EngineResult<LegacyRecord> {
    let system = ExternalSystem::parse(external_system)?;
    match system {
        ExternalSystem::LegacyFarm => Ok(LegacyRecord {
            system: system.as_str().to_string(),
            animal_code: animal.tag_id.clone(),
            species_code: species_code(animal.animal_type).to_string(),
            description: format!("{} ({})", animal.name, animal.breed),
            weight_lbs: animal.weight * KG_TO_LBS,
            age_years: f64::from(animal.age_months) / 12.0,
            status_flag: status_flag(animal.health_state).to_string(),
        }),
    }
}

/// Reverses the mapping where it is defined: recovers the identity and
/// type fields from a legacy record.
pub fn legacy_identity(record: &LegacyRecord) -> EngineResult<(String, AnimalType)> {
    let animal_type = match record.species_code.as_str() {
        "BOV" => AnimalType::Cow,
        "POR" => AnimalType::Pig,
        "AVI" => AnimalType::Chicken,
        other => {
            return Err(EngineError::validation(format!(
                "unknown legacy species code '{}'",
                other
            )))
        }
    };
    Ok((record.animal_code.clone(), animal_type))
}
