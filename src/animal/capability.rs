use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The capability families an animal can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Vaccine,
    Gps,
    HealthMonitor,
    Breeder,
}

impl CapabilityKind {
    pub fn parse(name: &str) -> EngineResult<Self> {
        match name {
            "vaccine" => Ok(CapabilityKind::Vaccine),
            "gps" => Ok(CapabilityKind::Gps),
            "health_monitor" => Ok(CapabilityKind::HealthMonitor),
            "breeder" => Ok(CapabilityKind::Breeder),
            other => Err(EngineError::validation(format!(
                "unknown decorator '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Vaccine => "vaccine",
            CapabilityKind::Gps => "gps",
            CapabilityKind::HealthMonitor => "health_monitor",
            CapabilityKind::Breeder => "breeder",
        }
    }
}

/// One applied capability with its typed parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability {
    Vaccine { vaccine_name: String },
    Gps { gps_device_id: String },
    HealthMonitor { sensor_id: String },
    Breeder { genetic_quality: String },
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Vaccine { .. } => CapabilityKind::Vaccine,
            Capability::Gps { .. } => CapabilityKind::Gps,
            Capability::HealthMonitor { .. } => CapabilityKind::HealthMonitor,
            Capability::Breeder { .. } => CapabilityKind::Breeder,
        }
    }
}

/// Parameters supplied alongside a decorator application. Each capability
/// kind requires exactly one of these fields.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DecoratorParams {
    pub vaccine_name: Option<String>,
    pub gps_device_id: Option<String>,
    pub sensor_id: Option<String>,
    pub genetic_quality: Option<String>,
}

impl DecoratorParams {
    /// Builds the typed capability for `kind`, rejecting a missing
    /// required parameter.
    pub fn into_capability(self, kind: CapabilityKind) -> EngineResult<Capability> {
        let missing = |field: &str| {
            EngineError::validation(format!(
                "decorator '{}' requires parameter '{}'",
                kind.as_str(),
                field
            ))
        };
        match kind {
            CapabilityKind::Vaccine => Ok(Capability::Vaccine {
                vaccine_name: self.vaccine_name.ok_or_else(|| missing("vaccine_name"))?,
            }),
            CapabilityKind::Gps => Ok(Capability::Gps {
                gps_device_id: self.gps_device_id.ok_or_else(|| missing("gps_device_id"))?,
            }),
            CapabilityKind::HealthMonitor => Ok(Capability::HealthMonitor {
                sensor_id: self.sensor_id.ok_or_else(|| missing("sensor_id"))?,
            }),
            CapabilityKind::Breeder => Ok(Capability::Breeder {
                genetic_quality: self.genetic_quality.ok_or_else(|| missing("genetic_quality"))?,
            }),
        }
    }
}

/// Insertion-ordered set of capabilities attached to an animal.
///
/// Re-applying a kind updates its parameters in place ("last applied wins")
/// without growing the set; membership checks are O(1).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySet {
    order: Vec<CapabilityKind>,
    params: HashMap<CapabilityKind, Capability>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a capability, preserving first-application order.
    pub fn apply(&mut self, capability: Capability) {
        let kind = capability.kind();
        if self.params.insert(kind, capability).is_none() {
            self.order.push(kind);
        }
    }

    pub fn has(&self, kind: CapabilityKind) -> bool {
        self.params.contains_key(&kind)
    }

    pub fn get(&self, kind: CapabilityKind) -> Option<&Capability> {
        self.params.get(&kind)
    }

    /// Removes one capability; each application is independently reversible.
    pub fn remove(&mut self, kind: CapabilityKind) -> Option<Capability> {
        let removed = self.params.remove(&kind);
        if removed.is_some() {
            self.order.retain(|k| *k != kind);
        }
        removed
    }

    /// Kinds in first-application order.
    pub fn applied(&self) -> &[CapabilityKind] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
