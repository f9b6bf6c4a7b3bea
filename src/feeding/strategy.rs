//! Feeding strategies as pure functions of corral occupancy and species.
//! No I/O, deterministic given the corral snapshot.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::animal::AnimalType;
use crate::corral::Corral;

/// Named feeding policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedingStrategy {
    Normal,
    Winter,
    Summer,
    Intensive,
    Saving,
    Growth,
    Maintenance,
    Production,
}

impl FeedingStrategy {
    /// Resolves a strategy name. Unknown names fall back to `normal`
    /// (logged, not surfaced as an error).
    pub fn from_name(name: &str) -> Self {
        match name {
            "normal" => FeedingStrategy::Normal,
            "winter" => FeedingStrategy::Winter,
            "summer" => FeedingStrategy::Summer,
            "intensive" => FeedingStrategy::Intensive,
            "saving" => FeedingStrategy::Saving,
            "growth" => FeedingStrategy::Growth,
            "maintenance" => FeedingStrategy::Maintenance,
            "production" => FeedingStrategy::Production,
            other => {
                warn!(strategy = %other, "Unknown feeding strategy, falling back to 'normal'");
                FeedingStrategy::Normal
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedingStrategy::Normal => "normal",
            FeedingStrategy::Winter => "winter",
            FeedingStrategy::Summer => "summer",
            FeedingStrategy::Intensive => "intensive",
            FeedingStrategy::Saving => "saving",
            FeedingStrategy::Growth => "growth",
            FeedingStrategy::Maintenance => "maintenance",
            FeedingStrategy::Production => "production",
        }
    }

    /// Ration multiplier over the `normal` baseline.
    fn multiplier(&self) -> f64 {
        match self {
            FeedingStrategy::Normal => 1.0,
            FeedingStrategy::Winter => 1.30,
            FeedingStrategy::Summer => 0.90,
            FeedingStrategy::Intensive => 1.50,
            FeedingStrategy::Saving => 0.70,
            FeedingStrategy::Growth => 1.25,
            FeedingStrategy::Maintenance => 0.85,
            FeedingStrategy::Production => 1.40,
        }
    }

    /// Suggested dispensation times for the day.
    fn schedule_hint(&self) -> &'static str {
        match self {
            FeedingStrategy::Normal => "07:00,17:00",
            FeedingStrategy::Winter => "08:00,16:00",
            FeedingStrategy::Summer => "06:00,19:00",
            FeedingStrategy::Intensive => "06:00,12:00,18:00",
            FeedingStrategy::Saving => "08:00",
            FeedingStrategy::Growth => "06:00,12:00,18:00",
            FeedingStrategy::Maintenance => "07:00",
            FeedingStrategy::Production => "05:00,13:00,19:00",
        }
    }
}

/// Baseline daily ration per head in kg.
fn base_ration_kg(animal_type: AnimalType) -> f64 {
    match animal_type {
        AnimalType::Cow => 8.0,
        AnimalType::Pig => 3.0,
        AnimalType::Chicken => 0.12,
    }
}

/// A computed feeding plan: total quantity and timing hint.
#[derive(Clone, Debug, Serialize)]
pub struct FeedingPlan {
    pub strategy: FeedingStrategy,
    pub quantity_kg: f64,
    pub per_animal_kg: f64,
    pub schedule_hint: String,
    pub animal_count: u32,
}

/// Computes the plan for a corral snapshot. Quantity scales with current
/// occupancy; an empty corral plans zero.
pub fn plan(corral: &Corral, strategy: FeedingStrategy) -> FeedingPlan {
    let per_animal = base_ration_kg(corral.animal_type) * strategy.multiplier();
    let quantity = per_animal * f64::from(corral.current_animal_count);
    FeedingPlan {
        strategy,
        quantity_kg: round2(quantity),
        per_animal_kg: round2(per_animal),
        schedule_hint: strategy.schedule_hint().to_string(),
        animal_count: corral.current_animal_count,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
