use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::animal::AnimalType;
use crate::error::{EngineError, EngineResult};
use crate::feeding::strategy::FeedingStrategy;

/// A corral's environmental and resource state. `food_level` and
/// `water_level` are percentages of the corral's stock capacity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceLevels {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Feed stock, 0..=100.
    pub food_level: f64,
    /// Water stock, 0..=100.
    pub water_level: f64,
}

impl ResourceLevels {
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=100.0).contains(&self.food_level) {
            return Err(EngineError::validation(format!(
                "food_level must be within 0..=100, got {}",
                self.food_level
            )));
        }
        if !(0.0..=100.0).contains(&self.water_level) {
            return Err(EngineError::validation(format!(
                "water_level must be within 0..=100, got {}",
                self.water_level
            )));
        }
        Ok(())
    }
}

impl Default for ResourceLevels {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            humidity: 55.0,
            food_level: 80.0,
            water_level: 90.0,
        }
    }
}

/// An independently lockable corral aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Corral {
    pub id: Uuid,
    pub name: String,
    pub animal_type: AnimalType,
    pub location: String,
    /// Maximum number of animals, strictly positive.
    pub capacity: u32,
    /// Invariant: 0 <= current_animal_count <= capacity.
    pub current_animal_count: u32,
    pub resources: ResourceLevels,
    /// Kilograms of feed stock held at food_level == 100.
    pub food_capacity_kg: f64,
    /// Strategy the facade uses when planning for this corral.
    pub feeding_strategy: FeedingStrategy,
    pub last_updated: DateTime<Utc>,
}

impl Corral {
    pub fn new(name: impl Into<String>, animal_type: AnimalType, capacity: u32) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            animal_type,
            location: String::new(),
            capacity,
            current_animal_count: 0,
            resources: ResourceLevels::default(),
            food_capacity_kg: 100.0,
            feeding_strategy: FeedingStrategy::Normal,
            last_updated: Utc::now(),
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.capacity == 0 {
            return Err(EngineError::validation("capacity must be positive"));
        }
        if self.current_animal_count > self.capacity {
            return Err(EngineError::validation(format!(
                "corral '{}' over capacity: {}/{}",
                self.name, self.current_animal_count, self.capacity
            )));
        }
        if self.food_capacity_kg <= 0.0 {
            return Err(EngineError::validation(
                "food_capacity_kg must be positive",
            ));
        }
        self.resources.validate()
    }

    /// Claims one occupancy slot, enforcing the capacity invariant before
    /// any mutation.
    pub fn assign_animal(&mut self) -> EngineResult<()> {
        if self.current_animal_count >= self.capacity {
            return Err(EngineError::validation(format!(
                "corral '{}' is full ({}/{})",
                self.name, self.current_animal_count, self.capacity
            )));
        }
        self.current_animal_count += 1;
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Releases one occupancy slot.
    pub fn remove_animal(&mut self) -> EngineResult<()> {
        if self.current_animal_count == 0 {
            return Err(EngineError::validation(format!(
                "corral '{}' has no animals to remove",
                self.name
            )));
        }
        self.current_animal_count -= 1;
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Kilograms of feed currently in stock.
    pub fn available_food_kg(&self) -> f64 {
        self.resources.food_level / 100.0 * self.food_capacity_kg
    }

    /// Consumes up to `quantity_kg` of feed stock and returns the amount
    /// actually dispensed.
    pub fn consume_food_kg(&mut self, quantity_kg: f64) -> f64 {
        let available = self.available_food_kg();
        let dispensed = quantity_kg.min(available);
        if dispensed > 0.0 {
            self.resources.food_level =
                ((available - dispensed) / self.food_capacity_kg * 100.0).max(0.0);
            self.last_updated = Utc::now();
        }
        dispensed
    }
}

/// Blueprint for a corral, produced by the farm-family abstract factory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorralTemplate {
    pub name: String,
    pub animal_type: AnimalType,
    pub location: String,
    pub capacity: u32,
}

impl CorralTemplate {
    pub fn instantiate(&self) -> Corral {
        let mut corral = Corral::new(self.name.clone(), self.animal_type, self.capacity);
        corral.location = self.location.clone();
        corral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_stays_within_capacity() {
        let mut corral = Corral::new("C1", AnimalType::Pig, 2);
        corral.assign_animal().unwrap();
        corral.assign_animal().unwrap();
        assert!(corral.assign_animal().is_err());
        assert_eq!(corral.current_animal_count, 2);

        corral.remove_animal().unwrap();
        corral.remove_animal().unwrap();
        assert!(corral.remove_animal().is_err());
        assert_eq!(corral.current_animal_count, 0);
    }

    #[test]
    fn consume_food_is_bounded_by_stock() {
        let mut corral = Corral::new("C2", AnimalType::Cow, 10);
        corral.food_capacity_kg = 100.0;
        corral.resources.food_level = 30.0; // 30 kg available

        let dispensed = corral.consume_food_kg(50.0);
        assert_eq!(dispensed, 30.0);
        assert!(corral.resources.food_level.abs() < 1e-9);

        assert_eq!(corral.consume_food_kg(10.0), 0.0);
    }

    #[test]
    fn consume_food_decrements_level_proportionally() {
        let mut corral = Corral::new("C3", AnimalType::Cow, 10);
        corral.food_capacity_kg = 200.0;
        corral.resources.food_level = 50.0; // 100 kg available

        let dispensed = corral.consume_food_kg(40.0);
        assert_eq!(dispensed, 40.0);
        assert!((corral.resources.food_level - 30.0).abs() < 1e-9);
    }

    #[test]
    fn resource_levels_are_bounded() {
        let mut levels = ResourceLevels::default();
        levels.food_level = 130.0;
        assert!(levels.validate().is_err());
        levels.food_level = 60.0;
        levels.water_level = -5.0;
        assert!(levels.validate().is_err());
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let corral = Corral::new("C4", AnimalType::Chicken, 0);
        assert!(corral.validate().is_err());
    }

    #[test]
    fn template_instantiates_matching_corral() {
        let template = CorralTemplate {
            name: "Layer house".to_string(),
            animal_type: AnimalType::Chicken,
            location: "South shed".to_string(),
            capacity: 100,
        };
        let corral = template.instantiate();
        assert_eq!(corral.animal_type, AnimalType::Chicken);
        assert_eq!(corral.capacity, 100);
        assert_eq!(corral.current_animal_count, 0);
    }
}
