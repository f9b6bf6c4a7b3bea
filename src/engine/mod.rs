use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

pub mod facade;

#[cfg(test)]
mod tests;

pub use facade::{IntegratedFlowResult, StepReport, StepState};

use crate::adapter::{self, LegacyRecord};
use crate::animal::creation::{self, CreationOutcome, CreationRequest};
use crate::animal::{health, AnimalRecord, AnimalUpdate, CapabilityKind, DecoratorParams, HealthAction};
use crate::config::EngineConfig;
use crate::corral::Corral;
use crate::error::{EngineError, EngineResult};
use crate::feeding::schedule;
use crate::feeding::strategy::{self, FeedingPlan, FeedingStrategy};
use crate::feeding::{
    CommandHistory, CommandHistoryEntry, DailySummary, EfficiencyReport, FeedCommand, FeedingLog,
    FeedingRecord, FeedingSchedule, FoodType,
};
use crate::sensor::{Alert, Sensor, SensorMonitor, SensorReading};

/// A corral snapshot paired with its active alerts.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CorralStatus {
    pub corral: Corral,
    pub alerts: Vec<Alert>,
}

/// The farm engine: owns every aggregate store and exposes the operations
/// consumed by the transport layer.
///
/// Each `DashMap` entry is an independently lockable aggregate. Operations
/// touching a corral and its animals acquire the corral entry first.
pub struct FarmEngine {
    config: EngineConfig,
    animals: DashMap<Uuid, AnimalRecord>,
    /// tag_id -> animal id, enforcing tag uniqueness.
    tags: DashMap<String, Uuid>,
    corrals: DashMap<Uuid, Corral>,
    food_types: DashMap<Uuid, FoodType>,
    schedules: DashMap<Uuid, FeedingSchedule>,
    monitor: SensorMonitor,
    history: CommandHistory,
    feeding_log: FeedingLog,
}

impl FarmEngine {
    pub fn new(config: EngineConfig) -> Self {
        let monitor = SensorMonitor::new(config.sensor_error_threshold, config.readings_window);
        let history = CommandHistory::new(config.history_max_entries);
        let feeding_log = FeedingLog::new(config.feeding_log_max_entries);
        Self {
            config,
            animals: DashMap::new(),
            tags: DashMap::new(),
            corrals: DashMap::new(),
            food_types: DashMap::new(),
            schedules: DashMap::new(),
            monitor,
            history,
            feeding_log,
        }
    }

    pub fn monitor(&self) -> &SensorMonitor {
        &self.monitor
    }

    // --- setup -----------------------------------------------------------

    pub fn register_corral(&self, corral: Corral) -> EngineResult<Corral> {
        corral.validate()?;
        let id = corral.id;
        self.corrals.insert(id, corral.clone());
        info!(corral_id = %id, name = %corral.name, "Corral registered");
        Ok(corral)
    }

    pub fn register_food_type(&self, food_type: FoodType) -> FoodType {
        self.food_types.insert(food_type.id, food_type.clone());
        food_type
    }

    pub fn register_sensor(&self, sensor: Sensor) -> EngineResult<()> {
        self.monitor.add_sensor(sensor)
    }

    fn food_type_by_name(&self, name: &str) -> Option<FoodType> {
        self.food_types
            .iter()
            .find(|ft| ft.name == name)
            .map(|ft| ft.clone())
    }

    // --- animals ---------------------------------------------------------

    /// Creates an animal through one of the three creation protocols. A
    /// farm-family request also registers its food type and, when no corral
    /// was named, a corral built from the family template; both are
    /// registered only once the animal has passed admission.
    pub fn create_animal(&self, request: CreationRequest) -> EngineResult<AnimalRecord> {
        let outcome = creation::create(request)?;
        let (mut record, family) = match outcome {
            CreationOutcome::Single(record) => (record, None),
            CreationOutcome::Family(kit) => (kit.animal.clone(), Some(kit)),
        };

        if self.tags.contains_key(&record.tag_id) {
            return Err(EngineError::validation(format!(
                "tag_id '{}' already exists",
                record.tag_id
            )));
        }

        // Corral entry locked before the animal is inserted; the capacity
        // check runs before any mutation.
        if let Some(corral_id) = record.corral_id {
            let mut corral = self.corrals.get_mut(&corral_id).ok_or_else(|| {
                EngineError::not_found("corral", corral_id.to_string())
            })?;
            if corral.animal_type != record.animal_type {
                return Err(EngineError::validation(format!(
                    "corral '{}' houses {}, not {}",
                    corral.name,
                    corral.animal_type.as_str(),
                    record.animal_type.as_str()
                )));
            }
            corral.assign_animal()?;
        } else if let Some(kit) = &family {
            // Template corral: the slot is claimed before the corral is
            // published, so a failure here registers nothing.
            let mut corral = kit.corral_template.instantiate();
            corral.assign_animal()?;
            let corral = self.register_corral(corral)?;
            record.corral_id = Some(corral.id);
        }

        if let Some(kit) = &family {
            if self.food_type_by_name(&kit.food_type.name).is_none() {
                self.register_food_type(kit.food_type.clone());
            }
        }

        self.tags.insert(record.tag_id.clone(), record.id);
        self.animals.insert(record.id, record.clone());
        info!(
            animal_id = %record.id,
            tag_id = %record.tag_id,
            animal_type = record.animal_type.as_str(),
            "Animal created"
        );
        Ok(record)
    }

    pub fn get_animal(&self, animal_id: Uuid) -> EngineResult<AnimalRecord> {
        self.animals
            .get(&animal_id)
            .map(|a| a.clone())
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))
    }

    pub fn list_animals(&self) -> Vec<AnimalRecord> {
        let mut animals: Vec<AnimalRecord> = self.animals.iter().map(|a| a.clone()).collect();
        animals.sort_by(|a, b| a.tag_id.cmp(&b.tag_id));
        animals
    }

    /// Applies a partial update. Constraint checks run before any field is
    /// written.
    pub fn update_animal(&self, animal_id: Uuid, update: AnimalUpdate) -> EngineResult<AnimalRecord> {
        if let Some(weight) = update.weight {
            if weight <= 0.0 {
                return Err(EngineError::validation(format!(
                    "weight must be positive, got {}",
                    weight
                )));
            }
        }
        let mut animal = self
            .animals
            .get_mut(&animal_id)
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))?;

        if let Some(name) = update.name {
            animal.name = name;
        }
        if let Some(breed) = update.breed {
            animal.breed = breed;
        }
        if let Some(weight) = update.weight {
            animal.weight = weight;
        }
        if let Some(age_months) = update.age_months {
            animal.age_months = age_months;
        }
        if let Some(purpose) = update.purpose {
            animal.purpose = purpose;
        }
        if let Some(production) = update.daily_production {
            animal.daily_production = Some(production);
        }
        if let Some(state) = update.health_state {
            animal.health_state = state;
            // A relapse keeps the consecutive-failed-check count; only a
            // return to SANO clears it.
            if state == crate::animal::HealthState::Sano {
                animal.failed_checks = 0;
            }
        }
        Ok(animal.clone())
    }

    /// Deletes an animal, releasing its corral slot. The slot is released by
    /// the call that actually removes the animal entry, so racing deletes of
    /// the same animal decrement the occupancy count once.
    pub fn delete_animal(&self, animal_id: Uuid) -> EngineResult<AnimalRecord> {
        let corral_id = self
            .animals
            .get(&animal_id)
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))?
            .corral_id;

        // Corral entry first, then the animal entry; the guard is held
        // across the removal.
        let mut corral = corral_id.and_then(|id| self.corrals.get_mut(&id));
        let (_, animal) = self
            .animals
            .remove(&animal_id)
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))?;
        if let Some(corral) = corral.as_mut() {
            corral.remove_animal()?;
        }
        drop(corral);
        self.tags.remove(&animal.tag_id);
        info!(animal_id = %animal_id, tag_id = %animal.tag_id, "Animal deleted");
        Ok(animal)
    }

    /// Applies one capability decorator. Re-applying a kind updates its
    /// parameters without growing the set.
    pub fn apply_decorator(
        &self,
        animal_id: Uuid,
        decorator_name: &str,
        params: DecoratorParams,
    ) -> EngineResult<AnimalRecord> {
        let kind = CapabilityKind::parse(decorator_name)?;
        let capability = params.into_capability(kind)?;
        let mut animal = self
            .animals
            .get_mut(&animal_id)
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))?;
        animal.capabilities.apply(capability);
        info!(
            animal_id = %animal_id,
            decorator = kind.as_str(),
            capabilities = animal.capabilities.len(),
            "Decorator applied"
        );
        Ok(animal.clone())
    }

    /// Detaches one capability. Removal is independent per kind.
    pub fn remove_decorator(&self, animal_id: Uuid, decorator_name: &str) -> EngineResult<AnimalRecord> {
        let kind = CapabilityKind::parse(decorator_name)?;
        let mut animal = self
            .animals
            .get_mut(&animal_id)
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))?;
        if animal.capabilities.remove(kind).is_none() {
            return Err(EngineError::InvalidAction(format!(
                "animal '{}' does not carry decorator '{}'",
                animal_id,
                kind.as_str()
            )));
        }
        Ok(animal.clone())
    }

    /// Runs one health action through the state machine.
    pub fn health_action(&self, animal_id: Uuid, action_name: &str) -> EngineResult<AnimalRecord> {
        let action = HealthAction::parse(action_name)?;
        let mut animal = self
            .animals
            .get_mut(&animal_id)
            .ok_or_else(|| EngineError::not_found("animal", animal_id.to_string()))?;

        let from = animal.health_state;
        let transition = health::apply(
            from,
            action,
            animal.failed_checks,
            self.config.quarantine_check_threshold,
        );
        animal.health_state = transition.state;
        animal.failed_checks = transition.failed_checks;
        animal.last_action_at = Some(Utc::now());
        if action == HealthAction::Feed {
            animal.last_fed_at = animal.last_action_at;
        }
        info!(
            animal_id = %animal_id,
            action = action.as_str(),
            from = from.as_str(),
            to = transition.state.as_str(),
            "Health action applied"
        );
        Ok(animal.clone())
    }

    // --- corrals ---------------------------------------------------------

    pub fn get_corral(&self, corral_id: Uuid) -> EngineResult<Corral> {
        self.corrals
            .get(&corral_id)
            .map(|c| c.clone())
            .ok_or_else(|| EngineError::not_found("corral", corral_id.to_string()))
    }

    pub fn list_corrals(&self) -> Vec<Corral> {
        let mut corrals: Vec<Corral> = self.corrals.iter().map(|c| c.clone()).collect();
        corrals.sort_by(|a, b| a.name.cmp(&b.name));
        corrals
    }

    /// One corral's current state together with its active alerts.
    pub fn corral_status(&self, corral_id: Uuid) -> EngineResult<CorralStatus> {
        let corral = self.get_corral(corral_id)?;
        let alerts = self.monitor.alerts_for_corral(corral_id);
        Ok(CorralStatus { corral, alerts })
    }

    /// Assigns unassigned animals of the corral's species to it, up to
    /// capacity. Returns the ids assigned.
    pub fn assign_pending_animals(&self, corral_id: Uuid) -> EngineResult<Vec<Uuid>> {
        let mut corral = self.corrals.get_mut(&corral_id).ok_or_else(|| {
            EngineError::not_found("corral", corral_id.to_string())
        })?;
        let pending: Vec<Uuid> = self
            .animals
            .iter()
            .filter(|a| a.corral_id.is_none() && a.animal_type == corral.animal_type)
            .map(|a| a.id)
            .collect();

        let mut assigned = Vec::new();
        for animal_id in pending {
            if corral.assign_animal().is_err() {
                break; // full
            }
            match self.animals.get_mut(&animal_id) {
                Some(mut animal) => {
                    animal.corral_id = Some(corral_id);
                    assigned.push(animal_id);
                }
                None => {
                    // Deleted in the meantime; release the claimed slot.
                    let _ = corral.remove_animal();
                }
            }
        }
        if !assigned.is_empty() {
            info!(corral_id = %corral_id, count = assigned.len(), "Pending animals assigned");
        }
        Ok(assigned)
    }

    // --- feeding ---------------------------------------------------------

    /// Dispenses feed to a corral as a reified command, appending the
    /// record and the audit-trail entry.
    pub fn feed_corral(
        &self,
        corral_id: Uuid,
        quantity_kg: f64,
        food_type_id: Option<Uuid>,
    ) -> EngineResult<FeedingRecord> {
        if let Some(food_type_id) = food_type_id {
            if !self.food_types.contains_key(&food_type_id) {
                return Err(EngineError::not_found("food_type", food_type_id.to_string()));
            }
        }
        let command = FeedCommand {
            corral_id,
            food_type_id,
            quantity_kg,
        };
        let record = {
            let mut corral = self.corrals.get_mut(&corral_id).ok_or_else(|| {
                EngineError::not_found("corral", corral_id.to_string())
            })?;
            command.execute(&mut corral)?
        };
        self.history.append(CommandHistoryEntry::from(&record));
        self.feeding_log.append(record.clone());
        Ok(record)
    }

    /// Computes a feeding plan. Pure, no state is touched.
    pub fn feeding_plan(&self, corral_id: Uuid, strategy_name: &str) -> EngineResult<FeedingPlan> {
        let corral = self.get_corral(corral_id)?;
        let strategy = FeedingStrategy::from_name(strategy_name);
        Ok(strategy::plan(&corral, strategy))
    }

    pub fn create_schedule(
        &self,
        corral_id: Uuid,
        food_type_id: Uuid,
        quantity_kg: f64,
        time: NaiveTime,
        strategy_name: &str,
    ) -> EngineResult<FeedingSchedule> {
        if quantity_kg <= 0.0 {
            return Err(EngineError::validation(format!(
                "quantity_kg must be positive, got {}",
                quantity_kg
            )));
        }
        if !self.corrals.contains_key(&corral_id) {
            return Err(EngineError::not_found("corral", corral_id.to_string()));
        }
        if !self.food_types.contains_key(&food_type_id) {
            return Err(EngineError::not_found("food_type", food_type_id.to_string()));
        }
        let schedule = FeedingSchedule {
            id: Uuid::now_v7(),
            corral_id,
            food_type_id,
            quantity_kg,
            time,
            strategy: FeedingStrategy::from_name(strategy_name),
            is_active: true,
            last_fired_minute: None,
            created_at: Utc::now(),
        };
        self.schedules.insert(schedule.id, schedule.clone());
        info!(
            schedule_id = %schedule.id,
            corral_id = %corral_id,
            time = %time,
            strategy = schedule.strategy.as_str(),
            "Feeding schedule created"
        );
        Ok(schedule)
    }

    pub fn set_schedule_active(&self, schedule_id: Uuid, active: bool) -> EngineResult<FeedingSchedule> {
        let mut schedule = self.schedules.get_mut(&schedule_id).ok_or_else(|| {
            EngineError::not_found("schedule", schedule_id.to_string())
        })?;
        schedule.is_active = active;
        Ok(schedule.clone())
    }

    pub fn list_schedules(&self) -> Vec<FeedingSchedule> {
        let mut schedules: Vec<FeedingSchedule> =
            self.schedules.iter().map(|s| s.clone()).collect();
        schedules.sort_by_key(|s| s.time);
        schedules
    }

    /// Fires a schedule immediately. Firing is idempotent per calendar
    /// minute: a second call within the same minute is rejected.
    pub fn execute_schedule_now(&self, schedule_id: Uuid) -> EngineResult<FeedingRecord> {
        self.fire_schedule(schedule_id, Utc::now())
    }

    fn fire_schedule(&self, schedule_id: Uuid, now: DateTime<Utc>) -> EngineResult<FeedingRecord> {
        let key = schedule::minute_key(now);
        let (corral_id, food_type_id, quantity_kg) = {
            let mut entry = self.schedules.get_mut(&schedule_id).ok_or_else(|| {
                EngineError::not_found("schedule", schedule_id.to_string())
            })?;
            if !entry.is_active {
                return Err(EngineError::InvalidAction(format!(
                    "schedule '{}' is inactive",
                    schedule_id
                )));
            }
            if entry.last_fired_minute.as_deref() == Some(key.as_str()) {
                return Err(EngineError::InvalidAction(format!(
                    "schedule '{}' already fired within this minute",
                    schedule_id
                )));
            }
            // Claim the minute under the entry lock before executing.
            entry.last_fired_minute = Some(key);
            (entry.corral_id, entry.food_type_id, entry.quantity_kg)
        };
        self.feed_corral(corral_id, quantity_kg, Some(food_type_id))
    }

    /// Fires every schedule due at `now`. Returns the number fired.
    pub fn fire_due_schedules(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<Uuid> = self
            .schedules
            .iter()
            .filter(|s| schedule::is_due(&s, now))
            .map(|s| s.id)
            .collect();
        let mut fired = 0;
        for schedule_id in due {
            match self.fire_schedule(schedule_id, now) {
                Ok(record) => {
                    fired += 1;
                    info!(schedule_id = %schedule_id, status = ?record.status, "Schedule fired");
                }
                // Lost the claim to a concurrent firing, or deactivated
                Err(EngineError::InvalidAction(_)) => {}
                Err(e) => {
                    warn!(schedule_id = %schedule_id, error = %e, "Schedule firing failed");
                }
            }
        }
        fired
    }

    pub fn list_food_types(&self) -> Vec<FoodType> {
        let mut food_types: Vec<FoodType> = self.food_types.iter().map(|f| f.clone()).collect();
        food_types.sort_by(|a, b| a.name.cmp(&b.name));
        food_types
    }

    pub fn list_feeding_records(&self, limit: usize) -> Vec<FeedingRecord> {
        self.feeding_log.recent(limit)
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        self.feeding_log.daily_summary(date)
    }

    pub fn efficiency_report(&self, from: NaiveDate, to: NaiveDate) -> EfficiencyReport {
        self.feeding_log.efficiency_report(from, to)
    }

    // --- sensors ---------------------------------------------------------

    pub fn add_sensor_reading(&self, sensor_id: &str, value: f64) -> EngineResult<Sensor> {
        self.monitor.add_reading(sensor_id, value)
    }

    pub fn sensor_readings(&self, sensor_id: &str, limit: usize) -> EngineResult<Vec<SensorReading>> {
        self.monitor.recent_readings(sensor_id, limit)
    }

    pub fn get_alerts(&self) -> Vec<Alert> {
        self.monitor.get_alerts()
    }

    pub fn simulate_readings(&self) -> Vec<SensorReading> {
        self.monitor.simulate_readings()
    }

    pub fn list_sensors(&self) -> Vec<Sensor> {
        self.monitor.list_sensors()
    }

    // --- adapter / history -----------------------------------------------

    /// Translates an animal to an external system's record shape without
    /// mutating it.
    pub fn adapter_demo(&self, animal_id: Uuid, external_system: &str) -> EngineResult<LegacyRecord> {
        let animal = self.get_animal(animal_id)?;
        adapter::to_legacy_format(&animal, external_system)
    }

    /// Audit trail of executed commands, newest first.
    pub fn command_history(&self, limit: usize) -> Vec<CommandHistoryEntry> {
        self.history.recent(limit)
    }

    /// Seeds a small demo farm: one corral per species, general feed, a
    /// sensor pair on the cow corral and a morning schedule.
    pub fn seed_demo(&self) -> EngineResult<()> {
        use crate::animal::AnimalType;
        use crate::sensor::SensorType;

        let cow_corral =
            self.register_corral(Corral::new("Corral Norte", AnimalType::Cow, 20))?;
        let pig_corral = self.register_corral(Corral::new("Corral Sur", AnimalType::Pig, 30))?;
        self.register_corral(Corral::new("Gallinero Central", AnimalType::Chicken, 100))?;

        let alfalfa = self.register_food_type(FoodType {
            id: Uuid::now_v7(),
            name: "Alfalfa".to_string(),
            suitable_for: Some(AnimalType::Cow),
        });
        self.register_food_type(FoodType {
            id: Uuid::now_v7(),
            name: "Balanced feed".to_string(),
            suitable_for: None,
        });

        self.register_sensor(
            Sensor::new("TEMP-01", "Termometro Norte", SensorType::Temp, 5.0, 35.0)
                .with_corral(cow_corral.id),
        )?;
        self.register_sensor(
            Sensor::new("FOOD-01", "Silo Norte", SensorType::Food, 20.0, 100.0)
                .with_corral(cow_corral.id),
        )?;

        for name in ["Lola", "Pinta", "Aurora"] {
            self.create_animal(CreationRequest::Factory(
                crate::animal::creation::FactoryRequest {
                    animal_type: AnimalType::Cow,
                    name: Some(name.to_string()),
                    breed: None,
                    weight: None,
                    age_months: None,
                    corral_id: Some(cow_corral.id),
                },
            ))?;
        }
        self.create_animal(CreationRequest::Factory(
            crate::animal::creation::FactoryRequest {
                animal_type: AnimalType::Pig,
                name: Some("Chancho".to_string()),
                breed: None,
                weight: None,
                age_months: None,
                corral_id: Some(pig_corral.id),
            },
        ))?;

        self.create_schedule(
            cow_corral.id,
            alfalfa.id,
            24.0,
            chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            "normal",
        )?;

        info!("Demo farm seeded");
        Ok(())
    }

    /// Clears all stores and logs. Test and demo entry point; history and
    /// alerts are otherwise never removed by normal operation.
    pub fn reset(&self) {
        self.animals.clear();
        self.tags.clear();
        self.corrals.clear();
        self.food_types.clear();
        self.schedules.clear();
        self.monitor.clear();
        self.history.clear();
        self.feeding_log.clear();
        info!("Engine reset");
    }
}

impl Default for FarmEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
