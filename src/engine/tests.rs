use super::*;
use crate::animal::creation::{BuilderRequest, FactoryRequest, FarmFamilyRequest};
use crate::animal::{AnimalType, BuilderPreset, FarmType, HealthState};
use crate::feeding::FeedStatus;
use chrono::NaiveTime;

fn factory_request(animal_type: AnimalType, name: &str, corral_id: Option<Uuid>) -> CreationRequest {
    CreationRequest::Factory(FactoryRequest {
        animal_type,
        name: Some(name.to_string()),
        breed: None,
        weight: None,
        age_months: None,
        corral_id,
    })
}

fn engine_with_cow_corral(capacity: u32) -> (FarmEngine, Uuid) {
    let engine = FarmEngine::default();
    let corral = engine
        .register_corral(Corral::new("Corral Norte", AnimalType::Cow, capacity))
        .unwrap();
    (engine, corral.id)
}

#[test]
fn factory_creation_fills_species_defaults() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let cow = engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    assert_eq!(cow.breed, "Holstein");
    assert_eq!(cow.purpose, "milk");
    assert!(cow.tag_id.starts_with("COW-"));
    assert_eq!(engine.get_corral(corral_id).unwrap().current_animal_count, 1);
}

#[test]
fn full_corral_rejects_another_animal_without_mutation() {
    let (engine, corral_id) = engine_with_cow_corral(2);
    for name in ["Lola", "Pinta"] {
        engine
            .create_animal(factory_request(AnimalType::Cow, name, Some(corral_id)))
            .unwrap();
    }

    let err = engine
        .create_animal(factory_request(AnimalType::Cow, "Mancha", Some(corral_id)))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(engine.list_animals().len(), 2);
    assert_eq!(engine.get_corral(corral_id).unwrap().current_animal_count, 2);
}

#[test]
fn species_mismatch_is_rejected() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let err = engine
        .create_animal(factory_request(AnimalType::Pig, "Chancho", Some(corral_id)))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(engine.get_corral(corral_id).unwrap().current_animal_count, 0);
}

#[test]
fn builder_preset_creates_premium_dairy() {
    let engine = FarmEngine::default();
    let cow = engine
        .create_animal(CreationRequest::Builder(BuilderRequest {
            preset: Some(BuilderPreset::PremiumDairy),
            name: Some("Margarita".to_string()),
            ..Default::default()
        }))
        .unwrap();
    assert_eq!(cow.animal_type, AnimalType::Cow);
    assert_eq!(cow.breed, "Holstein Premium");
    assert_eq!(cow.daily_production.as_deref(), Some("30L milk/day"));
}

#[test]
fn builder_without_required_attributes_fails() {
    let engine = FarmEngine::default();
    let err = engine
        .create_animal(CreationRequest::Builder(BuilderRequest {
            animal_type: Some(AnimalType::Pig),
            name: Some("Chancho".to_string()),
            ..Default::default()
        }))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.list_animals().is_empty());
}

#[test]
fn farm_family_registers_corral_and_food_type() {
    let engine = FarmEngine::default();
    let animal = engine
        .create_animal(CreationRequest::FarmFamily(FarmFamilyRequest {
            farm_type: FarmType::Dairy,
            name: Some("Aurora".to_string()),
            corral_id: None,
        }))
        .unwrap();
    assert_eq!(animal.animal_type, AnimalType::Cow);
    let corral_id = animal.corral_id.expect("family creates a corral");
    assert_eq!(engine.get_corral(corral_id).unwrap().current_animal_count, 1);
    assert_eq!(engine.list_food_types().len(), 1);
}

#[test]
fn decorator_reapplication_updates_in_place() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let cow = engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();

    let params = |name: &str| DecoratorParams {
        vaccine_name: Some(name.to_string()),
        gps_device_id: None,
        sensor_id: None,
        genetic_quality: None,
    };
    engine.apply_decorator(cow.id, "vaccine", params("aftosa")).unwrap();
    let updated = engine
        .apply_decorator(cow.id, "vaccine", params("brucelosis"))
        .unwrap();
    assert_eq!(updated.capabilities.len(), 1);

    let err = engine
        .apply_decorator(cow.id, "jetpack", params("x"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Removal is independent per kind.
    let removed = engine.remove_decorator(cow.id, "vaccine").unwrap();
    assert!(removed.capabilities.is_empty());
    assert!(engine.remove_decorator(cow.id, "vaccine").is_err());
}

#[test]
fn corral_status_pairs_corral_with_its_alerts() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    engine
        .register_sensor(
            Sensor::new(
                "TEMP-09",
                "Termometro",
                crate::sensor::SensorType::Temp,
                5.0,
                30.0,
            )
            .with_corral(corral_id),
        )
        .unwrap();
    engine.add_sensor_reading("TEMP-09", 40.0).unwrap();

    let status = engine.corral_status(corral_id).unwrap();
    assert_eq!(status.corral.id, corral_id);
    assert_eq!(status.alerts.len(), 1);
    assert!(engine.corral_status(Uuid::now_v7()).is_err());
}

#[test]
fn two_failed_checks_quarantine_and_check_releases() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let cow = engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    engine
        .update_animal(
            cow.id,
            AnimalUpdate {
                health_state: Some(HealthState::Enfermo),
                ..Default::default()
            },
        )
        .unwrap();

    let after_first = engine.health_action(cow.id, "check").unwrap();
    assert_eq!(after_first.health_state, HealthState::EnTratamiento);
    assert_eq!(after_first.failed_checks, 1);

    // Relapse keeps the consecutive-failed-check count.
    engine
        .update_animal(
            cow.id,
            AnimalUpdate {
                health_state: Some(HealthState::Enfermo),
                ..Default::default()
            },
        )
        .unwrap();
    let quarantined = engine.health_action(cow.id, "check").unwrap();
    assert_eq!(quarantined.health_state, HealthState::Cuarentena);

    // Only a check releases quarantine.
    let fed = engine.health_action(cow.id, "feed").unwrap();
    assert_eq!(fed.health_state, HealthState::Cuarentena);
    let released = engine.health_action(cow.id, "check").unwrap();
    assert_eq!(released.health_state, HealthState::Sano);
    assert_eq!(released.failed_checks, 0);

    let err = engine.health_action(cow.id, "teleport").unwrap_err();
    assert!(matches!(err, EngineError::InvalidAction(_)));
}

#[test]
fn vaccinate_moves_sick_animal_into_treatment() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let cow = engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    engine
        .update_animal(
            cow.id,
            AnimalUpdate {
                health_state: Some(HealthState::Enfermo),
                ..Default::default()
            },
        )
        .unwrap();
    let treated = engine.health_action(cow.id, "vaccinate").unwrap();
    assert_eq!(treated.health_state, HealthState::EnTratamiento);
    assert!(treated.last_action_at.is_some());
}

#[test]
fn partial_dispensation_is_recorded_and_audited() {
    let engine = FarmEngine::default();
    let mut corral = Corral::new("Corral Sur", AnimalType::Cow, 10);
    corral.resources.food_level = 30.0; // 30 kg of the 100 kg silo
    let corral = engine.register_corral(corral).unwrap();
    for name in ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"] {
        engine
            .create_animal(factory_request(AnimalType::Cow, name, Some(corral.id)))
            .unwrap();
    }

    let record = engine.feed_corral(corral.id, 50.0, None).unwrap();
    assert_eq!(record.status, FeedStatus::Partial);
    assert!((record.quantity_kg - 30.0).abs() < 1e-9);
    assert!((record.shortfall_kg - 20.0).abs() < 1e-9);
    assert_eq!(record.animals_fed, 6);

    let history = engine.command_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, FeedStatus::Partial);
    assert_eq!(engine.list_feeding_records(10).len(), 1);
}

#[test]
fn feeding_plan_does_not_mutate_state() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    let before = engine.get_corral(corral_id).unwrap();
    let plan = engine.feeding_plan(corral_id, "winter").unwrap();
    assert!((plan.quantity_kg - 10.4).abs() < 1e-9);
    let after = engine.get_corral(corral_id).unwrap();
    assert_eq!(
        before.resources.food_level, after.resources.food_level,
        "planning must not dispense"
    );
    assert!(engine.command_history(10).is_empty());
}

#[test]
fn schedule_fires_once_per_minute() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    let food = engine.register_food_type(FoodType {
        id: Uuid::now_v7(),
        name: "Alfalfa".to_string(),
        suitable_for: Some(AnimalType::Cow),
    });
    let schedule = engine
        .create_schedule(
            corral_id,
            food.id,
            5.0,
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            "normal",
        )
        .unwrap();

    engine.execute_schedule_now(schedule.id).unwrap();
    let err = engine.execute_schedule_now(schedule.id).unwrap_err();
    assert!(matches!(err, EngineError::InvalidAction(_)));
    assert_eq!(engine.command_history(10).len(), 1);
}

#[test]
fn inactive_schedule_does_not_fire() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let food = engine.register_food_type(FoodType {
        id: Uuid::now_v7(),
        name: "Alfalfa".to_string(),
        suitable_for: None,
    });
    let schedule = engine
        .create_schedule(
            corral_id,
            food.id,
            5.0,
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            "normal",
        )
        .unwrap();
    engine.set_schedule_active(schedule.id, false).unwrap();
    assert!(engine.execute_schedule_now(schedule.id).is_err());
    assert_eq!(engine.fire_due_schedules(Utc::now()), 0);
}

#[test]
fn racing_deletes_release_the_slot_once() {
    use std::sync::{Arc, Barrier};

    for round in 0..200 {
        let (engine, corral_id) = engine_with_cow_corral(2);
        let doomed = engine
            .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
            .unwrap();
        let doomed_id = doomed.id;
        engine
            .create_animal(factory_request(AnimalType::Cow, "Pinta", Some(corral_id)))
            .unwrap();

        let engine = Arc::new(engine);
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.delete_animal(doomed_id).is_ok()
                })
            })
            .collect();
        let deleted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(deleted, 1, "round {}", round);
        assert_eq!(
            engine.get_corral(corral_id).unwrap().current_animal_count,
            1,
            "round {}",
            round
        );
        assert_eq!(engine.list_animals().len(), 1);
    }
}

#[test]
fn failed_family_creation_registers_nothing() {
    let engine = FarmEngine::default();
    let corral = engine
        .register_corral(Corral::new("Corral Norte", AnimalType::Cow, 1))
        .unwrap();
    engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral.id)))
        .unwrap();

    // The corral is full, so the family's animal is inadmissible.
    let err = engine
        .create_animal(CreationRequest::FarmFamily(FarmFamilyRequest {
            farm_type: FarmType::Dairy,
            name: Some("Aurora".to_string()),
            corral_id: Some(corral.id),
        }))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.list_food_types().is_empty());
    assert_eq!(engine.list_corrals().len(), 1);
    assert_eq!(engine.list_animals().len(), 1);
}

#[test]
fn delete_animal_frees_the_corral_slot() {
    let (engine, corral_id) = engine_with_cow_corral(1);
    let cow = engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    engine.delete_animal(cow.id).unwrap();
    assert_eq!(engine.get_corral(corral_id).unwrap().current_animal_count, 0);
    // The freed slot is usable again.
    engine
        .create_animal(factory_request(AnimalType::Cow, "Pinta", Some(corral_id)))
        .unwrap();
}

#[test]
fn adapter_demo_translates_without_mutating() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    let cow = engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    let legacy = engine.adapter_demo(cow.id, "LEGACY_FARM").unwrap();
    assert_eq!(legacy.species_code, "BOV");
    assert_eq!(legacy.animal_code, cow.tag_id);
    assert_eq!(engine.get_animal(cow.id).unwrap().weight, cow.weight);

    let err = engine.adapter_demo(cow.id, "SAP_FARM").unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedTarget(_)));
}

#[test]
fn concurrent_creation_never_exceeds_capacity() {
    use std::sync::Arc;

    let (engine, corral_id) = engine_with_cow_corral(10);
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine
                    .create_animal(factory_request(
                        AnimalType::Cow,
                        &format!("Vaca {}", i),
                        Some(corral_id),
                    ))
                    .is_ok()
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(created, 10);
    assert_eq!(
        engine.get_corral(corral_id).unwrap().current_animal_count,
        10
    );
    assert_eq!(engine.list_animals().len(), 10);
}

#[test]
fn seed_demo_populates_a_consistent_farm() {
    let engine = FarmEngine::default();
    engine.seed_demo().unwrap();
    assert_eq!(engine.list_corrals().len(), 3);
    assert_eq!(engine.list_animals().len(), 4);
    assert_eq!(engine.list_food_types().len(), 2);
    assert_eq!(engine.list_sensors().len(), 2);
    assert_eq!(engine.list_schedules().len(), 1);
}

#[test]
fn reset_clears_every_store() {
    let (engine, corral_id) = engine_with_cow_corral(5);
    engine
        .create_animal(factory_request(AnimalType::Cow, "Lola", Some(corral_id)))
        .unwrap();
    engine.feed_corral(corral_id, 5.0, None).unwrap();
    engine.reset();
    assert!(engine.list_animals().is_empty());
    assert!(engine.list_corrals().is_empty());
    assert!(engine.command_history(10).is_empty());
    assert!(engine.list_feeding_records(10).is_empty());
}
