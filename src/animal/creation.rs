//! The three creation protocols, modeled as a tagged request variant
//! dispatched to dedicated constructors. All converge on the same
//! validated `AnimalRecord`.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::animal::health::HealthState;
use crate::animal::{generate_tag_id, AnimalRecord, AnimalType, CapabilitySet};
use crate::corral::CorralTemplate;
use crate::error::{EngineError, EngineResult};
use crate::feeding::FoodType;

/// A creation request, tagged by protocol.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum CreationRequest {
    /// Type-keyed factory: species defaults fill everything not supplied.
    Factory(FactoryRequest),
    /// Step-wise builder: rejects incomplete assemblies at finalize time.
    Builder(BuilderRequest),
    /// Farm-family abstract factory: coherent animal + food + corral
    /// template triple, species fixed by construction.
    FarmFamily(FarmFamilyRequest),
}

#[derive(Clone, Debug, Deserialize)]
pub struct FactoryRequest {
    pub animal_type: AnimalType,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<f64>,
    pub age_months: Option<u32>,
    pub corral_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BuilderRequest {
    pub preset: Option<BuilderPreset>,
    pub animal_type: Option<AnimalType>,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<f64>,
    pub age_months: Option<u32>,
    pub purpose: Option<String>,
    pub daily_production: Option<String>,
    pub corral_id: Option<Uuid>,
}

/// Named builder presets pre-filling the assembly chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderPreset {
    PremiumDairy,
    MeatPig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FarmFamilyRequest {
    pub farm_type: FarmType,
    pub name: Option<String>,
    pub corral_id: Option<Uuid>,
}

/// Farm families served by the abstract factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FarmType {
    Dairy,
    Meat,
    Egg,
}

impl FarmType {
    /// The one species a family produces. Mismatches are impossible by
    /// construction.
    pub fn species(&self) -> AnimalType {
        match self {
            FarmType::Dairy => AnimalType::Cow,
            FarmType::Meat => AnimalType::Pig,
            FarmType::Egg => AnimalType::Chicken,
        }
    }

    fn food_name(&self) -> &'static str {
        match self {
            FarmType::Dairy => "Dairy feed mix",
            FarmType::Meat => "Fattening feed",
            FarmType::Egg => "Layer pellets",
        }
    }

    fn template(&self) -> CorralTemplate {
        match self {
            FarmType::Dairy => CorralTemplate {
                name: "Dairy barn".to_string(),
                animal_type: AnimalType::Cow,
                location: "North field".to_string(),
                capacity: 20,
            },
            FarmType::Meat => CorralTemplate {
                name: "Fattening pen".to_string(),
                animal_type: AnimalType::Pig,
                location: "East yard".to_string(),
                capacity: 30,
            },
            FarmType::Egg => CorralTemplate {
                name: "Layer house".to_string(),
                animal_type: AnimalType::Chicken,
                location: "South shed".to_string(),
                capacity: 100,
            },
        }
    }
}

/// The coherent triple produced by the abstract factory.
#[derive(Clone, Debug)]
pub struct FarmFamilyKit {
    pub animal: AnimalRecord,
    pub food_type: FoodType,
    pub corral_template: CorralTemplate,
}

/// What a creation request produced.
#[derive(Clone, Debug)]
pub enum CreationOutcome {
    Single(AnimalRecord),
    Family(FarmFamilyKit),
}

impl CreationOutcome {
    pub fn animal(&self) -> &AnimalRecord {
        match self {
            CreationOutcome::Single(a) => a,
            CreationOutcome::Family(kit) => &kit.animal,
        }
    }
}

/// Dispatches a creation request to its protocol constructor.
pub fn create(request: CreationRequest) -> EngineResult<CreationOutcome> {
    match request {
        CreationRequest::Factory(req) => from_factory(req).map(CreationOutcome::Single),
        CreationRequest::Builder(req) => from_builder(req).map(CreationOutcome::Single),
        CreationRequest::FarmFamily(req) => farm_family(req).map(CreationOutcome::Family),
    }
}

fn new_record(
    animal_type: AnimalType,
    name: String,
    breed: String,
    weight: f64,
    age_months: u32,
    purpose: String,
    daily_production: Option<String>,
    corral_id: Option<Uuid>,
) -> EngineResult<AnimalRecord> {
    let tag_id = generate_tag_id(animal_type);
    let record = AnimalRecord {
        id: Uuid::now_v7(),
        tag_id,
        animal_type,
        name,
        breed,
        weight,
        age_months,
        health_state: HealthState::Sano,
        purpose,
        daily_production,
        corral_id,
        capabilities: CapabilitySet::new(),
        failed_checks: 0,
        last_action_at: None,
        last_fed_at: None,
        created_at: Utc::now(),
    };
    record.validate()?;
    Ok(record)
}

fn default_breed(animal_type: AnimalType) -> &'static str {
    match animal_type {
        AnimalType::Cow => "Holstein",
        AnimalType::Pig => "Yorkshire",
        AnimalType::Chicken => "Leghorn",
    }
}

fn default_production(animal_type: AnimalType) -> Option<String> {
    match animal_type {
        AnimalType::Cow => Some("20L milk/day".to_string()),
        AnimalType::Pig => None,
        AnimalType::Chicken => Some("1 egg/day".to_string()),
    }
}

/// Factory Method: a record pre-populated with type-appropriate defaults.
fn from_factory(req: FactoryRequest) -> EngineResult<AnimalRecord> {
    let animal_type = req.animal_type;
    let tag_like_name = || format!("{}-sin-nombre", animal_type.tag_prefix());
    new_record(
        animal_type,
        req.name.filter(|n| !n.is_empty()).unwrap_or_else(tag_like_name),
        req.breed
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| default_breed(animal_type).to_string()),
        req.weight.unwrap_or_else(|| animal_type.default_weight_kg()),
        req.age_months.unwrap_or(12),
        animal_type.default_purpose().to_string(),
        default_production(animal_type),
        req.corral_id,
    )
}

/// Step-wise builder. Missing required attributes fail at `build()`,
/// never silently default.
#[derive(Clone, Debug, Default)]
pub struct AnimalBuilder {
    animal_type: Option<AnimalType>,
    name: Option<String>,
    breed: Option<String>,
    weight: Option<f64>,
    age_months: Option<u32>,
    purpose: Option<String>,
    daily_production: Option<String>,
    corral_id: Option<Uuid>,
}

impl AnimalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the chain from a named preset. Later steps may override.
    pub fn preset(preset: BuilderPreset) -> Self {
        match preset {
            BuilderPreset::PremiumDairy => Self::new()
                .animal_type(AnimalType::Cow)
                .breed("Holstein Premium")
                .weight(600.0)
                .age_months(30)
                .purpose("milk")
                .daily_production("30L milk/day"),
            BuilderPreset::MeatPig => Self::new()
                .animal_type(AnimalType::Pig)
                .breed("Yorkshire")
                .weight(110.0)
                .age_months(8)
                .purpose("meat"),
        }
    }

    pub fn animal_type(mut self, animal_type: AnimalType) -> Self {
        self.animal_type = Some(animal_type);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn age_months(mut self, age_months: u32) -> Self {
        self.age_months = Some(age_months);
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn daily_production(mut self, production: impl Into<String>) -> Self {
        self.daily_production = Some(production.into());
        self
    }

    pub fn corral(mut self, corral_id: Uuid) -> Self {
        self.corral_id = Some(corral_id);
        self
    }

    pub fn build(self) -> EngineResult<AnimalRecord> {
        let required = |field: &str| {
            EngineError::validation(format!("builder missing required attribute '{}'", field))
        };
        new_record(
            self.animal_type.ok_or_else(|| required("animal_type"))?,
            self.name.ok_or_else(|| required("name"))?,
            self.breed.ok_or_else(|| required("breed"))?,
            self.weight.ok_or_else(|| required("weight"))?,
            self.age_months.ok_or_else(|| required("age_months"))?,
            self.purpose.ok_or_else(|| required("purpose"))?,
            self.daily_production,
            self.corral_id,
        )
    }
}

fn from_builder(req: BuilderRequest) -> EngineResult<AnimalRecord> {
    let mut builder = match req.preset {
        Some(preset) => AnimalBuilder::preset(preset),
        None => AnimalBuilder::new(),
    };
    if let Some(animal_type) = req.animal_type {
        builder = builder.animal_type(animal_type);
    }
    if let Some(name) = req.name.filter(|n| !n.is_empty()) {
        builder = builder.name(name);
    }
    if let Some(breed) = req.breed.filter(|b| !b.is_empty()) {
        builder = builder.breed(breed);
    }
    if let Some(weight) = req.weight {
        builder = builder.weight(weight);
    }
    if let Some(age) = req.age_months {
        builder = builder.age_months(age);
    }
    if let Some(purpose) = req.purpose.filter(|p| !p.is_empty()) {
        builder = builder.purpose(purpose);
    }
    if let Some(production) = req.daily_production {
        builder = builder.daily_production(production);
    }
    if let Some(corral_id) = req.corral_id {
        builder = builder.corral(corral_id);
    }
    builder.build()
}

/// Abstract Factory: the animal's species always matches the farm family.
fn farm_family(req: FarmFamilyRequest) -> EngineResult<FarmFamilyKit> {
    let species = req.farm_type.species();
    let animal = from_factory(FactoryRequest {
        animal_type: species,
        name: req.name,
        breed: None,
        weight: None,
        age_months: None,
        corral_id: req.corral_id,
    })?;
    Ok(FarmFamilyKit {
        animal,
        food_type: FoodType {
            id: Uuid::now_v7(),
            name: req.farm_type.food_name().to_string(),
            suitable_for: Some(species),
        },
        corral_template: req.farm_type.template(),
    })
}
