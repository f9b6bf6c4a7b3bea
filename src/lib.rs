// External-system adapters
pub mod adapter;

// Animal records, capabilities, creation protocols and health
pub mod animal;

// Runtime configuration
pub mod config;

// Corrals and their resource levels
pub mod corral;

// Engine facade over every subsystem
pub mod engine;

// Shared error types
pub mod error;

// Feeding strategies, commands and schedules
pub mod feeding;

// Sensor monitoring and alerting
pub mod sensor;
