//! Reified feed dispensations and the append-only command history.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::corral::Corral;
use crate::error::{EngineError, EngineResult};
use crate::feeding::{FeedStatus, FeedingRecord};

/// One feed dispensation, encapsulated as a command.
///
/// Commands are never rolled back; a compensating action is a new command.
#[derive(Clone, Debug)]
pub struct FeedCommand {
    pub corral_id: Uuid,
    pub food_type_id: Option<Uuid>,
    pub quantity_kg: f64,
}

impl FeedCommand {
    pub const COMMAND_TYPE: &'static str = "FEED_DISPENSE";

    /// Executes against a locked corral: validates, consumes stock, and
    /// produces the immutable record. Insufficient stock completes with
    /// PARTIAL (or FAILED when nothing could be dispensed) rather than
    /// erroring.
    pub fn execute(&self, corral: &mut Corral) -> EngineResult<FeedingRecord> {
        if self.quantity_kg <= 0.0 {
            return Err(EngineError::validation(format!(
                "quantity_kg must be positive, got {}",
                self.quantity_kg
            )));
        }

        let dispensed = corral.consume_food_kg(self.quantity_kg);
        let shortfall = self.quantity_kg - dispensed;
        let status = if dispensed <= 0.0 {
            FeedStatus::Failed
        } else if shortfall > 1e-9 {
            FeedStatus::Partial
        } else {
            FeedStatus::Success
        };

        // animals_fed reflects actual distribution, not the request
        let animals_fed = if status == FeedStatus::Success {
            corral.current_animal_count
        } else {
            (f64::from(corral.current_animal_count) * dispensed / self.quantity_kg).floor() as u32
        };

        info!(
            corral_id = %self.corral_id,
            requested_kg = self.quantity_kg,
            dispensed_kg = dispensed,
            status = ?status,
            "Feed command executed"
        );

        Ok(FeedingRecord {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            corral_id: self.corral_id,
            food_type_id: self.food_type_id,
            quantity_kg: dispensed,
            shortfall_kg: shortfall.max(0.0),
            animals_fed,
            status,
        })
    }
}

/// One audit-trail entry for an executed command.
#[derive(Clone, Debug, Serialize)]
pub struct CommandHistoryEntry {
    pub command_type: String,
    pub corral_id: Uuid,
    pub quantity_kg: f64,
    pub status: FeedStatus,
    pub executed_at: DateTime<Utc>,
}

/// Append-only, bounded command history ordered by execution time.
/// Readers receive copy-on-read snapshots.
pub struct CommandHistory {
    entries: RwLock<Vec<CommandHistoryEntry>>,
    max_entries: usize,
}

impl CommandHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    pub fn append(&self, entry: CommandHistoryEntry) {
        let mut entries = self.entries.write().unwrap();
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }
    }

    /// Most recent entries first, bounded by `limit`.
    pub fn recent(&self, limit: usize) -> Vec<CommandHistoryEntry> {
        let entries = self.entries.read().unwrap();
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Clears the history. For engine reset only.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

impl From<&FeedingRecord> for CommandHistoryEntry {
    fn from(record: &FeedingRecord) -> Self {
        CommandHistoryEntry {
            command_type: FeedCommand::COMMAND_TYPE.to_string(),
            corral_id: record.corral_id,
            quantity_kg: record.quantity_kg,
            status: record.status,
            executed_at: record.timestamp,
        }
    }
}
