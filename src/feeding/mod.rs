use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod command;
pub mod schedule;
pub mod strategy;

pub use command::{CommandHistory, CommandHistoryEntry, FeedCommand};
pub use strategy::{FeedingPlan, FeedingStrategy};

use crate::animal::AnimalType;

/// A catalog entry for a kind of feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodType {
    pub id: Uuid,
    pub name: String,
    /// Species this feed is formulated for; `None` means general purpose.
    pub suitable_for: Option<AnimalType>,
}

/// A recurring dispensation at a time of day.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedingSchedule {
    pub id: Uuid,
    pub corral_id: Uuid,
    pub food_type_id: Uuid,
    pub quantity_kg: f64,
    pub time: NaiveTime,
    pub strategy: FeedingStrategy,
    pub is_active: bool,
    /// Minute key ("YYYY-MM-DD HH:MM") of the last firing; guards against
    /// double-firing within the same minute.
    pub last_fired_minute: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a dispensation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedStatus {
    Success,
    Partial,
    Failed,
}

/// Immutable append-only record of one dispensation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedingRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub corral_id: Uuid,
    pub food_type_id: Option<Uuid>,
    /// Kilograms actually dispensed.
    pub quantity_kg: f64,
    /// Kilograms requested but not available (zero on SUCCESS).
    pub shortfall_kg: f64,
    pub animals_fed: u32,
    pub status: FeedStatus,
}

/// Aggregates for one calendar day of feeding records.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_feedings: usize,
    pub total_food_kg: f64,
    pub corrals_fed: usize,
    pub animals_fed: u64,
}

/// Dispensation efficiency over an inclusive date range.
#[derive(Clone, Debug, Serialize)]
pub struct EfficiencyReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_feedings: usize,
    pub requested_kg: f64,
    pub dispensed_kg: f64,
    /// dispensed / requested as a percentage; 100 when nothing was requested.
    pub efficiency_pct: f64,
    pub successful: usize,
    pub partial: usize,
    pub failed: usize,
}

/// Process-owned append log of feeding records. Readers get snapshots;
/// entries are never mutated or removed except by explicit reset.
pub struct FeedingLog {
    records: RwLock<Vec<FeedingRecord>>,
    max_entries: usize,
}

impl FeedingLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    pub fn append(&self, record: FeedingRecord) {
        let mut records = self.records.write().unwrap();
        records.push(record);
        if records.len() > self.max_entries {
            let excess = records.len() - self.max_entries;
            records.drain(..excess);
        }
    }

    /// Most recent records first, bounded by `limit`.
    pub fn recent(&self, limit: usize) -> Vec<FeedingRecord> {
        let records = self.records.read().unwrap();
        records.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    /// Rolls up one day's records.
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        let records = self.records.read().unwrap();
        let mut summary = DailySummary {
            date,
            ..DailySummary::default()
        };
        let mut corrals = std::collections::HashSet::new();
        for record in records.iter().filter(|r| r.timestamp.date_naive() == date) {
            summary.total_feedings += 1;
            summary.total_food_kg += record.quantity_kg;
            summary.animals_fed += u64::from(record.animals_fed);
            corrals.insert(record.corral_id);
        }
        summary.corrals_fed = corrals.len();
        summary
    }

    /// Rolls up dispensation efficiency over an inclusive date range. The
    /// requested amount of a record is what was dispensed plus its shortfall.
    pub fn efficiency_report(&self, from: NaiveDate, to: NaiveDate) -> EfficiencyReport {
        let records = self.records.read().unwrap();
        let mut report = EfficiencyReport {
            from,
            to,
            total_feedings: 0,
            requested_kg: 0.0,
            dispensed_kg: 0.0,
            efficiency_pct: 100.0,
            successful: 0,
            partial: 0,
            failed: 0,
        };
        for record in records.iter().filter(|r| {
            let date = r.timestamp.date_naive();
            date >= from && date <= to
        }) {
            report.total_feedings += 1;
            report.requested_kg += record.quantity_kg + record.shortfall_kg;
            report.dispensed_kg += record.quantity_kg;
            match record.status {
                FeedStatus::Success => report.successful += 1,
                FeedStatus::Partial => report.partial += 1,
                FeedStatus::Failed => report.failed += 1,
            }
        }
        if report.requested_kg > 0.0 {
            report.efficiency_pct = report.dispensed_kg / report.requested_kg * 100.0;
        }
        report
    }

    /// Clears the log. For engine reset only.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(ts: DateTime<Utc>, corral_id: Uuid, kg: f64, fed: u32) -> FeedingRecord {
        FeedingRecord {
            id: Uuid::now_v7(),
            timestamp: ts,
            corral_id,
            food_type_id: None,
            quantity_kg: kg,
            shortfall_kg: 0.0,
            animals_fed: fed,
            status: FeedStatus::Success,
        }
    }

    #[test]
    fn daily_summary_rolls_up_one_day() {
        let log = FeedingLog::new(100);
        let corral_a = Uuid::now_v7();
        let corral_b = Uuid::now_v7();
        let day = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let other_day = Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap();

        log.append(record_at(day, corral_a, 40.0, 10));
        log.append(record_at(day, corral_a, 20.0, 10));
        log.append(record_at(day, corral_b, 5.0, 30));
        log.append(record_at(other_day, corral_b, 99.0, 1));

        let summary = log.daily_summary(day.date_naive());
        assert_eq!(summary.total_feedings, 3);
        assert_eq!(summary.total_food_kg, 65.0);
        assert_eq!(summary.corrals_fed, 2);
        assert_eq!(summary.animals_fed, 50);
    }

    #[test]
    fn efficiency_report_spans_a_date_range() {
        let log = FeedingLog::new(100);
        let corral = Uuid::now_v7();
        let day1 = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap();
        let day3 = Utc.with_ymd_and_hms(2026, 3, 12, 8, 0, 0).unwrap();

        log.append(record_at(day1, corral, 40.0, 10));
        let mut short = record_at(day2, corral, 30.0, 6);
        short.shortfall_kg = 10.0;
        short.status = FeedStatus::Partial;
        log.append(short);
        // Outside the range.
        log.append(record_at(day3, corral, 99.0, 1));

        let report = log.efficiency_report(day1.date_naive(), day2.date_naive());
        assert_eq!(report.total_feedings, 2);
        assert!((report.requested_kg - 80.0).abs() < 1e-9);
        assert!((report.dispensed_kg - 70.0).abs() < 1e-9);
        assert!((report.efficiency_pct - 87.5).abs() < 1e-9);
        assert_eq!(report.successful, 1);
        assert_eq!(report.partial, 1);
        assert_eq!(report.failed, 0);

        let idle = day3.date_naive().succ_opt().unwrap();
        assert_eq!(log.efficiency_report(idle, idle).efficiency_pct, 100.0);
    }

    #[test]
    fn recent_is_reverse_chronological_and_bounded() {
        let log = FeedingLog::new(100);
        let corral = Uuid::now_v7();
        for i in 0..5 {
            log.append(record_at(Utc::now(), corral, f64::from(i), 1));
        }
        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].quantity_kg, 4.0);
        assert_eq!(recent[2].quantity_kg, 2.0);
    }

    #[test]
    fn retention_drops_oldest() {
        let log = FeedingLog::new(2);
        let corral = Uuid::now_v7();
        log.append(record_at(Utc::now(), corral, 1.0, 1));
        log.append(record_at(Utc::now(), corral, 2.0, 1));
        log.append(record_at(Utc::now(), corral, 3.0, 1));
        assert_eq!(log.len(), 2);
        assert_eq!(log.recent(10)[1].quantity_kg, 2.0);
    }
}
