//! One-call orchestration across the monitor, creation, strategy and
//! command subsystems. Every step reports its own outcome; only a missing
//! corral aborts the flow.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::FarmEngine;
use crate::error::EngineResult;
use crate::feeding::strategy::{self, FeedingPlan};
use crate::feeding::FeedingRecord;
use crate::sensor::{Alert, SensorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    Ok,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub status: StepState,
    pub detail: String,
}

impl StepReport {
    fn new(step: &'static str, status: StepState, detail: impl Into<String>) -> Self {
        Self {
            step,
            status,
            detail: detail.into(),
        }
    }
}

/// Outcome of a full monitor -> creation -> strategy -> command pass over
/// one corral.
#[derive(Debug, Clone, Serialize)]
pub struct IntegratedFlowResult {
    pub corral_id: Uuid,
    pub low_resource_alert: bool,
    pub alerts: Vec<Alert>,
    pub assigned_animals: Vec<Uuid>,
    pub plan: Option<FeedingPlan>,
    pub feeding: Option<FeedingRecord>,
    pub steps: Vec<StepReport>,
}

impl FarmEngine {
    /// Runs the integrated flow for one corral.
    ///
    /// Steps: snapshot active alerts, assign pending animals when a
    /// low-resource alert is present, compute a plan from the corral's
    /// configured strategy, then dispense it as a feed command. A step
    /// that cannot act is reported as skipped, not failed.
    pub fn run_integrated_flow(&self, corral_id: Uuid) -> EngineResult<IntegratedFlowResult> {
        let corral = self.get_corral(corral_id)?;
        let mut steps = Vec::with_capacity(4);

        // 1. Monitor: snapshot the corral's active alerts.
        let alerts = self.monitor.alerts_for_corral(corral_id);
        let low_resource_alert = alerts
            .iter()
            .any(|a| matches!(a.sensor_type, SensorType::Food | SensorType::Water));
        steps.push(StepReport::new(
            "monitor",
            StepState::Ok,
            format!(
                "{} active alert(s), low-resource: {}",
                alerts.len(),
                low_resource_alert
            ),
        ));

        // 2. Creation: fill the corral from the pending pool, but only
        //    when the monitor flagged a resource problem.
        let assigned_animals = if !low_resource_alert {
            steps.push(StepReport::new(
                "creation",
                StepState::Skipped,
                "no low-resource alert",
            ));
            Vec::new()
        } else {
            match self.assign_pending_animals(corral_id) {
                Ok(assigned) if assigned.is_empty() => {
                    steps.push(StepReport::new(
                        "creation",
                        StepState::Skipped,
                        "no pending animals",
                    ));
                    assigned
                }
                Ok(assigned) => {
                    steps.push(StepReport::new(
                        "creation",
                        StepState::Ok,
                        format!("{} pending animal(s) assigned", assigned.len()),
                    ));
                    assigned
                }
                Err(e) => {
                    steps.push(StepReport::new("creation", StepState::Failed, e.to_string()));
                    Vec::new()
                }
            }
        };

        // 3. Strategy: plan with the corral's configured strategy. Re-read
        //    the corral, the count may have changed in step 2.
        let corral = self.get_corral(corral_id).unwrap_or(corral);
        let plan = strategy::plan(&corral, corral.feeding_strategy);
        steps.push(StepReport::new(
            "strategy",
            StepState::Ok,
            format!(
                "{}: {} kg for {} animal(s)",
                plan.strategy.as_str(),
                plan.quantity_kg,
                plan.animal_count
            ),
        ));

        // 4. Command: dispense the planned quantity.
        let feeding = if plan.quantity_kg <= 0.0 {
            steps.push(StepReport::new(
                "command",
                StepState::Skipped,
                "empty corral, nothing to dispense",
            ));
            None
        } else {
            match self.feed_corral(corral_id, plan.quantity_kg, None) {
                Ok(record) => {
                    steps.push(StepReport::new(
                        "command",
                        StepState::Ok,
                        format!("dispensed {} kg ({:?})", record.quantity_kg, record.status),
                    ));
                    Some(record)
                }
                Err(e) => {
                    steps.push(StepReport::new("command", StepState::Failed, e.to_string()));
                    None
                }
            }
        };

        info!(
            corral_id = %corral_id,
            alerts = alerts.len(),
            assigned = assigned_animals.len(),
            dispensed = feeding.is_some(),
            "Integrated flow completed"
        );

        Ok(IntegratedFlowResult {
            corral_id,
            low_resource_alert,
            alerts,
            assigned_animals,
            plan: Some(plan),
            feeding,
            steps,
        })
    }
}
