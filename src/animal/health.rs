use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Health states an animal moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthState {
    Sano,
    Enfermo,
    EnTratamiento,
    Cuarentena,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Sano => "SANO",
            HealthState::Enfermo => "ENFERMO",
            HealthState::EnTratamiento => "EN_TRATAMIENTO",
            HealthState::Cuarentena => "CUARENTENA",
        }
    }
}

/// Actions accepted by the health state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthAction {
    Feed,
    Vaccinate,
    Check,
}

impl HealthAction {
    /// Parses an action identifier. Unknown identifiers are rejected,
    /// never coerced.
    pub fn parse(name: &str) -> EngineResult<Self> {
        match name {
            "feed" => Ok(HealthAction::Feed),
            "vaccinate" => Ok(HealthAction::Vaccinate),
            "check" => Ok(HealthAction::Check),
            other => Err(EngineError::InvalidAction(format!(
                "unknown health action '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthAction::Feed => "feed",
            HealthAction::Vaccinate => "vaccinate",
            HealthAction::Check => "check",
        }
    }
}

/// Result of applying one action: the next state and the updated count of
/// consecutive failed checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: HealthState,
    pub failed_checks: u32,
}

/// Applies one health action to a state.
///
/// Transition table:
/// - `feed` never changes state (the caller records the feeding timestamp).
/// - `vaccinate` moves ENFERMO to EN_TRATAMIENTO, otherwise no-op.
/// - `check` on a sick animal counts as a failed check; once
///   `quarantine_threshold` consecutive checks have failed the animal is
///   quarantined, otherwise it enters treatment. A check on a healthy or
///   treated animal clears the counter. CUARENTENA can only be left via
///   `check`, which clears the condition back to SANO.
pub fn apply(
    state: HealthState,
    action: HealthAction,
    failed_checks: u32,
    quarantine_threshold: u32,
) -> Transition {
    match action {
        HealthAction::Feed => Transition {
            state,
            failed_checks,
        },
        HealthAction::Vaccinate => Transition {
            state: match state {
                HealthState::Enfermo => HealthState::EnTratamiento,
                other => other,
            },
            failed_checks,
        },
        HealthAction::Check => match state {
            HealthState::Cuarentena => Transition {
                state: HealthState::Sano,
                failed_checks: 0,
            },
            HealthState::Enfermo => {
                let failed = failed_checks + 1;
                if failed >= quarantine_threshold {
                    Transition {
                        state: HealthState::Cuarentena,
                        failed_checks: failed,
                    }
                } else {
                    Transition {
                        state: HealthState::EnTratamiento,
                        failed_checks: failed,
                    }
                }
            }
            HealthState::Sano | HealthState::EnTratamiento => Transition {
                state,
                failed_checks: 0,
            },
        },
    }
}
