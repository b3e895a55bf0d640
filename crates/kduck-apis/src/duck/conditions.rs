//! Conditions and the common status block shared by most resources

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type set once a resource is fully reconciled
pub const CONDITION_READY: &str = "Ready";

/// Condition type used by run-to-completion resources
pub const CONDITION_SUCCEEDED: &str = "Succeeded";

/// Truth value of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// Severity of a non-terminal condition. Empty means `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionSeverity {
    #[default]
    #[serde(rename = "")]
    Error,
    Warning,
    Info,
}

impl ConditionSeverity {
    fn is_error(&self) -> bool {
        matches!(self, ConditionSeverity::Error)
    }
}

/// A single observation of a resource's state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    pub status: ConditionStatus,

    #[serde(skip_serializing_if = "ConditionSeverity::is_error")]
    pub severity: ConditionSeverity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    /// Create a condition of the given type and status
    pub fn new(type_: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            type_: type_.into(),
            status,
            ..Default::default()
        }
    }

    /// Attach a reason and message
    pub fn with_reason(mut self, reason: impl Into<String>, message: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self.message = Some(message.into());
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    // Same observation, ignoring when it was made.
    fn same_state(&self, other: &Condition) -> bool {
        self.status == other.status
            && self.severity == other.severity
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// The status block every duck-typed resource is expected to carry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Status {
    #[serde(skip_serializing_if = "is_zero")]
    pub observed_generation: i64,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl Status {
    /// Look up a condition by type
    pub fn get_condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Set a condition, replacing any existing one of the same type.
    ///
    /// The transition time is kept when the observed state did not change,
    /// and conditions stay sorted by type so that serialized statuses are
    /// stable across reconciles.
    pub fn set_condition(&mut self, mut condition: Condition) {
        if let Some(existing) = self.get_condition(&condition.type_) {
            if existing.same_state(&condition) {
                return;
            }
        }
        if condition.last_transition_time.is_none() {
            condition.last_transition_time = Some(Utc::now());
        }
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self.conditions.sort_by(|a, b| a.type_.cmp(&b.type_));
    }

    /// Remove a condition by type. Returns whether one was removed.
    pub fn clear_condition(&mut self, type_: &str) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.type_ != type_);
        before != self.conditions.len()
    }

    /// Ready when the `Ready` (or `Succeeded`) condition is true
    pub fn is_ready(&self) -> bool {
        self.get_condition(CONDITION_READY)
            .or_else(|| self.get_condition(CONDITION_SUCCEEDED))
            .is_some_and(Condition::is_true)
    }
}
