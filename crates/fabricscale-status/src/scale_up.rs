//! Raw outcome of one scale-up attempt, as handed over by the scale-up loop.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Top-level outcome of a scale-up attempt.
///
/// `Unknown` absorbs any outcome this build does not recognise, including
/// values added by newer producers, so decoding never fails on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleUpResult {
    Successful,
    Error,
    NoOptionsAvailable,
    NotNeeded,
    #[default]
    NotTried,
    InCooldown,
    #[serde(other)]
    Unknown,
}

impl ScaleUpResult {
    /// Every label an external consumer may observe.
    pub const LABELS: [&'static str; 7] = [
        "successful",
        "error",
        "no_options_available",
        "not_needed",
        "not_tried",
        "in_cooldown",
        "unknown",
    ];

    /// Canonical external label.
    pub fn label(self) -> &'static str {
        match self {
            ScaleUpResult::Successful => "successful",
            ScaleUpResult::Error => "error",
            ScaleUpResult::NoOptionsAvailable => "no_options_available",
            ScaleUpResult::NotNeeded => "not_needed",
            ScaleUpResult::NotTried => "not_tried",
            ScaleUpResult::InCooldown => "in_cooldown",
            ScaleUpResult::Unknown => "unknown",
        }
    }

    /// Inverse of [`label`](Self::label); anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "successful" => ScaleUpResult::Successful,
            "error" => ScaleUpResult::Error,
            "no_options_available" => ScaleUpResult::NoOptionsAvailable,
            "not_needed" => ScaleUpResult::NotNeeded,
            "not_tried" => ScaleUpResult::NotTried,
            "in_cooldown" => ScaleUpResult::InCooldown,
            _ => ScaleUpResult::Unknown,
        }
    }
}

impl fmt::Display for ScaleUpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a node group was not used for a batch of pods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedReasons {
    pub messages: Vec<String>,
}

impl SkippedReasons {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical reason string used as the histogram key.
    pub fn status_string(&self) -> String {
        self.messages.join(", ")
    }
}

/// Pods that stayed unschedulable, with the per-group skip reasons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnschedulablePodGroup {
    #[serde(default)]
    pub pods: Vec<String>,
    #[serde(default)]
    pub skipped_node_groups: HashMap<String, SkippedReasons>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleUpStatus {
    #[serde(default)]
    pub result: ScaleUpResult,
    #[serde(default)]
    pub pods_triggered_scale_up: Vec<String>,
    #[serde(default)]
    pub pods_remain_unschedulable: Vec<UnschedulablePodGroup>,
}
