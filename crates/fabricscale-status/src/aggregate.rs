//! Folds a scale-up attempt into per-node-group reason histograms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::persist::StatusPayload;
use crate::scale_up::ScaleUpStatus;

/// Report persisted into the scale-up status record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleUpStatusReport {
    /// Stamped by the writer with the update time.
    #[serde(default)]
    pub time: String,
    /// Canonical outcome label, see [`ScaleUpResult::label`](crate::ScaleUpResult::label).
    pub result: String,
    /// One entry per node group that was skipped at least once, sorted by name.
    #[serde(default)]
    pub node_groups: Vec<NodeGroupStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupStatus {
    pub name: String,
    pub scale_up: NodeGroupScaleUpCondition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupScaleUpCondition {
    /// Reason string → number of pod batches that skipped the group for it.
    pub reasons: BTreeMap<String, u32>,
}

impl StatusPayload for ScaleUpStatusReport {
    fn set_time(&mut self, time: &str) {
        self.time = time.to_string();
    }
}

impl ScaleUpStatusReport {
    pub fn node_group(&self, name: &str) -> Option<&NodeGroupStatus> {
        self.node_groups.iter().find(|group| group.name == name)
    }
}

/// Build the report for one attempt.
///
/// A group skipped in several batches gets a single entry whose counts are
/// summed. Groups never skipped are absent. Entries are ordered by group
/// name so the rendered report is stable from cycle to cycle.
pub fn aggregate(status: &ScaleUpStatus) -> ScaleUpStatusReport {
    let mut histograms: BTreeMap<&str, BTreeMap<String, u32>> = BTreeMap::new();
    for batch in &status.pods_remain_unschedulable {
        for (node_group, reasons) in &batch.skipped_node_groups {
            *histograms
                .entry(node_group.as_str())
                .or_default()
                .entry(reasons.status_string())
                .or_insert(0) += 1;
        }
    }

    ScaleUpStatusReport {
        time: String::new(),
        result: status.result.label().to_string(),
        node_groups: histograms
            .into_iter()
            .map(|(name, reasons)| NodeGroupStatus {
                name: name.to_string(),
                scale_up: NodeGroupScaleUpCondition { reasons },
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale_up::{ScaleUpResult, SkippedReasons, UnschedulablePodGroup};
    use std::collections::HashMap;

    fn batch(skipped: &[(&str, &str)]) -> UnschedulablePodGroup {
        UnschedulablePodGroup {
            pods: vec!["default/pending".to_string()],
            skipped_node_groups: skipped
                .iter()
                .map(|(group, reason)| (group.to_string(), SkippedReasons::new([*reason])))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn reasons_accumulate_across_batches() {
        let status = ScaleUpStatus {
            result: ScaleUpResult::NoOptionsAvailable,
            pods_remain_unschedulable: vec![
                batch(&[("gpu-pool", "InsufficientResources")]),
                batch(&[("gpu-pool", "NodeAffinity"), ("cpu-pool", "NodeAffinity")]),
                batch(&[("gpu-pool", "InsufficientResources")]),
            ],
            ..Default::default()
        };
        let report = aggregate(&status);

        assert_eq!(report.result, "no_options_available");
        assert_eq!(report.node_groups.len(), 2);
        let gpu = &report.node_group("gpu-pool").unwrap().scale_up.reasons;
        assert_eq!(gpu.len(), 2);
        assert_eq!(gpu["InsufficientResources"], 2);
        assert_eq!(gpu["NodeAffinity"], 1);
        let cpu = &report.node_group("cpu-pool").unwrap().scale_up.reasons;
        assert_eq!(cpu["NodeAffinity"], 1);
    }

    #[test]
    fn entries_are_sorted_by_group_name() {
        let status = ScaleUpStatus {
            pods_remain_unschedulable: vec![
                batch(&[("zeta", "a"), ("alpha", "a")]),
                batch(&[("mid", "b")]),
            ],
            ..Default::default()
        };
        let names: Vec<_> = aggregate(&status)
            .node_groups
            .into_iter()
            .map(|group| group.name)
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn no_batches_yields_no_groups() {
        let status = ScaleUpStatus {
            result: ScaleUpResult::Successful,
            ..Default::default()
        };
        let report = aggregate(&status);
        assert!(report.node_groups.is_empty());
        assert_eq!(report.result, "successful");
    }

    #[test]
    fn unknown_result_gets_fallback_label() {
        let status = ScaleUpStatus {
            result: ScaleUpResult::Unknown,
            ..Default::default()
        };
        assert_eq!(aggregate(&status).result, "unknown");
    }

    #[test]
    fn multi_message_reasons_form_one_key() {
        let mut skipped = HashMap::new();
        skipped.insert(
            "gpu-pool".to_string(),
            SkippedReasons::new(["InsufficientResources", "NodeAffinity"]),
        );
        let status = ScaleUpStatus {
            pods_remain_unschedulable: vec![UnschedulablePodGroup {
                pods: Vec::new(),
                skipped_node_groups: skipped,
            }],
            ..Default::default()
        };
        let report = aggregate(&status);
        let reasons = &report.node_groups[0].scale_up.reasons;
        assert_eq!(reasons["InsufficientResources, NodeAffinity"], 1);
    }
}
