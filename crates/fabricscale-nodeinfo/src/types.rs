//! Node and template types consumed by the scale-up simulator.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Identifier of a logical node group (one scaling unit).
pub type NodeGroupId = String;

/// Node group id → representative template.
pub type TemplateSet = HashMap<NodeGroupId, NodeTemplate>;

/// A concrete machine as observed in the cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub allocatable: Allocatable,
}

/// Schedulable capacity of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocatable {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
    pub pods: u32,
}

/// A pod the template expects to run on every new node of the group
/// (typically a daemonset pod).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplatePod {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Inventory of devices published by one driver for one pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSlice {
    pub name: String,
    pub driver: String,
    pub pool: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Synthetic description of a node a group would add on scale-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeTemplate {
    pub node: Node,
    #[serde(default)]
    pub pods: Vec<TemplatePod>,
    /// Devices attached directly to the representative node.
    #[serde(default)]
    pub local_resource_slices: Vec<ResourceSlice>,
}

/// A daemonset whose pods belong on every node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonSet {
    pub namespace: String,
    pub name: String,
}

/// Taints the template synthesis strips or keeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaintConfig {
    #[serde(default)]
    pub ignored_taints: Vec<String>,
    #[serde(default)]
    pub startup_taints: Vec<String>,
    #[serde(default)]
    pub status_taints: Vec<String>,
}

impl NodeTemplate {
    /// Total number of devices across the template's local slices.
    pub fn local_device_count(&self) -> usize {
        self.local_resource_slices
            .iter()
            .map(|slice| slice.devices.len())
            .sum()
    }
}
