//! Node → node group lookup.

use crate::error::ResolverError;
use crate::types::{Node, NodeGroupId};

/// Maps a concrete node to the node group that manages it.
///
/// `Ok(None)` means the node is not managed by any group and callers skip
/// it. An `Err` is a lookup failure and aborts the caller's pass.
pub trait NodeGroupResolver {
    fn node_group_for_node(&self, node: &Node) -> Result<Option<NodeGroupId>, ResolverError>;
}

/// Reads the node group id from a node label.
#[derive(Debug, Clone)]
pub struct LabelNodeGroupResolver {
    label_key: String,
}

impl LabelNodeGroupResolver {
    pub fn new(label_key: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
        }
    }
}

impl NodeGroupResolver for LabelNodeGroupResolver {
    fn node_group_for_node(&self, node: &Node) -> Result<Option<NodeGroupId>, ResolverError> {
        Ok(node.labels.get(&self.label_key).cloned())
    }
}
