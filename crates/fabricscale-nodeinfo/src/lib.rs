//! fabricscale-nodeinfo — per-node-group templates for the scale-up simulator.
//!
//! A base [`TemplateNodeInfoProvider`] synthesizes one template per node
//! group. [`FabricNodeInfoProvider`] wraps any provider and corrects its
//! output for composable-fabric clusters: devices reachable through the
//! shared fabric must not be simulated as node-exclusive capacity, so groups
//! whose representative node carries the fabric label lose their local
//! resource slices.
//!
//! # Components
//!
//! - **`types`** — nodes, templates, resource slices
//! - **`resolver`** — node → node group lookup
//! - **`provider`** — the provider trait and a static implementation
//! - **`fabric`** — the fabric attribution decorator

pub mod error;
pub mod fabric;
pub mod provider;
pub mod resolver;
pub mod types;

pub use error::{AutoscalerError, AutoscalerResult, ErrorKind, ResolverError};
pub use fabric::{FabricNodeInfoProvider, is_fabric_attached, sort_nodes_by_name};
pub use provider::{StaticTemplateProvider, TemplateNodeInfoProvider};
pub use resolver::{LabelNodeGroupResolver, NodeGroupResolver};
pub use types::*;
