//! Template processing error types.

use thiserror::Error;

pub type AutoscalerResult<T> = Result<T, AutoscalerError>;

/// Failure reported by a [`NodeGroupResolver`](crate::NodeGroupResolver).
#[derive(Debug, Error)]
#[error("failed to resolve node group for node {node}: {reason}")]
pub struct ResolverError {
    pub node: String,
    pub reason: String,
}

impl ResolverError {
    pub fn new(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            reason: reason.into(),
        }
    }
}

/// Coarse classification of an [`AutoscalerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CloudProvider,
    TemplateProvider,
}

#[derive(Debug, Error)]
pub enum AutoscalerError {
    #[error("cloud provider error: {0}")]
    CloudProvider(#[from] ResolverError),

    #[error("template provider error: {0}")]
    TemplateProvider(String),
}

impl AutoscalerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AutoscalerError::CloudProvider(_) => ErrorKind::CloudProvider,
            AutoscalerError::TemplateProvider(_) => ErrorKind::TemplateProvider,
        }
    }
}
