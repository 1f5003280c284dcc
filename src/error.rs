use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DepGraphError {
    #[error("Graph store has been closed")]
    StoreClosed,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid version in coordinate '{coordinate}': {reason}")]
    InvalidVersion { coordinate: String, reason: String },
    #[error("Selection conflict: {0}")]
    SelectionConflict(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Graph driver error: {0}")]
    Driver(String),
}
