use sonar_core::{EvalError, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InspectError {
    #[error("code execution is disabled for this inspector")]
    CodeExecutionDisabled,
    #[error("no evaluator is installed")]
    NoEvaluator,
    #[error("node {0} is not tracked")]
    UnknownNode(NodeId),
    #[error("node {0} is not a component")]
    NotAComponent(NodeId),
    #[error("node {node} has no editable value at `{path}`")]
    InvalidPath { node: NodeId, path: String },
    #[error("{0}")]
    Evaluation(#[from] EvalError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("pick was cancelled")]
    Cancelled,
    #[error("picked element is not tracked")]
    Untracked,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid inspector config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("retry delay must be a finite, non-negative number of milliseconds, got {0}")]
    RetryDelay(f64),
}
