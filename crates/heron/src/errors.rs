use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure while resolving or executing a single tool call.
///
/// These are conversation data, not host errors: the loop folds them back
/// into history as tool results so the model can see what went wrong and
/// adapt. They are serializable because they live inside persisted messages.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Tool timed out after {0}ms")]
    Timeout(u64),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// A failure that ends the current `chat` call.
///
/// Exactly three outcomes reach a caller: an answer, an exhausted iteration
/// budget, or a backend failure. Retries belong to a layer around the
/// provider, never inside the loop.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Provider request failed: {0}")]
    Provider(#[from] anyhow::Error),

    #[error("Provider did not respond within {0}ms")]
    ProviderTimedOut(u64),

    #[error("No final answer after {0} iterations")]
    MaxIterationsExceeded(usize),
}

/// A tool registration mistake, detected eagerly at setup time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateToolName(String),

    #[error("Invalid tool name: {0} (must match [a-zA-Z0-9_-]+)")]
    InvalidToolName(String),
}
