//! Errors surfaced by the answer pipeline

use crate::graph::GraphError;
use crate::llm::GenerationError;
use crate::vector::VectorError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage bounded by a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    UserLookup,
    Search,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::UserLookup => "user lookup",
            Stage::Search => "policy search",
            Stage::Generation => "generation",
        };
        f.write_str(name)
    }
}

/// Upstream failure while answering a question.
///
/// An unknown user is not an error; it is reported through the answer text.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Graph lookup failed: {0}")]
    Graph(#[from] GraphError),

    #[error("Policy search failed: {0}")]
    Search(#[from] VectorError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },
}

pub type RagResult<T> = Result<T, RagError>;

impl RagError {
    pub fn is_timeout(&self) -> bool {
        match self {
            RagError::Timeout { .. } => true,
            RagError::Generation(GenerationError::Timeout(_)) => true,
            RagError::Graph(GraphError::Timeout(_)) => true,
            RagError::Search(e) => e.is_timeout(),
            _ => false,
        }
    }
}
