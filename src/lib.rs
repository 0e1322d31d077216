//! Onboarding Buddy
//!
//! A retrieval-augmented assistant for new employees. A question is answered
//! from company policy text only, and the answer is personalized with the
//! asker's organizational context.
//!
//! # Architecture
//!
//! - [`graph`]: employee context and role rosters (Neo4j or an in-memory directory)
//! - [`embed`]: text embeddings (Ollama, OpenAI, offline mock)
//! - [`vector`]: policy chunk search (Pinecone or an in-memory cosine store)
//! - [`llm`]: completions (Ollama, OpenAI, offline mock)
//! - [`rag`]: the answer orchestrator and its grounding prompt
//! - [`ingest`]: chunking and upload of policy documents
//! - [`http`]: the REST shell
//! - [`bootstrap`]: builds and wires every client from [`config::AppConfig`]
//!
//! ## Example Usage
//!
//! ```no_run
//! use onboarding_buddy::{build_services, AppConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let services = build_services(&config).await?;
//! let result = services.orchestrator.answer_question("EMP001", "How many leave days do I get?", true).await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod embed;
pub mod error;
pub mod graph;
pub mod http;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod vector;

// Re-export main types for convenience
pub use bootstrap::{build_services, BootstrapError, Services};
pub use config::AppConfig;
pub use error::{RagError, RagResult, Stage};
pub use graph::{GraphContext, GraphError, Role, RosterEntry, UserContext};
pub use rag::{AnswerOrchestrator, AnswerResult, USER_NOT_FOUND};
pub use vector::{MetadataFilter, PolicySearch, RetrievedChunk};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
