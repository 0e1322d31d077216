//! Onboarding SDK, a client library for Onboarding Buddy
//!
//! Provides two client implementations:
//!
//! - **`EmbeddedClient`**: in-process, no network. Calls the answer
//!   orchestrator directly. Handy for tests and scripts.
//! - **`RemoteClient`**: talks to a running server over HTTP.
//!
//! Both implement the `OnboardingClient` trait.
//!
//! # Quick Start
//!
//! ```no_run
//! use onboarding_sdk::{ChatRequest, OnboardingClient, RemoteClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RemoteClient::new("http://localhost:8000");
//!     let interns = client.list_by_role("intern").await.unwrap();
//!     let reply = client
//!         .chat(&ChatRequest::new(&interns[0].id, "How many leave days do I get?"))
//!         .await
//!         .unwrap();
//!     println!("{}", reply.answer);
//! }
//! ```

pub mod client;
pub mod embedded;
pub mod error;
pub mod remote;

pub use client::OnboardingClient;
pub use embedded::EmbeddedClient;
pub use error::{SdkError, SdkResult};
pub use remote::RemoteClient;

// Wire types shared with the server
pub use onboarding_buddy::http::models::{ChatRequest, ChatResponse, ErrorResponse, HealthStatus, RosterResponse};
pub use onboarding_buddy::{Role, RosterEntry};

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
