//! HTTP request shell
//!
//! `GET /` health, `POST /chat` answers, `GET /list_by_role` rosters.

pub mod handler;
pub mod models;
pub mod server;

pub use handler::{ApiError, AppState};
pub use server::{router, HttpServer};
