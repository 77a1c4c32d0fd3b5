//! Plumbing shared by the Vivah services: the API envelope and error codes,
//! bearer-token auth, tracing and metrics setup, and infrastructure clients.

pub mod clients;
pub mod errors;
pub mod middleware;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use types::*;
