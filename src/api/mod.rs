//! HTTP surface for the analyzer.
//!
//! `api_router()` returns a composable `Router`; `server::serve` binds it
//! and runs until shutdown.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use types::ApiContext;
