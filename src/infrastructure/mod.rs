//! Infrastructure layer module
//!
//! Cross-cutting plumbing shared by the adapters and entry points:
//! - Configuration loading (figment)
//! - HTTP client support (retry, rate limiting, SSE)
//! - Logging
//! - Application wiring

pub mod config;
pub mod http_client;
pub mod logging;
pub mod setup;

pub use setup::{Adapters, AppContext};
