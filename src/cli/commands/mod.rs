//! Command handlers.

pub mod ask;
pub mod config;
pub mod context;
pub mod ingest;
pub mod serve;
