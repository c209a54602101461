//! Domain layer for pdfchat
//!
//! This module contains the pipeline's models, error taxonomy and the port
//! traits that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{PipelineError, PipelineResult};
