//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use crate::domain::errors::PipelineError;

/// Print a failed command's error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map_or("ERROR", PipelineError::code);

    if json {
        let body = serde_json::json!({
            "error": format!("{err:#}"),
            "code": code,
        });
        println!("{body}");
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1);
}
