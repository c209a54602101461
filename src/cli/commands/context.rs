use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{create_spinner, print_json, TableFormatter};
use crate::cli::types::ContextArgs;
use crate::domain::models::{Namespace, QueryMatch};
use crate::infrastructure::AppContext;
use crate::services::assemble_context;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextOutput<'a> {
    file_key: &'a str,
    matches: &'a [QueryMatch],
    context: &'a str,
}

/// Handle `pdfchat context`
pub async fn execute(app: &AppContext, args: ContextArgs, json: bool) -> Result<()> {
    let namespace = Namespace::from_file_key(&args.file_key);
    let retriever = app.query.retriever();

    let spinner = create_spinner("Retrieving context", json);
    let matches = retriever
        .relevant_matches(&args.query, &namespace)
        .await
        .context("Failed to retrieve context");
    spinner.finish_and_clear();
    let matches = matches?;
    let context = assemble_context(&matches, retriever.config().max_context_chars);

    if json {
        return print_json(&ContextOutput {
            file_key: &args.file_key,
            matches: &matches,
            context: &context,
        });
    }

    if matches.is_empty() {
        println!("No context scored above {:.2}.", retriever.config().score_threshold);
        return Ok(());
    }
    println!("{}", TableFormatter::new().format_matches(&matches));
    println!("\n{context}");
    Ok(())
}
