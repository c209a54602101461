use anyhow::{Context, Result};
use bytes::Bytes;
use serde::Serialize;

use crate::cli::output::{create_spinner, print_json, ProgressBarExt, TableFormatter};
use crate::cli::types::IngestArgs;
use crate::infrastructure::AppContext;
use crate::services::IngestionReport;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestOutput<'a> {
    file_name: &'a str,
    #[serde(flatten)]
    report: &'a IngestionReport,
}

/// Handle `pdfchat ingest`
pub async fn execute(app: &AppContext, args: IngestArgs, json: bool) -> Result<()> {
    let data = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let file_name = match args.name {
        Some(name) => name,
        None => args
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("Path has no file name")?,
    };

    let spinner = create_spinner(format!("Uploading {file_name}"), json);
    let uploaded = app
        .blob_store
        .upload(Bytes::from(data), &file_name)
        .await
        .context("Failed to store document")?;

    let result = app
        .ingestion
        .ingest_with_observer(&uploaded.file_key, &|stage| spinner.set_message(format!("{file_name}: {stage}")))
        .await;
    let report = match result {
        Ok(report) => {
            spinner.finish_success(format!("Ingested {file_name}"));
            report
        }
        Err(err) => {
            spinner.finish_error(format!("Failed to ingest {file_name}"));
            return Err(err).context("Ingestion failed");
        }
    };

    if json {
        print_json(&IngestOutput {
            file_name: &file_name,
            report: &report,
        })?;
    } else {
        println!("{}", TableFormatter::new().format_ingestion(&report));
    }
    Ok(())
}
