use std::io::Write;

use anyhow::{Context, Result};
use futures::StreamExt;

use crate::cli::output::{create_spinner, print_json};
use crate::cli::types::AskArgs;
use crate::domain::models::{ChatMessage, Namespace};
use crate::infrastructure::AppContext;

/// Handle `pdfchat ask`
pub async fn execute(app: &AppContext, args: AskArgs, json: bool) -> Result<()> {
    let namespace = Namespace::from_file_key(&args.file_key);
    let messages = [ChatMessage::user(args.question)];

    if args.no_stream || json {
        let spinner = create_spinner("Thinking", json);
        let answer = app.query.answer(&namespace, &messages).await;
        spinner.finish_and_clear();
        let answer = answer.context("Failed to answer question")?;

        if json {
            print_json(&serde_json::json!({ "fileKey": args.file_key, "answer": answer }))?;
        } else {
            println!("{answer}");
        }
        return Ok(());
    }

    let mut fragments = app
        .query
        .answer_stream(&namespace, &messages)
        .await
        .context("Failed to answer question")?;

    let mut stdout = std::io::stdout();
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment.context("Answer stream failed")?;
        stdout.write_all(fragment.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}
