use anyhow::Result;

use crate::cli::output::print_json;
use crate::domain::models::Config;

const REDACTED: &str = "[REDACTED]";

/// Copy of `config` with credentials masked.
pub fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    };
    mask(&mut config.embedding.api_key);
    mask(&mut config.llm.api_key);
    mask(&mut config.vector_index.pinecone.api_key);
    config
}

/// Handle `pdfchat config`
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let config = redacted(config);
    if json {
        print_json(&config)
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
        Ok(())
    }
}
