use regex::{Captures, Regex};
use std::fmt;
use std::sync::LazyLock;

/// Scrubs API keys, bearer tokens and credential fields from text
///
/// Applied to upstream error bodies before they are logged or surfaced,
/// since providers echo rejected keys back in their error messages.
#[derive(Clone)]
pub struct SecretScrubber {
    api_key_pattern: Regex,
    bearer_pattern: Regex,
    header_pattern: Regex,
    field_pattern: Regex,
}

impl SecretScrubber {
    /// Build the scrubber.
    ///
    /// # Errors
    /// Returns an error if a built-in pattern fails to compile
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // OpenAI (sk-..., sk-proj-...) and Pinecone (pcsk_...) keys
            api_key_pattern: Regex::new(r"\b(?:sk-[A-Za-z0-9_-]{20,}|pcsk_[A-Za-z0-9_]{20,})")?,
            bearer_pattern: Regex::new(r"Bearer\s+[A-Za-z0-9\-_.=]+")?,
            header_pattern: Regex::new(r"(?i)(api-key:\s*)[A-Za-z0-9\-_.]+")?,
            field_pattern: Regex::new(
                r#"(?i)(["']?(?:api_key|apikey|token|secret|password)["']?\s*[:=]\s*)["']?[^"'\s,}]+["']?"#,
            )?,
        })
    }

    /// Scrub a message of sensitive data
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .api_key_pattern
            .replace_all(message, "[API_KEY_REDACTED]");
        let scrubbed = self
            .bearer_pattern
            .replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        let scrubbed = self
            .header_pattern
            .replace_all(&scrubbed, |caps: &Captures| format!("{}[REDACTED]", &caps[1]));
        let scrubbed = self
            .field_pattern
            .replace_all(&scrubbed, |caps: &Captures| format!("{}\"[REDACTED]\"", &caps[1]));
        scrubbed.into_owned()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}

static SCRUBBER: LazyLock<Option<SecretScrubber>> = LazyLock::new(|| SecretScrubber::new().ok());

/// Scrub `message` with the process-wide scrubber.
pub fn scrub_secrets(message: &str) -> String {
    SCRUBBER.as_ref().map_or_else(
        || "[UNSCRUBBED_CONTENT_WITHHELD]".to_string(),
        |scrubber| scrubber.scrub_message(message),
    )
}
