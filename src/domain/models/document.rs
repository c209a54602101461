//! Document domain models
//!
//! A document is an uploaded PDF identified by an opaque file key. Its pages
//! are transient: produced by parsing and consumed by chunking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of storing a document in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Opaque key under which the bytes were stored
    pub file_key: String,
    /// Display name supplied by the uploader
    pub file_name: String,
}

/// One page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    /// Extracted text
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Page text with newlines removed, the form that gets chunked.
    ///
    /// Extractors emit a newline per laid-out line, so wrapped sentences
    /// are rejoined by dropping them.
    pub fn normalized_text(&self) -> String {
        self.text.replace(['\n', '\r'], "")
    }
}

/// Vector index partition holding all records of one document.
///
/// Derived from the file key by dropping every non-ASCII character. Keys
/// that differ only in non-ASCII characters map to the same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn from_file_key(file_key: &str) -> Self {
        Self(file_key.chars().filter(char::is_ascii).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
