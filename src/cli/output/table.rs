//! Table output for CLI commands using comfy-table.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::QueryMatch;
use crate::services::IngestionReport;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    pub const fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Key/value summary of an ingestion run
    pub fn format_ingestion(&self, report: &IngestionReport) -> String {
        let mut table = Self::base_table();
        table.set_header(vec![self.header("Field"), self.header("Value")]);
        table.add_row(vec![Cell::new("File key"), Cell::new(&report.file_key)]);
        table.add_row(vec![Cell::new("Namespace"), Cell::new(report.namespace.as_str())]);
        table.add_row(vec![Cell::new("Pages"), Cell::new(report.pages)]);
        table.add_row(vec![Cell::new("Chunks"), Cell::new(report.chunks)]);
        table.add_row(vec![Cell::new("Records"), Cell::new(report.records)]);
        table.add_row(vec![Cell::new("Stage"), Cell::new(report.stage)]);
        table.to_string()
    }

    /// Retrieved matches, best first
    pub fn format_matches(&self, matches: &[QueryMatch]) -> String {
        let mut table = Self::base_table();
        table.set_header(vec![
            self.header("Score"),
            self.header("Page"),
            self.header("Text"),
        ]);

        for m in matches {
            let mut score = Cell::new(format!("{:.3}", m.score)).set_alignment(CellAlignment::Right);
            if self.use_colors {
                score = score.fg(Color::Green);
            }
            table.add_row(vec![
                score,
                Cell::new(m.metadata.page_number).set_alignment(CellAlignment::Right),
                Cell::new(truncate_text(&m.metadata.text, 80)),
            ]);
        }
        table.to_string()
    }

    fn header(&self, title: &str) -> Cell {
        let cell = Cell::new(title).add_attribute(Attribute::Bold);
        if self.use_colors {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }

    fn base_table() -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }
}

/// Truncate to `max_chars` characters, appending "..." when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    if env::var("TERM").is_ok_and(|term| term == "dumb") {
        return false;
    }
    console::colors_enabled()
}
