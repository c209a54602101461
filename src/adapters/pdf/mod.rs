//! PDF parsing adapters.

pub mod lopdf_parser;

pub use lopdf_parser::LopdfParser;
