//! # Prompt Template Modules
//!
//! `chat` holds the chatbot's mode-specific instructions and output parsers;
//! `dataset` holds the templates used by the offline dataset tooling.

pub mod chat;
pub mod dataset;

pub use chat::{assemble, parse_source_line, parse_structured_answer, Citation, StructuredAnswer};
