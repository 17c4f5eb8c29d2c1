//! # Dataset Tooling
//!
//! Offline batch utilities that build the knowledge base and turn model output into
//! training and preference data. Every command reads and writes JSON or JSON Lines
//! (UTF-8, non-ASCII kept as is) and is safe to re-run: long-running commands resume
//! from what their output file already holds.

pub mod answers;
pub mod checkpoint;
pub mod clean;
pub mod convert;
pub mod corpus;
pub mod export;
pub mod io;
pub mod judge;
pub mod label;
pub mod merge;
pub mod pairing;
pub mod questions;
pub mod select;
pub mod synth;

use crate::{errors::PromptError, providers::store::SearchError};
use std::path::Path;
use thiserror::Error;

/// Errors raised by the batch dataset utilities.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input in '{path}': {reason}")]
    InvalidInput { path: String, reason: String },
    #[error("Vector store error: {0}")]
    Search(#[from] SearchError),
    #[error("Inference error: {0}")]
    Prompt(#[from] PromptError),
}

impl DatasetError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
