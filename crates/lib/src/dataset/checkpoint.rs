//! Resumable JSON Lines output for long generation loops.
//!
//! The writer assumes one output line per processed input record, so the number of
//! lines already in the file is the index of the next input record to process. A crash
//! loses at most one interval of buffered records.

use super::{io, DatasetError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct CheckpointWriter<T> {
    path: PathBuf,
    interval: usize,
    resume_offset: usize,
    buffer: Vec<T>,
    written: usize,
}

impl<T: Serialize> CheckpointWriter<T> {
    /// Opens `path` for appending, flushing every `interval` records (at least 1).
    pub fn open(path: &Path, interval: usize) -> Result<Self, DatasetError> {
        let resume_offset = io::count_lines(path)?;
        if resume_offset > 0 {
            info!(
                "Resuming from checkpoint '{}' ({resume_offset} records already processed).",
                path.display()
            );
        }
        Ok(Self {
            path: path.to_path_buf(),
            interval: interval.max(1),
            resume_offset,
            buffer: Vec::new(),
            written: 0,
        })
    }

    /// The number of input records already processed in earlier runs.
    pub fn resume_offset(&self) -> usize {
        self.resume_offset
    }

    /// Records written by this writer, including ones still buffered.
    pub fn pushed(&self) -> usize {
        self.written + self.buffer.len()
    }

    /// Buffers one record, appending the buffer to the file when it reaches the interval.
    pub fn push(&mut self, record: T) -> Result<(), DatasetError> {
        self.buffer.push(record);
        if self.buffer.len() >= self.interval {
            self.flush()?;
        }
        Ok(())
    }

    /// Appends any buffered records to the file.
    pub fn flush(&mut self) -> Result<(), DatasetError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        io::append_jsonl(&self.path, &self.buffer)?;
        self.written += self.buffer.len();
        info!(
            "Checkpoint saved to '{}' ({} records this run).",
            self.path.display(),
            self.written
        );
        self.buffer.clear();
        Ok(())
    }

    /// Flushes the remainder and returns the number of records written this run.
    pub fn finish(mut self) -> Result<usize, DatasetError> {
        self.flush()?;
        Ok(self.written)
    }
}
