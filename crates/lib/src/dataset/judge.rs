//! Sources of human (or scripted) judgments for preference and label collection.

use super::DatasetError;
use std::io::{BufRead, Write};

/// Two answers to the same question, shown side by side.
#[derive(Debug, Clone, Copy)]
pub struct PairView<'a> {
    pub position: usize,
    pub total: usize,
    pub context: &'a str,
    pub source: &'a str,
    pub question: &'a str,
    pub answer_a: &'a str,
    pub answer_b: &'a str,
}

/// A single answer to rate.
#[derive(Debug, Clone, Copy)]
pub struct AnswerView<'a> {
    pub position: usize,
    pub total: usize,
    pub context: &'a str,
    pub question: &'a str,
    pub answer: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Good,
    Bad,
    Skip,
}

pub trait Judge {
    /// Chooses the better of two answers.
    fn compare(&mut self, pair: &PairView<'_>) -> Result<Preference, DatasetError>;

    /// Rates one answer as good or bad, or skips it.
    fn rate(&mut self, item: &AnswerView<'_>) -> Result<Rating, DatasetError>;
}

const RULE: &str = "──────────────────────────────────────────────";

/// A [`Judge`] that prompts a person on a terminal.
#[derive(Debug)]
pub struct TerminalJudge<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalJudge<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn write(&mut self, text: &str) -> Result<(), DatasetError> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|source| DatasetError::Io {
                path: "<terminal>".to_string(),
                source,
            })
    }

    /// Reads answers until one of `accepted` is entered.
    fn ask(&mut self, prompt: &str, accepted: &[&str], hint: &str) -> Result<String, DatasetError> {
        loop {
            self.write(prompt)?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|source| DatasetError::Io {
                    path: "<terminal>".to_string(),
                    source,
                })?;
            if read == 0 {
                return Err(DatasetError::Io {
                    path: "<terminal>".to_string(),
                    source: std::io::ErrorKind::UnexpectedEof.into(),
                });
            }
            let choice = line.trim().to_lowercase();
            if accepted.contains(&choice.as_str()) {
                return Ok(choice);
            }
            self.write(&format!("{hint}\n"))?;
        }
    }
}

impl<R: BufRead, W: Write> Judge for TerminalJudge<R, W> {
    fn compare(&mut self, pair: &PairView<'_>) -> Result<Preference, DatasetError> {
        let screen = format!(
            "===== Pair {}/{} =====\n\nContext:\n{}\n\nSumber: {}\n\nQuestion: {}\n\n{RULE}\nAnswer A:\n{}\n{RULE}\nAnswer B:\n{}\n{RULE}\n\n\
             Pilih jawaban yang lebih baik / lebih relevan (0 = A lebih baik, 1 = B lebih baik)\n",
            pair.position,
            pair.total,
            pair.context,
            pair.source,
            pair.question,
            pair.answer_a.trim(),
            pair.answer_b.trim()
        );
        self.write(&screen)?;
        let choice = self.ask(
            "Masukkan pilihan (0/1): ",
            &["0", "1"],
            "Input tidak valid! Harus 0 atau 1.",
        )?;
        Ok(if choice == "1" { Preference::B } else { Preference::A })
    }

    fn rate(&mut self, item: &AnswerView<'_>) -> Result<Rating, DatasetError> {
        let screen = format!(
            "{}\n[{}/{}]\nQuestion:\n{}\n\nContext:\n{}\n\nModel Answer:\n{}\n\n{}\n",
            "=".repeat(100),
            item.position,
            item.total,
            item.question,
            item.context,
            item.answer,
            "-".repeat(100)
        );
        self.write(&screen)?;
        let choice = self.ask(
            "Apakah jawaban ini bagus? (1 = ya, 0 = tidak, s = skip): ",
            &["1", "0", "s"],
            "Masukkan hanya 1, 0, atau s (skip)!",
        )?;
        Ok(match choice.as_str() {
            "1" => Rating::Good,
            "0" => Rating::Bad,
            _ => Rating::Skip,
        })
    }
}
