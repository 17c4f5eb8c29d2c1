//! Random selection of generated questions for answer sampling.

use super::questions::WindowQuestionRecord;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectedKind {
    #[serde(rename = "spesifik")]
    Specific,
    #[serde(rename = "studi_kasus")]
    CaseStudy,
}

/// A question picked for answer sampling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedQuestion {
    #[serde(rename = "type")]
    pub kind: SelectedKind,
    pub prompt: String,
}

/// Samples up to `per_kind` specific and `per_kind` case-study questions without
/// replacement. Specific questions come first in the result.
pub fn select_questions<R: Rng + ?Sized>(
    records: &[WindowQuestionRecord],
    per_kind: usize,
    rng: &mut R,
) -> Vec<SelectedQuestion> {
    fn non_empty(q: &Option<String>) -> Option<&str> {
        q.as_deref().filter(|s| !s.trim().is_empty())
    }
    let specific: Vec<&str> = records
        .iter()
        .filter_map(|r| non_empty(&r.question_spesifik))
        .collect();
    let case_study: Vec<&str> = records
        .iter()
        .filter_map(|r| non_empty(&r.question_studi_kasus))
        .collect();

    let pick = |pool: &[&str], kind: SelectedKind, rng: &mut R| -> Vec<SelectedQuestion> {
        pool.choose_multiple(rng, per_kind.min(pool.len()))
            .map(|q| SelectedQuestion {
                kind,
                prompt: (*q).to_string(),
            })
            .collect()
    };

    let mut selected = pick(&specific, SelectedKind::Specific, rng);
    selected.extend(pick(&case_study, SelectedKind::CaseStudy, rng));
    selected
}
