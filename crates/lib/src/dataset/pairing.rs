//! Pairwise preference collection over sampled answers.
//!
//! Answers are grouped by question in first-seen order. Every unordered pair of a
//! group is shown to a [`Judge`] in lexicographic index order and the decision is
//! appended immediately. A `(question, pair_index)` key already present in the output
//! is never asked again.

use super::{
    answers::SampledAnswer,
    io,
    judge::{Judge, PairView, Preference},
    DatasetError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    path::Path,
};
use tracing::info;

/// One recorded preference decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub pair_index: usize,
    pub context: String,
    pub source: String,
    pub question: String,
    pub answer_a: String,
    pub answer_b: String,
    /// `1` when answer B was preferred, `0` for answer A.
    pub answer_b_preferred: u8,
}

/// Groups answers by question, keeping the order in which questions first appear.
pub fn group_by_question(answers: &[SampledAnswer]) -> Vec<(String, Vec<&SampledAnswer>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&SampledAnswer>)> = Vec::new();
    for answer in answers {
        match index.get(answer.question.as_str()) {
            Some(&i) => groups[i].1.push(answer),
            None => {
                index.insert(answer.question.as_str(), groups.len());
                groups.push((answer.question.clone(), vec![answer]));
            }
        }
    }
    groups
}

/// All unordered index pairs `(i, j)` with `i < j < n`, in lexicographic order.
/// The position of a pair in this list is its `pair_index`.
pub fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Reads the `(question, pair_index)` keys already decided in `output`.
pub fn completed_pairs(output: &Path) -> Result<HashSet<(String, usize)>, DatasetError> {
    let records: Vec<Value> = io::read_jsonl_or_empty(output)?;
    Ok(records
        .iter()
        .filter_map(|r| {
            let question = r.get("question")?.as_str()?;
            let pair_index = r.get("pair_index")?.as_u64()?;
            Some((question.to_string(), usize::try_from(pair_index).ok()?))
        })
        .collect())
}

/// Asks `judge` about every pair not yet decided and appends each decision to
/// `output` as soon as it is made. Returns the number of decisions made this run.
pub fn collect_preferences(
    answers: &[SampledAnswer],
    output: &Path,
    judge: &mut dyn Judge,
) -> Result<usize, DatasetError> {
    let groups = group_by_question(answers);
    let completed = completed_pairs(output)?;
    let total: usize = groups.iter().map(|(_, a)| pair_indices(a.len()).len()).sum();
    info!(
        "Total questions: {} | total pairs: {total} | already decided: {}",
        groups.len(),
        completed.len()
    );

    let mut decided = 0;
    for (question, group) in &groups {
        let pairs = pair_indices(group.len());
        for (pair_index, (i, j)) in pairs.iter().copied().enumerate() {
            if completed.contains(&(question.clone(), pair_index)) {
                continue;
            }
            let (a, b) = (group[i], group[j]);
            let view = PairView {
                position: pair_index + 1,
                total: pairs.len(),
                context: &a.context,
                source: &a.source,
                question,
                answer_a: &a.answer,
                answer_b: &b.answer,
            };
            let preference = judge.compare(&view)?;

            let record = PairRecord {
                pair_index,
                context: a.context.clone(),
                source: a.source.clone(),
                question: question.clone(),
                answer_a: a.answer.clone(),
                answer_b: b.answer.clone(),
                answer_b_preferred: u8::from(preference == Preference::B),
            };
            io::append_jsonl(output, std::slice::from_ref(&record))?;
            decided += 1;
        }
    }

    info!("Recorded {decided} preference decisions.");
    Ok(decided)
}
