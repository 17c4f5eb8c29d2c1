//! Normalises law records extracted from PDFs.
//!
//! * `Pasal`: the literal `"Pasal "` is removed.
//! * `Sumber`: a whole-field `(Sumber : X)` becomes `X`.
//! * `Isi`: inline `(Sumber : ..)` references are removed.
//!
//! Fields that are absent or not strings are left untouched.

use super::{io, DatasetError};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Compiled patterns for [`clean_record`].
#[derive(Debug, Clone)]
pub struct Cleaner {
    sumber: Regex,
    inline_sumber: Regex,
}

impl Cleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            sumber: Regex::new(r"^\(Sumber\s*:\s*(.*?)\)$")?,
            inline_sumber: Regex::new(r"\s*\(Sumber\s*:[^)]+\)")?,
        })
    }

    /// Cleans one record in place.
    pub fn clean_record(&self, record: &mut Value) {
        let Some(obj) = record.as_object_mut() else {
            return;
        };
        if let Some(Value::String(pasal)) = obj.get_mut("Pasal") {
            *pasal = pasal.replace("Pasal ", "").trim().to_string();
        }
        if let Some(Value::String(sumber)) = obj.get_mut("Sumber") {
            *sumber = self.sumber.replace(sumber, "$1").trim().to_string();
        }
        if let Some(Value::String(isi)) = obj.get_mut("Isi") {
            *isi = self.inline_sumber.replace_all(isi, "").trim().to_string();
        }
    }
}

/// Cleans `input` (JSON array or JSON Lines) and writes the result to `output` in the
/// format its extension implies. Returns the number of records written.
pub fn clean_file(input: &Path, output: &Path) -> Result<usize, DatasetError> {
    let cleaner = Cleaner::new().map_err(crate::errors::PromptError::from)?;
    let mut records = io::read_records(input)?;
    for record in &mut records {
        cleaner.clean_record(record);
    }
    io::write_records(output, &records)?;
    info!("Cleaned {} records into '{}'", records.len(), output.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cleans_pasal_and_sumber() {
        let cleaner = Cleaner::new().unwrap();
        let mut record = json!({"Pasal": "Pasal 5", "Sumber": "(Sumber : UU X)"});
        cleaner.clean_record(&mut record);
        assert_eq!(record, json!({"Pasal": "5", "Sumber": "UU X"}));
    }

    #[test]
    fn removes_inline_sources_from_isi() {
        let cleaner = Cleaner::new().unwrap();
        let mut record = json!({"Isi": "Wajib Pajak membayar pajak. (Sumber : UU 7/2021) Selesai."});
        cleaner.clean_record(&mut record);
        assert_eq!(record["Isi"], "Wajib Pajak membayar pajak. Selesai.");
    }

    #[test]
    fn leaves_non_strings_alone() {
        let cleaner = Cleaner::new().unwrap();
        let mut record = json!({"Pasal": 5, "Ayat": "1"});
        cleaner.clean_record(&mut record);
        assert_eq!(record, json!({"Pasal": 5, "Ayat": "1"}));
    }
}
