//! # Chatbot Prompts
//!
//! Mode-specific system instructions for the tax assistant, the assembler that picks
//! between them, and best-effort parsers for the shapes those instructions ask for.

use crate::{
    constants::REFUSAL_MESSAGE,
    types::{AnswerMode, AssembledPrompt, PromptContext},
};
use regex::Regex;
use serde::Serialize;

/// System instruction for a confident single-passage match.
///
/// Placeholders: `{context}`, `{sources}`
pub const SPECIFIC_SYSTEM_PROMPT: &str = r#"Jawab pertanyaan berdasarkan konteks berikut:
{context}

Kamu adalah asisten ahli pajak Indonesia.
Jawaban harus faktual, to the point, dan menggunakan bahasa formal.
Jika informasi tidak ada di konteks atau pertanyaan tidak berkaitan dengan pajak,
jawab: "Maaf, saya tidak memiliki pemahaman tentang hal itu."

Sumber konteks:
{sources}

ATURAN JAWABAN:
- Sertakan sumber pasal di akhir kalimat dengan cara yang natural,
  misalnya: "sesuai dengan Pasal ... UU Nomor ... Tahun ...".
- Akhiri jawaban dengan satu baris sumber hukum dengan format:
  Source: Pasal {pasal} Ayat {ayat} UU {uu}
"#;

/// System instruction for a moderate-confidence match that needs synthesis.
///
/// Placeholders: `{context}`, `{sources}`
pub const COMPLEX_SYSTEM_PROMPT: &str = r#"Jawab pertanyaan berdasarkan konteks berikut:
{context}

Kamu adalah asisten ahli pajak Indonesia.
Jawaban berupa analisis, menggunakan bahasa formal dan akademis.
Jika informasi tidak ada di konteks atau pertanyaan tidak berkaitan dengan pajak,
jawab: "Maaf, saya tidak memiliki pemahaman tentang hal itu."

Sumber konteks:
{sources}

Gunakan FORMAT JAWABAN AKHIR berikut:

Sources Used:
[Daftar sumber UU dari konteks yang digunakan (minimal 2)]

Summary:
[Rangkuman inti analisis]

PILIH SATU BAGIAN SAJA di bawah ini, lalu isi dengan teks yang relevan:

[[ Conclusion ]]
[Tulis kesimpulan, JIKA analisis berfokus pada ringkasan temuan
dan implikasi logis dari data yang ada.]

ATAU

[[ Recommendation ]]
[Tulis rekomendasi, JIKA analisis berfokus pada usulan aksi,
kebijakan, atau langkah perbaikan di masa depan.]
"#;

/// Builds the system instruction for `ctx`, or the refusal when the mode is NONE.
///
/// Context and sources are embedded verbatim.
pub fn assemble(ctx: &PromptContext) -> AssembledPrompt {
    let template = match ctx.mode {
        AnswerMode::None => return AssembledPrompt::Refusal(REFUSAL_MESSAGE.to_string()),
        AnswerMode::Specific => SPECIFIC_SYSTEM_PROMPT,
        AnswerMode::Complex => COMPLEX_SYSTEM_PROMPT,
    };
    AssembledPrompt::Instruction(
        template
            .replace("{sources}", &ctx.combined_sources)
            .replace("{context}", &ctx.combined_context),
    )
}

// --- Output parsing ---

/// The trailing `Source: Pasal .. Ayat .. UU ..` line of a SPECIFIC answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub article: String,
    pub paragraph: Option<String>,
    pub law: String,
}

/// Extracts the last machine-parsable source line, if the model produced one.
pub fn parse_source_line(answer: &str) -> Option<Citation> {
    let re =
        Regex::new(r"(?mi)^\s*Source\s*:\s*Pasal\s+(\S+?)(?:\s+Ayat\s+(\S+?))?\s+UU\s+(.+?)\.?\s*$")
            .ok()?;
    re.captures_iter(answer)
        .last()
        .map(|caps| Citation {
            article: caps[1].to_string(),
            paragraph: caps.get(2).map(|m| m.as_str().to_string()),
            law: caps[3].trim().to_string(),
        })
}

/// Which closing section a COMPLEX answer chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClosingSection {
    Conclusion,
    Recommendation,
}

/// The sections of a COMPLEX answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredAnswer {
    pub sources: Vec<String>,
    pub summary: String,
    pub closing: ClosingSection,
    pub closing_text: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Sources,
    Summary,
    Closing(ClosingSection),
}

fn section_header(line: &str) -> Option<(Section, &str)> {
    let trimmed = line.trim().trim_start_matches(['*', '#', ' ']);
    let lower = trimmed.to_lowercase();
    let rest_after = |prefix_len: usize| trimmed[prefix_len..].trim_start_matches([':', '*', ' ']);

    if lower.starts_with("sources used") {
        return Some((Section::Sources, rest_after("sources used".len())));
    }
    if lower.starts_with("summary") {
        return Some((Section::Summary, rest_after("summary".len())));
    }
    let bare = lower.trim_matches(['[', ']', ' ', ':', '*']);
    if bare == "conclusion" {
        return Some((Section::Closing(ClosingSection::Conclusion), ""));
    }
    if bare == "recommendation" {
        return Some((Section::Closing(ClosingSection::Recommendation), ""));
    }
    None
}

/// Parses a COMPLEX answer into its sections.
///
/// Returns `None` when the summary or the closing section is missing, or when both
/// closing sections are present.
pub fn parse_structured_answer(answer: &str) -> Option<StructuredAnswer> {
    let mut current = Section::Preamble;
    let mut sources = Vec::new();
    let mut summary = Vec::new();
    let mut closing: Option<ClosingSection> = None;
    let mut closing_text = Vec::new();

    for line in answer.lines() {
        if let Some((section, inline)) = section_header(line) {
            if let Section::Closing(kind) = section {
                if closing.is_some_and(|c| c != kind) {
                    return None;
                }
                closing = Some(kind);
            }
            current = section;
            if inline.is_empty() {
                continue;
            }
            push_line(current, inline, &mut sources, &mut summary, &mut closing_text);
            continue;
        }
        push_line(current, line, &mut sources, &mut summary, &mut closing_text);
    }

    let summary = summary.join("\n").trim().to_string();
    let closing_text = closing_text.join("\n").trim().to_string();
    if summary.is_empty() || closing_text.is_empty() {
        return None;
    }

    Some(StructuredAnswer {
        sources,
        summary,
        closing: closing?,
        closing_text,
    })
}

fn push_line(
    section: Section,
    line: &str,
    sources: &mut Vec<String>,
    summary: &mut Vec<String>,
    closing_text: &mut Vec<String>,
) {
    match section {
        Section::Preamble => {}
        Section::Sources => {
            let item = line.trim().trim_start_matches(['-', '*', '•', ' ']).trim();
            if !item.is_empty() {
                sources.push(item.to_string());
            }
        }
        Section::Summary => summary.push(line.to_string()),
        Section::Closing(_) => closing_text.push(line.to_string()),
    }
}
