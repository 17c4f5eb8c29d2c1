//! # Shared Constants
//!
//! Default paths, thresholds and fixed user-facing strings shared by the chatbot
//! and the batch tooling. The CLI configuration layer uses these as its defaults.

/// The default path of the law-chunk vector store.
pub const DEFAULT_STORE_FILE: &str = "db/uu_pajak.db";

/// The refusal returned to the user when retrieval finds nothing relevant.
pub const REFUSAL_MESSAGE: &str = "Maaf, saya tidak memiliki pemahaman tentang hal itu.";

/// The context placeholder used when retrieval finds nothing relevant.
pub const NO_CONTEXT_MESSAGE: &str = "Maaf, tidak ada data yang relevan ditemukan.";

/// The placeholder written by batch generation when every attempt failed.
pub const GENERATION_FAILURE_PLACEHOLDER: &str = "Tidak dapat menghasilkan jawaban.";

/// Confidence at or above which a retrieval is answered in SPECIFIC mode.
pub const DEFAULT_SPECIFIC_THRESHOLD: f32 = 0.5;

/// Confidence at or above which a retrieval is answered in COMPLEX mode.
pub const DEFAULT_COMPLEX_THRESHOLD: f32 = 0.3;

/// Number of chunks retrieved per chatbot question.
pub const DEFAULT_TOP_K: usize = 3;

/// Separator between context blocks inside a prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";
