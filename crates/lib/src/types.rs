use crate::constants::{DEFAULT_COMPLEX_THRESHOLD, DEFAULT_SPECIFIC_THRESHOLD, DEFAULT_TOP_K};
use crate::errors::PromptError;
use crate::providers::{ai::AiProvider, store::VectorStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// --- Retrieval data model ---

/// Law metadata attached to every stored chunk (UU, BAB, Pasal, Ayat, Sumber).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub law: String,
    #[serde(default)]
    pub chapter: String,
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub paragraph: String,
    #[serde(default)]
    pub source: String,
}

impl ChunkMetadata {
    /// Renders `"{law} Pasal {article} Ayat {paragraph}"` without doubling a
    /// `Pasal` prefix that the raw corpus sometimes keeps.
    pub fn citation(&self) -> String {
        let article = self
            .article
            .trim()
            .strip_prefix("Pasal ")
            .unwrap_or(self.article.trim());
        format!(
            "{} Pasal {} Ayat {}",
            self.law.trim(),
            article,
            self.paragraph.trim()
        )
        .trim()
        .to_string()
    }
}

/// How a vector store reports similarity. Distances are lower-is-better,
/// relevance is higher-is-better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreConvention {
    /// Cosine distance in `[0, 2]`.
    #[default]
    CosineDistance,
    /// Euclidean distance between unit vectors.
    L2Distance,
    /// Already a relevance score in `[0, 1]`.
    Relevance,
}

/// A retrieval score normalised so that higher always means more relevant.
///
/// Every threshold in this crate is expressed against this value, never against a
/// raw store score.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Confidence(f32);

impl Confidence {
    /// Wraps a relevance value, clamping it to `[0, 1]`. `NaN` becomes `0`.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Converts a raw store score using its declared convention.
    pub fn from_score(raw: f32, convention: ScoreConvention) -> Self {
        match convention {
            ScoreConvention::CosineDistance => Self::new(1.0 - raw),
            ScoreConvention::L2Distance => Self::new(1.0 - raw / std::f32::consts::SQRT_2),
            ScoreConvention::Relevance => Self::new(raw),
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub confidence: Confidence,
}

/// One row of the store's full dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// The answer mode chosen from retrieval confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Specific,
    Complex,
    None,
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnswerMode::Specific => "specific",
            AnswerMode::Complex => "complex",
            AnswerMode::None => "none",
        };
        f.write_str(name)
    }
}

/// Lower bounds on [`Confidence`] for the SPECIFIC and COMPLEX bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub specific: f32,
    pub complex: f32,
}

impl ConfidenceThresholds {
    /// Validates `0 <= complex <= specific <= 1`.
    pub fn new(specific: f32, complex: f32) -> Result<Self, PromptError> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !in_range(specific) || !in_range(complex) || complex > specific {
            return Err(PromptError::InvalidThresholds(format!(
                "expected 0 <= complex ({complex}) <= specific ({specific}) <= 1"
            )));
        }
        Ok(Self { specific, complex })
    }
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            specific: DEFAULT_SPECIFIC_THRESHOLD,
            complex: DEFAULT_COMPLEX_THRESHOLD,
        }
    }
}

/// The classifier's output for exactly one retrieval call.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    pub contexts: Vec<String>,
    pub sources: Vec<String>,
    pub mode: AnswerMode,
}

/// Everything the prompt assembler needs for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub question: String,
    pub combined_context: String,
    pub combined_sources: String,
    pub mode: AnswerMode,
}

/// The assembler's output: either a refusal for the caller or a system instruction
/// for the inference engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembledPrompt {
    Refusal(String),
    Instruction(String),
}

impl AssembledPrompt {
    pub fn as_str(&self) -> &str {
        match self {
            AssembledPrompt::Refusal(s) | AssembledPrompt::Instruction(s) => s,
        }
    }
}

/// Trimmed model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
}

/// Sampling parameters passed to the inference engine on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl DecodingConfig {
    /// Looser sampling for preference data, so answers to one question differ.
    pub fn answer_sampling() -> Self {
        Self {
            temperature: 0.3,
            repeat_penalty: 1.1,
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.2,
            top_p: 0.8,
            repeat_penalty: 1.2,
        }
    }
}

// --- Chatbot service ---

/// The chatbot: owns the long-lived inference engine and vector store handles and
/// runs one question at a time through retrieval, classification, prompting and
/// generation.
pub struct TaxBot {
    pub(crate) ai_provider: Arc<dyn AiProvider>,
    pub(crate) store: Arc<dyn VectorStore>,
    pub(crate) top_k: usize,
    pub(crate) thresholds: ConfidenceThresholds,
    pub(crate) decoding: DecodingConfig,
}

impl fmt::Debug for TaxBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaxBot")
            .field("top_k", &self.top_k)
            .field("thresholds", &self.thresholds)
            .field("decoding", &self.decoding)
            .finish_non_exhaustive()
    }
}

/// A builder for [`TaxBot`].
#[derive(Default)]
pub struct TaxBotBuilder {
    ai_provider: Option<Arc<dyn AiProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    top_k: Option<usize>,
    thresholds: Option<ConfidenceThresholds>,
    decoding: Option<DecodingConfig>,
}

impl TaxBotBuilder {
    /// Creates a new `TaxBotBuilder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use taxrag::TaxBotBuilder;
    ///
    /// let builder = TaxBotBuilder::new().top_k(5);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inference engine.
    pub fn ai_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Sets the vector store.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn decoding(mut self, decoding: DecodingConfig) -> Self {
        self.decoding = Some(decoding);
        self
    }

    /// Builds the `TaxBot`.
    ///
    /// Fails if either the inference engine or the vector store is missing.
    pub fn build(self) -> Result<TaxBot, PromptError> {
        let ai_provider = self.ai_provider.ok_or_else(|| {
            PromptError::MissingAiProvider("an inference engine must be set".to_string())
        })?;
        let store = self.store.ok_or(PromptError::MissingVectorStore)?;

        Ok(TaxBot {
            ai_provider,
            store,
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K).max(1),
            thresholds: self.thresholds.unwrap_or_default(),
            decoding: self.decoding.unwrap_or_default(),
        })
    }
}
