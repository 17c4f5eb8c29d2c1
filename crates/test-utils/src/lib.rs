use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, Once};
use taxrag::dataset::judge::{AnswerView, Judge, PairView, Preference, Rating};
use taxrag::dataset::DatasetError;
use taxrag::errors::PromptError;
use taxrag::providers::ai::{AiProvider, Embedder};
use taxrag::providers::store::{SearchError, SqliteStore, VectorStore};
use taxrag::types::{DecodingConfig, RetrievedChunk, StoredDocument};

// --- Test Setup ---

static INIT: Once = Once::new();

/// Initializes a tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A helper struct that owns an isolated in-memory store backed by [`MockEmbedder`].
pub struct TestSetup {
    pub store: SqliteStore,
    pub embedder: Arc<MockEmbedder>,
}

impl TestSetup {
    /// Creates a new, isolated in-memory store whose embedder knows `keywords`.
    pub async fn new(keywords: &[&str]) -> Result<Self> {
        let embedder = Arc::new(MockEmbedder::new(keywords));
        let store = SqliteStore::open(":memory:", embedder.clone()).await?;
        Ok(Self { store, embedder })
    }
}

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    responses: Arc<Mutex<Vec<(String, String)>>>,
    queue: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<(String, DecodingConfig)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a response for every prompt containing `key`.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.push((key.to_string(), response.to_string()));
    }

    /// Queues a one-shot response, consumed before any keyed response.
    pub fn push_response(&self, response: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
    }

    /// Queues a one-shot failure.
    pub fn push_error(&self, message: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// Retrieves the recorded prompts for assertion.
    pub fn get_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    /// Retrieves the decoding parameters of every call.
    pub fn get_decodings(&self) -> Vec<DecodingConfig> {
        self.calls.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str, decoding: &DecodingConfig) -> Result<String, PromptError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), *decoding));

        if let Some(next) = self.queue.lock().unwrap().pop_front() {
            return next.map_err(PromptError::AiApi);
        }

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if prompt.contains(key.as_str()) {
                return Ok(response.clone());
            }
        }

        Err(PromptError::AiApi(format!(
            "MockAiProvider: No response programmed for prompt. Got: '{prompt}'"
        )))
    }

    async fn probe(&self) -> Result<String, PromptError> {
        Ok("ok".to_string())
    }
}

// --- Mock Embedder ---

/// A deterministic bag-of-keywords embedder.
///
/// Each keyword is one dimension; a final dimension is set only when the text holds
/// none of the keywords, so unrelated texts are orthogonal to every keyword text.
#[derive(Debug)]
pub struct MockEmbedder {
    keywords: Vec<String>,
    calls: Mutex<usize>,
}

impl MockEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| lower.matches(k.as_str()).count() as f32)
            .collect();
        let matched = vector.iter().any(|v| *v > 0.0);
        vector.push(if matched { 0.0 } else { 1.0 });
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PromptError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.vector(text))
    }
}

// --- In-Memory Store ---

/// A [`VectorStore`] that returns fixed chunks and records every query.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub chunks: Vec<RetrievedChunk>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl InMemoryStore {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            chunks,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, SearchError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        Ok(self.chunks.iter().take(k).cloned().collect())
    }

    async fn get(&self) -> Result<Vec<StoredDocument>, SearchError> {
        Ok(self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| StoredDocument {
                id: i.to_string(),
                text: c.text.clone(),
                metadata: c.metadata.clone(),
            })
            .collect())
    }
}

// --- Scripted Judge ---

/// A [`Judge`] that replays scripted decisions and records what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    preferences: VecDeque<Preference>,
    ratings: VecDeque<Rating>,
    pub asked: Vec<String>,
}

impl ScriptedJudge {
    pub fn with_preferences(preferences: impl IntoIterator<Item = Preference>) -> Self {
        Self {
            preferences: preferences.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        Self {
            ratings: ratings.into_iter().collect(),
            ..Self::default()
        }
    }

    fn exhausted() -> DatasetError {
        DatasetError::Io {
            path: "<script>".to_string(),
            source: std::io::ErrorKind::UnexpectedEof.into(),
        }
    }
}

impl Judge for ScriptedJudge {
    fn compare(&mut self, pair: &PairView<'_>) -> Result<Preference, DatasetError> {
        self.asked
            .push(format!("{}#{}", pair.question, pair.position - 1));
        self.preferences.pop_front().ok_or_else(Self::exhausted)
    }

    fn rate(&mut self, item: &AnswerView<'_>) -> Result<Rating, DatasetError> {
        self.asked.push(format!("{}|{}", item.question, item.answer));
        self.ratings.pop_front().ok_or_else(Self::exhausted)
    }
}
