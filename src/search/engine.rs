//! Search Engine - combines the embedding provider with similarity ranking

use std::sync::Arc;

use super::error::{EmbeddingError, SearchError};
use super::latest::{SearchSequencer, Sequenced};
use super::provider::{EmbeddingProvider, HttpEmbeddingProvider};
use super::ranking::{rank, ScoredEntry, SearchOptions};
use crate::core::config::DiaryConfig;
use crate::core::entry::DiaryEntry;

/// Similarity search over diary entries.
///
/// Stateless between calls: candidates are supplied per search and never
/// mutated, so one engine can serve concurrent searches.
#[derive(Clone)]
pub struct SearchEngine {
    provider: Arc<dyn EmbeddingProvider>,
    options: SearchOptions,
}

impl SearchEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, options: SearchOptions) -> Self {
        Self { provider, options }
    }

    /// Engine backed by the HTTP provider described in `config`.
    pub fn from_config(config: &DiaryConfig) -> Result<Self, EmbeddingError> {
        let provider = HttpEmbeddingProvider::from_config(&config.embedding)?;
        Ok(Self::new(Arc::new(provider), config.search))
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Rank `candidates` by similarity to `query_text`.
    ///
    /// Fails with `InvalidQuery` before any network call when the trimmed
    /// query is empty, and with `EmbeddingUnavailable` when the provider
    /// fails. Candidates without a usable vector are skipped silently.
    pub async fn search<'a>(
        &self,
        query_text: &str,
        candidates: &'a [DiaryEntry],
    ) -> Result<Vec<ScoredEntry<'a>>, SearchError> {
        let query = validate_query(query_text)?;
        self.embed_and_rank(query, candidates).await
    }

    /// Like [`search`](Self::search), but discards the result if another
    /// search was issued on `sequencer` while this one was waiting for its
    /// embedding. Empty queries are rejected without taking a ticket.
    pub async fn search_latest<'a>(
        &self,
        sequencer: &SearchSequencer,
        query_text: &str,
        candidates: &'a [DiaryEntry],
    ) -> Result<Sequenced<Vec<ScoredEntry<'a>>>, SearchError> {
        let query = validate_query(query_text)?;
        let ticket = sequencer.issue();

        let result = self.embed_and_rank(query, candidates).await;

        if !sequencer.is_current(ticket) {
            tracing::debug!(?ticket, "discarding superseded search");
            return Ok(Sequenced::Superseded);
        }
        result.map(Sequenced::Current)
    }

    async fn embed_and_rank<'a>(
        &self,
        query: &str,
        candidates: &'a [DiaryEntry],
    ) -> Result<Vec<ScoredEntry<'a>>, SearchError> {
        let query_vector = self.provider.embed(query).await.map_err(|e| {
            tracing::warn!(provider = self.provider.name(), error = %e, "embedding request failed");
            SearchError::EmbeddingUnavailable(e)
        })?;

        if query_vector.is_empty() {
            return Err(SearchError::EmbeddingUnavailable(
                EmbeddingError::MalformedResponse("empty query embedding".to_string()),
            ));
        }

        tracing::debug!(dimension = query_vector.len(), "query embedded");
        Ok(rank(&query_vector, candidates, &self.options))
    }
}

fn validate_query(query_text: &str) -> Result<&str, SearchError> {
    let query = query_text.trim();
    if query.is_empty() {
        Err(SearchError::InvalidQuery)
    } else {
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::provider::EmbeddingFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Provider returning canned vectors and counting calls.
    struct FixedProvider {
        vectors: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(pairs: Vec<(&str, Vec<f32>)>) -> Self {
            Self {
                vectors: pairs
                    .into_iter()
                    .map(|(text, v)| (text.to_string(), v))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddingProvider for FixedProvider {
        fn embed<'a>(&'a self, text: &'a str) -> EmbeddingFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = self.vectors.get(text).cloned().ok_or_else(|| EmbeddingError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
            Box::pin(async move { result })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Provider whose responses are released by the test.
    struct GatedProvider {
        gates: Mutex<HashMap<String, oneshot::Receiver<Vec<f32>>>>,
    }

    impl EmbeddingProvider for GatedProvider {
        fn embed<'a>(&'a self, text: &'a str) -> EmbeddingFuture<'a> {
            let gate = self.gates.lock().unwrap().remove(text);
            Box::pin(async move {
                match gate {
                    Some(rx) => rx.await.map_err(|_| {
                        EmbeddingError::MalformedResponse("gate dropped".to_string())
                    }),
                    None => Err(EmbeddingError::MalformedResponse("no gate".to_string())),
                }
            })
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn embedded(id: &str, vector: &[f32]) -> DiaryEntry {
        DiaryEntry {
            id: Some(id.to_string()),
            title: id.to_string(),
            embedding: Some(vector.to_vec()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_trims_query() {
        let provider = Arc::new(FixedProvider::new(vec![("ocean", vec![1.0, 0.0])]));
        let engine = SearchEngine::new(provider.clone(), SearchOptions::default());
        let candidates = vec![embedded("a", &[1.0, 0.2]), embedded("b", &[0.0, 1.0])];

        let results = engine.search("  ocean \n", &candidates).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), "a");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_call() {
        let provider = Arc::new(FixedProvider::new(vec![]));
        let engine = SearchEngine::new(provider.clone(), SearchOptions::default());

        for query in ["", "   ", "\t\n"] {
            assert!(matches!(
                engine.search(query, &[]).await,
                Err(SearchError::InvalidQuery)
            ));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_whole_failure() {
        let provider = Arc::new(FixedProvider::new(vec![]));
        let engine = SearchEngine::new(provider, SearchOptions::default());
        let candidates = vec![embedded("a", &[1.0, 0.0])];

        assert!(matches!(
            engine.search("anything", &candidates).await,
            Err(SearchError::EmbeddingUnavailable(EmbeddingError::Status { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn test_empty_query_vector_is_unavailable() {
        let provider = Arc::new(FixedProvider::new(vec![("q", vec![])]));
        let engine = SearchEngine::new(provider, SearchOptions::default());

        assert!(matches!(
            engine.search("q", &[]).await,
            Err(SearchError::EmbeddingUnavailable(EmbeddingError::MalformedResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_with_options() {
        let provider = Arc::new(FixedProvider::new(vec![("q", vec![1.0, 0.0])]));
        let options = SearchOptions {
            limit: 1,
            ..Default::default()
        };
        let engine = SearchEngine::new(provider, SearchOptions::default()).with_options(options);
        let candidates = vec![embedded("a", &[1.0, 0.0]), embedded("b", &[1.0, 0.1])];

        let results = engine.search("q", &candidates).await.unwrap();
        assert_eq!(engine.options().limit, 1);
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_search_is_superseded() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let provider = GatedProvider {
            gates: Mutex::new(HashMap::from([
                ("first".to_string(), first_rx),
                ("second".to_string(), second_rx),
            ])),
        };
        let engine = SearchEngine::new(Arc::new(provider), SearchOptions::default());
        let sequencer = SearchSequencer::new();
        let candidates = vec![embedded("x", &[1.0, 0.0]), embedded("y", &[0.0, 1.0])];

        let first = engine.search_latest(&sequencer, "first", &candidates);
        let second = engine.search_latest(&sequencer, "second", &candidates);

        let release = async {
            tokio::task::yield_now().await;
            second_tx.send(vec![0.0, 1.0]).unwrap();
            tokio::task::yield_now().await;
            first_tx.send(vec![1.0, 0.0]).unwrap();
        };

        let (first, second, ()) = tokio::join!(first, second, release);

        assert_eq!(first.unwrap(), Sequenced::Superseded);
        let second = second.unwrap().into_current().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id(), "y");
    }

    #[tokio::test]
    async fn test_empty_query_does_not_supersede() {
        let provider = Arc::new(FixedProvider::new(vec![("q", vec![1.0, 0.0])]));
        let engine = SearchEngine::new(provider, SearchOptions::default());
        let sequencer = SearchSequencer::new();
        let candidates = vec![embedded("a", &[1.0, 0.0])];

        let ticket_before = sequencer.issue();
        assert!(matches!(
            engine.search_latest(&sequencer, "  ", &candidates).await,
            Err(SearchError::InvalidQuery)
        ));
        assert!(sequencer.is_current(ticket_before));

        let outcome = engine.search_latest(&sequencer, "q", &candidates).await.unwrap();
        assert_eq!(outcome.into_current().map(|r| r.len()), Some(1));
    }
}
