//! Embedding provider boundary.
//!
//! The engine only needs `text -> vector`. `HttpEmbeddingProvider` talks to
//! a remote embedding proxy over HTTP(S); tests substitute in-process
//! implementations.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::error::EmbeddingError;
use crate::core::config::EmbeddingConfig;

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Boxed future returned by [`EmbeddingProvider::embed`].
pub type EmbeddingFuture<'a> = Pin<Box<dyn Future<Output = EmbeddingResult<Vec<f32>>> + Send + 'a>>;

/// Something that turns text into an embedding vector.
///
/// Implementations must use the same model that embedded the stored
/// entries, otherwise the vectors are not comparable.
pub trait EmbeddingProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> EmbeddingFuture<'a>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<Vec<f32>>,
}

const DEFAULT_ERROR_MESSAGE: &str = "embedding server error";

/// Client for an embedding proxy that accepts `{"text": ...}` and answers
/// `{"embedding": [...]}`.
///
/// One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> EmbeddingResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| EmbeddingError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(EmbeddingError::InvalidEndpoint {
                url: endpoint.to_string(),
                message: "scheme must be http or https".to_string(),
            });
        }
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> EmbeddingResult<Self> {
        Self::new(&config.endpoint, config.timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        parse_embedding(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout(self.timeout)
        } else {
            EmbeddingError::Http(err)
        }
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed<'a>(&'a self, text: &'a str) -> EmbeddingFuture<'a> {
        Box::pin(self.request(text))
    }

    fn name(&self) -> &str {
        self.endpoint.as_str()
    }
}

/// Extract the vector from a success body; a missing or empty array is an
/// unusable response.
fn parse_embedding(body: &[u8]) -> EmbeddingResult<Vec<f32>> {
    let parsed: EmbedResponse = serde_json::from_slice(body)
        .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
    match parsed.embedding {
        Some(vector) if !vector.is_empty() => Ok(vector),
        Some(_) => Err(EmbeddingError::MalformedResponse(
            "empty embedding array".to_string(),
        )),
        None => Err(EmbeddingError::MalformedResponse(
            "missing embedding array".to_string(),
        )),
    }
}

/// Message from an error body: `{"error": "..."}` or `{"error": {"message": "..."}}`.
fn error_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return DEFAULT_ERROR_MESSAGE.to_string(),
    };
    let error = &value["error"];
    error
        .as_str()
        .or_else(|| error["message"].as_str())
        .unwrap_or(DEFAULT_ERROR_MESSAGE)
        .to_string()
}
