use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::RetrievedChunk;

const INSTRUCTION: &str = "Answer the question based on the context below. If the question cannot \
be answered using the information provided answer with \"I don't know\".";

/// Client for the answer-generation collaborator. One prompt in, one
/// completion out; no streaming, no retries.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Builds the grounding prompt and invokes the generation model once.
pub struct Generator {
    provider: Arc<dyn LlmProvider>,
}

impl Generator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Empty context is passed through as-is; the model is expected to say
    /// it lacks sufficient information.
    pub async fn generate(&self, query: &str, context: &[RetrievedChunk]) -> Result<String> {
        let prompt = build_prompt(query, context);
        self.provider.complete(&prompt).await
    }
}

/// Context chunks in retrieval order separated by blank lines, then the
/// fixed instruction and the question.
pub fn build_prompt(query: &str, context: &[RetrievedChunk]) -> String {
    let context_text = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{INSTRUCTION}\n\nContext:\n{context_text}\n\nQuestion: {query}\n\nAnswer:")
}

/// Generation client for Ollama's `/api/generate` endpoint.
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(endpoint: &str, model: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .expect("default TLS backend available");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                Error::GenerationUnavailable(format!("generation service unreachable: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GenerationUnavailable(format!(
                "generation service returned {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|err| {
            Error::GenerationUnavailable(format!("malformed generation response: {err}"))
        })?;
        Ok(parsed.response)
    }
}
