//! Recommendation model abstraction
//!
//! Provides a unified interface over structured-output generation providers:
//! - Google Gemini (native response schemas)
//! - OpenAI-compatible endpoints (OpenAI, Ollama, LM Studio)
//! - Mock provider for tests
//!
//! The contract is `generate(prompt, schema) -> JSON`; provider wire formats
//! and failures never leak past this module.

use crate::config::RecommenderConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Trait for schema-constrained generation
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Generate a JSON document satisfying the given output schema
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<Value>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

// ============================================================================
// Gemini
// ============================================================================

/// Google Gemini client
pub struct GeminiRecommender {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig<'a>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig<'a> {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'a str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

impl GeminiRecommender {
    /// Create a new Gemini client
    pub fn new(config: &RecommenderConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl Recommender for GeminiRecommender {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<Value> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .client
            .post(self.url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::RecommendationError {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RecommendationError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: GeminiResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::RecommendationError {
                    message: format!("Failed to parse response: {}", e),
                })?;

        if let Some(error) = result.error {
            return Err(AppError::RecommendationError {
                message: error.message,
            });
        }

        let text = result
            .candidates
            .and_then(|mut c| c.pop())
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::RecommendationError {
                message: "Empty response from model".to_string(),
            })?;

        serde_json::from_str(&text).map_err(|e| AppError::RecommendationError {
            message: format!("Model returned invalid JSON: {}", e),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// OpenAI-compatible (OpenAI, Ollama, LM Studio)
// ============================================================================

/// Client for OpenAI-compatible chat-completion endpoints
pub struct OpenAiCompatRecommender {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ChatResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiCompatRecommender {
    /// Create a new client for an OpenAI-compatible endpoint
    pub fn new(config: &RecommenderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        })
    }
}

#[async_trait]
impl Recommender for OpenAiCompatRecommender {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<Value> {
        // json_object mode has no schema parameter, so the schema travels in
        // the prompt itself
        let full_prompt = format!(
            "{}\n\nRespond with a single JSON object matching this schema:\n{}",
            prompt, schema
        );

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &full_prompt,
            }],
            temperature: self.temperature,
            response_format: ChatResponseFormat {
                format_type: "json_object",
            },
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| AppError::RecommendationError {
            message: format!("Request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RecommendationError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::RecommendationError {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::RecommendationError {
                message: "Empty response from model".to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| AppError::RecommendationError {
            message: format!("Model returned invalid JSON: {}", e),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Scripted outcome for the mock recommender
pub type MockOutcome = std::result::Result<Value, String>;

/// Mock recommender for testing
///
/// Pops one scripted outcome per call and records the prompts it was given.
pub struct MockRecommender {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    prompts: Mutex<Vec<String>>,
}

impl MockRecommender {
    /// A recommender that answers each call with the next value in order
    pub fn with_responses(responses: Vec<Value>) -> Self {
        Self::with_outcomes(responses.into_iter().map(Ok).collect())
    }

    /// A recommender with explicit per-call success/failure outcomes
    pub fn with_outcomes(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far
    pub async fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl Recommender for MockRecommender {
    async fn generate(&self, prompt: &str, _schema: &Value) -> Result<Value> {
        self.prompts.lock().await.push(prompt.to_string());

        match self.outcomes.lock().await.pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(AppError::RecommendationError { message }),
            None => Err(AppError::RecommendationError {
                message: "Mock recommender exhausted".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-recommender"
    }
}

/// Create a recommender based on configuration
pub fn create_recommender(config: &RecommenderConfig) -> Result<Arc<dyn Recommender>> {
    match config.provider.as_str() {
        "gemini" => {
            let key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
                message: "Gemini provider requires an API key".to_string(),
            })?;
            Ok(Arc::new(GeminiRecommender::new(config, key)?))
        }
        "openai-compatible" => Ok(Arc::new(OpenAiCompatRecommender::new(config)?)),
        "mock" => Ok(Arc::new(MockRecommender::with_responses(Vec::new()))),
        other => Err(AppError::Configuration {
            message: format!("Unknown recommendation provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_pops_in_order() {
        let mock = MockRecommender::with_responses(vec![json!({"a": 1}), json!({"a": 2})]);
        let schema = json!({"type": "object"});

        assert_eq!(mock.generate("first", &schema).await.unwrap(), json!({"a": 1}));
        assert_eq!(mock.generate("second", &schema).await.unwrap(), json!({"a": 2}));
        assert!(mock.generate("third", &schema).await.is_err());

        assert_eq!(mock.recorded_prompts().await, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let mock = MockRecommender::with_outcomes(vec![
            Err("model overloaded".to_string()),
            Ok(json!({"ok": true})),
        ]);
        let schema = json!({"type": "object"});

        let err = mock.generate("p", &schema).await.unwrap_err();
        assert!(matches!(err, AppError::RecommendationError { .. }));
        assert!(mock.generate("p", &schema).await.is_ok());
    }

    #[test]
    fn test_factory_requires_gemini_key() {
        let config = RecommenderConfig {
            provider: "gemini".into(),
            api_key: None,
            api_base: None,
            model: "gemini-1.5-flash".into(),
            temperature: 0.0,
            timeout_secs: 30,
        };
        assert!(create_recommender(&config).is_err());
    }
}
