use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::db::Database;
use crate::error::FeedError;
use crate::TARGET_LLM_REQUEST;

const POST_SYSTEM_PROMPT: &str = "You are a social media assistant. Explain the following post in a professional, article-friendly way. If media is mentioned, include it in your explanation context. Do not add unrelated content. Begin with the explanation directly.";
const ARTICLE_SYSTEM_PROMPT: &str = "You are a helpful assistant. Explain the following piece of text clearly. If an image is mentioned, include it in your explanation context. Begin with the explanation directly.";

const POST_TEMPERATURE: f32 = 0.4;
const POST_MAX_TOKENS: u32 = 1024;
const ARTICLE_TEMPERATURE: f32 = 0.5;
const ARTICLE_MAX_TOKENS: u32 = 150;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One generation request to the language-model collaborator.
pub struct ExplanationRequest {
    pub system_prompt: String,
    pub content: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Language-model collaborator seam. A failure here is a `Dependency`
/// error and never affects anything but the explanation field.
#[async_trait]
pub trait ExplanationModel: Send + Sync {
    async fn complete(&self, request: &ExplanationRequest) -> Result<String, FeedError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// OpenAI-compatible chat completions client over HTTP.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &ModelConfig) -> Self {
        ChatCompletionsClient {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl ExplanationModel for ChatCompletionsClient {
    async fn complete(&self, request: &ExplanationRequest) -> Result<String, FeedError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.content,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: 1.0,
        };

        debug!(target: TARGET_LLM_REQUEST, "Sending completion request to {}", self.endpoint);

        let mut http_request = self
            .http
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|err| FeedError::Dependency(err.to_string()))?
            .error_for_status()
            .map_err(|err| FeedError::Dependency(err.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| FeedError::Dependency(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| FeedError::Dependency("model returned no explanation".to_string()))
    }
}

/// Get-or-generate explanations for stored content. The stored value wins;
/// generation happens at most once per item unless the persist fails.
pub struct ExplanationService {
    db: Database,
    model: Arc<dyn ExplanationModel>,
}

impl ExplanationService {
    pub fn new(db: Database, model: Arc<dyn ExplanationModel>) -> Self {
        ExplanationService { db, model }
    }

    pub async fn explain_post(&self, permalink: &str) -> Result<String, FeedError> {
        let post = self
            .db
            .get_post_by_link(permalink)
            .await?
            .ok_or_else(|| FeedError::NotFound(format!("post {}", permalink)))?;

        if let Some(explanation) = post.explanation {
            if !explanation.is_empty() {
                return Ok(explanation);
            }
        }

        let content = match &post.media_url {
            Some(url) => format!(
                "This post has associated media at URL: {}\n\nPost content: {}",
                url, post.body
            ),
            None => post.body.clone(),
        };

        debug!(target: TARGET_LLM_REQUEST, "Generating explanation for post: {}", permalink);
        let explanation = self
            .model
            .complete(&ExplanationRequest {
                system_prompt: POST_SYSTEM_PROMPT.to_string(),
                content,
                temperature: POST_TEMPERATURE,
                max_tokens: POST_MAX_TOKENS,
            })
            .await?;

        // A failed persist is not a failed request; the caller still gets
        // the generated text and the next request regenerates it.
        match self.db.set_post_explanation(permalink, &explanation).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(target: TARGET_LLM_REQUEST, "Post {} vanished before its explanation could be stored", permalink);
            }
            Err(err) => {
                warn!(target: TARGET_LLM_REQUEST, "Failed to store explanation for post {}: {}", permalink, err);
            }
        }

        Ok(explanation)
    }

    pub async fn explain_article(&self, article_id: i64) -> Result<String, FeedError> {
        let article = self
            .db
            .get_article_by_id(article_id)
            .await?
            .ok_or_else(|| FeedError::NotFound(format!("article {}", article_id)))?;

        if let Some(explanation) = article.explanation {
            if !explanation.is_empty() {
                return Ok(explanation);
            }
        }

        let text = article
            .short_description
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| article.headline.clone());
        let content = match &article.image_url {
            Some(url) => format!(
                "This content has an associated image at URL: {}\n\nText: {}",
                url, text
            ),
            None => text,
        };

        debug!(target: TARGET_LLM_REQUEST, "Generating explanation for article: {}", article_id);
        let explanation = self
            .model
            .complete(&ExplanationRequest {
                system_prompt: ARTICLE_SYSTEM_PROMPT.to_string(),
                content,
                temperature: ARTICLE_TEMPERATURE,
                max_tokens: ARTICLE_MAX_TOKENS,
            })
            .await?;

        match self
            .db
            .set_article_explanation(article_id, &explanation)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(target: TARGET_LLM_REQUEST, "Article {} vanished before its explanation could be stored", article_id);
            }
            Err(err) => {
                warn!(target: TARGET_LLM_REQUEST, "Failed to store explanation for article {}: {}", article_id, err);
            }
        }

        Ok(explanation)
    }
}
