//! AI article drafting through an OpenAI-compatible chat completions API

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::config::AiConfig;
use crate::core::{Error, Result};
use crate::storage::Store;
use crate::system::metrics;
use crate::types::{Article, ArticleCategory, ContentStatus, Feature, NewArticle, User, Violations};

use super::{articles, subscriptions};

const SYSTEM_PROMPT: &str = "You are a content writer for Eco-Grid, a clean-energy software company \
    building virtual power plants. Reply with a single JSON object and nothing else.";

/// Text completion backend
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a system and user prompt, returning the raw reply text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Client for `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl OpenAiClient {
    /// Build from config; a missing key is only reported when a completion is requested
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::AiUnavailable("no API key configured".into()))?;

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "temperature": self.temperature,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": prompt },
                ],
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(%status, "completion request failed: {}", truncate(&body, 300));
            return Err(Error::AiInvalidResponse(format!("provider returned {}", status)));
        }

        let body = resp.json::<serde_json::Value>().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::AiInvalidResponse("response missing choices[0].message.content".into()))
    }
}

/// Target length of a generated article
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleLength {
    /// About 400 words
    Short,
    /// About 800 words
    #[default]
    Medium,
    /// About 1500 words
    Long,
}

impl ArticleLength {
    fn words(self) -> u32 {
        match self {
            ArticleLength::Short => 400,
            ArticleLength::Medium => 800,
            ArticleLength::Long => 1500,
        }
    }
}

/// Body of `POST /api/ai/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// What to write about
    pub topic: String,
    /// Writing tone, e.g. `informative`
    pub tone: Option<String>,
    /// Keywords to work in
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Target length
    #[serde(default)]
    pub length: ArticleLength,
    /// Category for a saved draft
    pub category: Option<ArticleCategory>,
    /// Store the result as a draft article
    #[serde(default)]
    pub save_as_draft: bool,
}

impl GenerateRequest {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("topic", &self.topic, 3, 200)
            .max_length("tone", self.tone.as_deref(), 40)
            .check(self.keywords.len() <= 10, "keywords", "at most 10 keywords")
            .finish()
    }
}

/// Draft produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    /// Headline
    pub title: String,
    /// Summary
    pub excerpt: String,
    /// Markdown body
    pub content: String,
    /// Suggested tags
    pub tags: Vec<String>,
}

/// Response of `POST /api/ai/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    /// Generated text
    pub generated: GeneratedArticle,
    /// Draft article, when `save_as_draft` was set
    pub draft: Option<Article>,
}

/// Prompt building and reply parsing around a [`CompletionClient`]
#[derive(Clone)]
pub struct AiWriter {
    client: Arc<dyn CompletionClient>,
}

impl AiWriter {
    /// Writer over any completion backend
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Ask the model for an article
    pub async fn generate(&self, req: &GenerateRequest) -> Result<GeneratedArticle> {
        let raw = self.client.complete(SYSTEM_PROMPT, &build_prompt(req)).await?;
        parse_generated(&raw)
    }
}

/// User prompt for a request
pub fn build_prompt(req: &GenerateRequest) -> String {
    let mut prompt = format!(
        "Write a blog article of about {} words about \"{}\" in a {} tone.",
        req.length.words(),
        req.topic.trim(),
        req.tone.as_deref().map(str::trim).filter(|t| !t.is_empty()).unwrap_or("informative"),
    );
    if !req.keywords.is_empty() {
        prompt.push_str(&format!(" Naturally include these keywords: {}.", req.keywords.join(", ")));
    }
    prompt.push_str(
        " Respond with JSON of the form {\"title\": string, \"excerpt\": string (max 500 characters), \
         \"content\": string (markdown), \"tags\": [string]}.",
    );
    prompt
}

/// Strip optional markdown fences and check the reply shape
pub fn parse_generated(raw: &str) -> Result<GeneratedArticle> {
    let body = strip_code_fences(raw);
    let article: GeneratedArticle = serde_json::from_str(body)
        .map_err(|e| Error::AiInvalidResponse(format!("reply is not the expected JSON object: {}", e)))?;

    if article.title.trim().is_empty() || article.content.trim().is_empty() {
        return Err(Error::AiInvalidResponse("reply has an empty title or content".into()));
    }
    Ok(article)
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Gate, generate, count usage and optionally save a draft
pub async fn generate(store: &Store, writer: &AiWriter, author: &User, req: GenerateRequest) -> Result<GenerateResponse> {
    req.validate()?;
    subscriptions::ensure_feature(store, author.id, Feature::AiGenerations)?;
    if req.save_as_draft {
        subscriptions::ensure_feature(store, author.id, Feature::Articles)?;
    }

    let generated = match writer.generate(&req).await {
        Ok(generated) => generated,
        Err(e) => {
            metrics::record_ai_generation(match &e {
                Error::AiUnavailable(_) => "unavailable",
                Error::AiInvalidResponse(_) => "invalid",
                _ => "error",
            });
            return Err(e);
        }
    };
    metrics::record_ai_generation("ok");

    // Counted only once the draft, if any, is stored
    let draft = if req.save_as_draft {
        let input = NewArticle {
            title: truncate(&generated.title, 200).to_string(),
            slug: Some(articles::available_slug(store, &generated.title)),
            excerpt: truncate(&generated.excerpt, 500).to_string(),
            content: generated.content.clone(),
            category: req.category.unwrap_or(ArticleCategory::Technology),
            tags: generated.tags.iter().take(10).cloned().collect(),
            featured: false,
            status: Some(ContentStatus::Draft),
        };
        Some(articles::create(store, author, input)?)
    } else {
        None
    };
    subscriptions::record_usage(store, author.id, Feature::AiGenerations)?;

    tracing::info!(user_id = %author.id, saved = draft.is_some(), "AI article generated");
    Ok(GenerateResponse { generated, draft })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
