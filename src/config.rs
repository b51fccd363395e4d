use std::env;

/// Per-feed `limit` caps. `None` disables the cap for that feed.
///
/// Only the repost feeds are capped; the other feeds accept any limit the
/// caller validates through pagination. The asymmetry is deliberate: repost
/// rows embed the full original content, so oversized pages are expensive.
#[derive(Clone, Debug)]
pub struct FeedLimits {
    pub friends_reposts_max_limit: Option<u32>,
    pub reposts_by_user_max_limit: Option<u32>,
}

impl Default for FeedLimits {
    fn default() -> Self {
        FeedLimits {
            friends_reposts_max_limit: Some(50),
            reposts_by_user_max_limit: Some(50),
        }
    }
}

/// Connection details for the OpenAI-compatible chat completions endpoint
/// used to generate content explanations.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: None,
            model: "llama3-8b-8192".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: String,
    pub limits: FeedLimits,
    pub model: ModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "chronicle.db".to_string(),
            limits: FeedLimits::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults.
    /// This is the only place the crate reads ambient state.
    pub fn from_env() -> Self {
        let defaults = ModelConfig::default();
        Config {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "chronicle.db".to_string()),
            limits: FeedLimits::default(),
            model: ModelConfig {
                endpoint: env::var("LLM_ENDPOINT").unwrap_or(defaults.endpoint),
                api_key: env::var("LLM_API_KEY").ok(),
                model: env::var("LLM_MODEL").unwrap_or(defaults.model),
            },
        }
    }
}
