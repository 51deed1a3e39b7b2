//! Upstream LLM configuration

use std::time::Duration;

use serde::Deserialize;

/// Configuration name used when none is given.
pub const DEFAULT_MODEL_CONFIG: &str = "openai";

/// One upstream LLM endpoint.
///
/// Every configuration name owns exactly one admission lane, shared by the
/// whole process.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Bearer credential. Falls back to `<NAME>_API_KEY` when unset.
    pub api_key: Option<String>,
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model identifier sent with each completion.
    pub model: String,
    pub max_concurrent_requests: usize,
    pub timeout_secs: u64,
    /// Total attempts per completion, including the first.
    pub max_attempts: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_concurrent_requests: 50,
            timeout_secs: 60,
            max_attempts: 3,
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Environment variable holding the credential for config `name`.
    ///
    /// `openai` → `OPENAI_API_KEY`, `my-gemini` → `MY_GEMINI_API_KEY`.
    pub fn api_key_env(name: &str) -> String {
        let mut var: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        var.push_str("_API_KEY");
        var
    }
}
