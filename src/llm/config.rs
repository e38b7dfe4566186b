use std::time::Duration;

/// Default Gemini REST endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for the hosted LLM client
#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// API key for the hosted service
    pub api_key: String,

    /// Base URL of the REST endpoint
    pub api_url: String,

    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate per reply
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Timeout for a single (non-streaming) request
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            model: "gemini-1.5-flash-002".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Configuration with the API key taken from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err(format!("API key is required (set {API_KEY_ENV})"));
        }
        if self.model.is_empty() {
            return Err("Model identifier is required".to_string());
        }
        if self.api_url.is_empty() {
            return Err("API URL is required".to_string());
        }
        Ok(())
    }
}
