//! Completion client configuration.

use secrecy::{ExposeSecret, SecretString};

use crate::{DEFAULT_MODEL, DEFAULT_OPENAI_URL, OpenAiError, Result};

/// Credentials and endpoint for the completion API.
#[derive(Clone)]
pub struct OpenAiConfig {
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiConfig {
    /// Create a configuration with the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
        }
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load from `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| OpenAiError::Config("OPENAI_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            config = config.with_model(model.trim());
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }
        Ok(config)
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config = OpenAiConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key(), "sk-test");
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_overrides() {
        let config = OpenAiConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_BASE_URL", "http://localhost:1234/v1/"),
        ]))
        .unwrap();
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.base_url(), "http://localhost:1234/v1");
    }

    #[test]
    fn test_missing_key() {
        let result = OpenAiConfig::from_lookup(lookup_from(&[("OPENAI_MODEL", "gpt-4o")]));
        assert!(matches!(result, Err(OpenAiError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAiConfig::new("sk-very-secret");
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }
}
