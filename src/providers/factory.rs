use crate::config::LlmConfig;
use crate::error::ExtractError;
use crate::providers::{AnthropicProvider, LlmProvider, OpenAIProvider};
use std::sync::Arc;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ExtractError> {
        match config.provider.as_str() {
            "openai" | "deepseek" => Ok(Arc::new(OpenAIProvider::new(config)?)),
            "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
            other => Err(ExtractError::BuilderError(format!(
                "Unknown provider: {}",
                other
            ))),
        }
    }

    /// Provider for the configuration, or `None` when no API key is available
    pub fn from_config(config: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>, ExtractError> {
        if config.resolve_api_key().is_none() {
            return Ok(None);
        }
        Self::create(config).map(Some)
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["deepseek", "openai", "anthropic"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            model: "test-model".to_string(),
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_create_openai_provider() {
        let provider = ProviderFactory::create(&create_test_config("openai")).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_create_deepseek_provider() {
        let provider = ProviderFactory::create(&create_test_config("deepseek")).unwrap();
        assert_eq!(provider.provider_name(), "deepseek");
    }

    #[test]
    fn test_create_anthropic_provider() {
        let provider = ProviderFactory::create(&create_test_config("anthropic")).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = ProviderFactory::create(&create_test_config("unknown"));
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("Unknown provider"));
        }
    }

    #[test]
    fn test_from_config_with_key() {
        let provider = ProviderFactory::from_config(&create_test_config("deepseek")).unwrap();
        assert!(provider.is_some());
    }

    #[test]
    fn test_available_providers() {
        let providers = ProviderFactory::available_providers();
        assert_eq!(providers.len(), 3);
        assert!(providers.contains(&"deepseek"));
        assert!(providers.contains(&"anthropic"));
    }
}
