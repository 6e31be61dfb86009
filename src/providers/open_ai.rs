use crate::config::LlmConfig;
use crate::error::ExtractError;
use crate::providers::{CompletionOptions, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// Chat-completions client. Serves OpenAI and any API speaking the same
/// protocol (DeepSeek) through the base URL.
pub struct OpenAIProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIProvider {
    /// Create a provider from configuration; `config.provider` picks the
    /// default endpoint when no base URL is set
    pub fn new(config: &LlmConfig) -> Result<Self, ExtractError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ExtractError::BuilderError(format!(
                "{} not found in config or environment",
                config.api_key_env_var()
            ))
        })?;

        let base_url = config.base_url.clone().unwrap_or_else(|| {
            match config.provider.as_str() {
                "openai" => OPENAI_BASE_URL,
                _ => DEEPSEEK_BASE_URL,
            }
            .to_string()
        });

        Ok(OpenAIProvider {
            client: Client::new(),
            name: config.provider.clone(),
            api_key,
            base_url,
            model: config.model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            name: "openai".to_string(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": options.temperature,
                "max_tokens": options.max_tokens
            }))
            .send()
            .await
            .map_err(|e| ExtractError::LlmTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::LlmTransport(format!(
                "{} returned {}: {}",
                self.name, status, body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| ExtractError::LlmTransport(e.to_string()))?;
        debug!("{:?}", response_body);

        response_body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ExtractError::LlmTransport("Failed to extract content from response".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn options() -> CompletionOptions {
        CompletionOptions {
            temperature: 0.1,
            max_tokens: 2000,
        }
    }

    #[tokio::test]
    async fn test_complete() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer fake_api_key")
            .match_body(Matcher::PartialJson(json!({
                "model": "deepseek-chat",
                "max_tokens": 2000
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r##"{
                    "choices": [{
                        "message": {
                            "content": "# Pasta\n## Ingredients\n- 500 g pasta\n## Instructions\n1. Cook pasta."
                        }
                    }]
                }"##,
            )
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "deepseek-chat".to_string(),
        );

        let result = provider
            .complete("system", "Page text", &options())
            .await
            .unwrap();
        assert!(result.starts_with("# Pasta"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Invalid request"}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
        );

        let result = provider.complete("system", "user", &options()).await;
        assert!(matches!(result, Err(ExtractError::LlmTransport(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_content_is_transport_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
        );
        let result = provider.complete("system", "user", &options()).await;
        assert!(matches!(result, Err(ExtractError::LlmTransport(_))));
    }

    #[test]
    fn test_provider_name_follows_config() {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        let provider = OpenAIProvider::new(&config).unwrap();
        assert_eq!(provider.provider_name(), "deepseek");
        assert_eq!(provider.base_url, DEEPSEEK_BASE_URL);
    }
}
