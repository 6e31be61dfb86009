mod anthropic;
mod factory;
mod open_ai;
pub mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use open_ai::OpenAIProvider;
pub use prompt::{build_system_prompt, build_user_prompt, RECIPE_EXTRACTION_PROMPT};

use crate::error::ExtractError;
use async_trait::async_trait;

/// Sampling options for a single completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Unified trait for all LLM providers. Treated as a black-box text
/// completion; deadlines are imposed by the caller.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Run one chat completion and return the assistant text
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ExtractError>;
}
