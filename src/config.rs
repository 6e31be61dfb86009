use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::model::DeviceVariant;

/// Top-level extraction configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Budget and deadlines for mobile requests
    #[serde(default = "default_mobile_profile")]
    pub mobile: DeviceProfile,
    /// Budget and deadlines for desktop requests
    #[serde(default = "default_desktop_profile")]
    pub desktop: DeviceProfile,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Configuration for the LLM completion provider
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// One of "deepseek", "openai", "anthropic"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier (e.g., "deepseek-chat", "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for authentication (falls back to the provider's env variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Per-device extraction budget
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DeviceProfile {
    /// Maximum tokens the LLM may generate
    pub max_tokens: u32,
    /// Deadline for the LLM completion call, in seconds
    pub llm_timeout_secs: u64,
    /// Deadline for the page fetch, in seconds
    pub fetch_timeout_secs: u64,
    /// Page text beyond this many characters is cut before prompting
    pub max_prompt_chars: usize,
    /// User-Agent header sent with page fetches
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// How long an extraction stays cached, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

/// Prompt policy data
#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    /// Page chrome strings the model is told never to treat as recipe content
    #[serde(default = "default_avoid_phrases")]
    pub avoid_phrases: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl DeviceProfile {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            avoid_phrases: default_avoid_phrases(),
        }
    }
}

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Default value functions
fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_cache_ttl_secs() -> u64 {
    604_800
}

fn default_mobile_profile() -> DeviceProfile {
    DeviceProfile {
        max_tokens: 2000,
        llm_timeout_secs: 15,
        fetch_timeout_secs: 10,
        max_prompt_chars: 6000,
        user_agent: MOBILE_USER_AGENT.to_string(),
    }
}

fn default_desktop_profile() -> DeviceProfile {
    DeviceProfile {
        max_tokens: 4000,
        llm_timeout_secs: 30,
        fetch_timeout_secs: 15,
        max_prompt_chars: 15000,
        user_agent: DESKTOP_USER_AGENT.to_string(),
    }
}

fn default_avoid_phrases() -> Vec<String> {
    [
        "Log In",
        "Sign Up",
        "Subscribe",
        "Newsletter",
        "Jump to Recipe",
        "Print Recipe",
        "Save Recipe",
        "Rate this Recipe",
        "Leave a Comment",
        "Share",
        "Pin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl LlmConfig {
    /// Conventional environment variable holding this provider's key
    pub fn api_key_env_var(&self) -> &'static str {
        match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => "DEEPSEEK_API_KEY",
        }
    }

    /// Configured key, or the provider's conventional environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.api_key_env_var()).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl ExtractorConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE__ prefix
    /// 2. recipe.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE__LLM__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn profile(&self, variant: DeviceVariant) -> &DeviceProfile {
        match variant {
            DeviceVariant::Mobile => &self.mobile,
            DeviceVariant::Desktop => &self.desktop,
        }
    }

    /// Defaults as they would come out of an empty file and environment
    pub fn defaults() -> Self {
        Self {
            llm: LlmConfig::default(),
            mobile: default_mobile_profile(),
            desktop: default_desktop_profile(),
            cache: CacheConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Seed every profile field, so a file or environment variable may override
/// a single threshold (`RECIPE__DESKTOP__LLM_TIMEOUT_SECS=10`) and keep the
/// rest of that variant's profile
fn with_profile_defaults(
    builder: ConfigBuilder<DefaultState>,
    section: &str,
    profile: &DeviceProfile,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default(format!("{section}.max_tokens"), i64::from(profile.max_tokens))?
        .set_default(
            format!("{section}.llm_timeout_secs"),
            profile.llm_timeout_secs as i64,
        )?
        .set_default(
            format!("{section}.fetch_timeout_secs"),
            profile.fetch_timeout_secs as i64,
        )?
        .set_default(
            format!("{section}.max_prompt_chars"),
            profile.max_prompt_chars as i64,
        )?
        .set_default(format!("{section}.user_agent"), profile.user_agent.clone())
}

fn default_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = with_profile_defaults(Config::builder(), "mobile", &default_mobile_profile())?;
    with_profile_defaults(builder, "desktop", &default_desktop_profile())
}

/// Load configuration from `recipe.toml` (optional) and `RECIPE__*` variables
pub fn load_config() -> Result<ExtractorConfig, ConfigError> {
    let settings = default_builder()?
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe").required(false))
        // Use double underscore for nested: RECIPE__DESKTOP__LLM_TIMEOUT_SECS
        .add_source(
            Environment::with_prefix("RECIPE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_provider(), "deepseek");
        assert_eq!(default_temperature(), 0.1);
        assert_eq!(default_cache_ttl_secs(), 604_800);
    }

    #[test]
    fn test_mobile_budget_is_smaller_than_desktop() {
        let config = ExtractorConfig::defaults();
        let mobile = config.profile(DeviceVariant::Mobile);
        let desktop = config.profile(DeviceVariant::Desktop);

        assert_eq!(mobile.max_tokens, 2000);
        assert_eq!(desktop.max_tokens, 4000);
        assert!(mobile.llm_timeout() < desktop.llm_timeout());
        assert!(mobile.fetch_timeout() < desktop.fetch_timeout());
        assert!(mobile.max_prompt_chars < desktop.max_prompt_chars);
        assert!(mobile.user_agent.contains("Mobile"));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings = Config::builder()
            .add_source(config::File::from_str(
                r#"
                [llm]
                provider = "anthropic"
                model = "claude-3-5-haiku-latest"

                [mobile]
                max_tokens = 1000
                llm_timeout_secs = 5
                fetch_timeout_secs = 5
                max_prompt_chars = 3000
                user_agent = "test-agent"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ExtractorConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key_env_var(), "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.mobile.llm_timeout(), Duration::from_secs(5));
        assert_eq!(config.desktop, default_desktop_profile());
        assert!(config.prompt.avoid_phrases.iter().any(|p| p == "Subscribe"));
    }

    #[test]
    fn test_single_profile_override_keeps_other_fields() {
        let settings = default_builder()
            .unwrap()
            .add_source(config::File::from_str(
                r#"
                [desktop]
                llm_timeout_secs = 10
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ExtractorConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.desktop.llm_timeout(), Duration::from_secs(10));
        assert_eq!(config.desktop.max_tokens, 4000);
        assert_eq!(config.desktop.user_agent, DESKTOP_USER_AGENT);
        assert_eq!(config.mobile, default_mobile_profile());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let llm = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolve_api_key().as_deref(), Some("test-key"));

        let blank = LlmConfig {
            api_key: Some("  ".to_string()),
            provider: "nonexistent".to_string(),
            ..LlmConfig::default()
        };
        // blank keys never count as configured
        assert_ne!(blank.resolve_api_key().as_deref(), Some("  "));
    }

    #[test]
    fn test_load_config_without_file() {
        // every field has a default, so an empty environment still loads
        let config = load_config().unwrap();
        assert!(config.cache.ttl_secs > 0);
    }
}
