use std::sync::Arc;

use log::debug;

use crate::cache::ExtractionCache;
use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::pipelines::RecipeExtractor;
use crate::providers::{LlmProvider, ProviderFactory};
use crate::url_to_text::{PageFetcher, RequestFetcher};

/// Builder for a configured [`RecipeExtractor`]
#[derive(Default)]
pub struct RecipeExtractorBuilder {
    config: Option<ExtractorConfig>,
    cache: Option<Arc<ExtractionCache>>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    provider: Option<Arc<dyn LlmProvider>>,
    heuristic_only: bool,
}

impl RecipeExtractorBuilder {
    /// Use an explicit configuration instead of `ExtractorConfig::load()`
    ///
    /// # Example
    /// ```
    /// use recipe_extract::{ExtractorConfig, RecipeExtractor};
    ///
    /// let builder = RecipeExtractor::builder()
    ///     .config(ExtractorConfig::default());
    /// ```
    pub fn config(mut self, config: ExtractorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a cache between several extractors
    ///
    /// # Example
    /// ```
    /// use recipe_extract::{ExtractionCache, RecipeExtractor};
    /// use std::sync::Arc;
    ///
    /// let cache = Arc::new(ExtractionCache::default());
    /// let builder = RecipeExtractor::builder().cache(cache.clone());
    /// ```
    pub fn cache(mut self, cache: Arc<ExtractionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the HTTP page fetcher
    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use this LLM provider instead of building one from configuration
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Never call an LLM, even when an API key is configured
    pub fn heuristic_only(mut self) -> Self {
        self.heuristic_only = true;
        self
    }

    /// Assemble the extractor. Missing pieces come from configuration: the
    /// fetcher is a `RequestFetcher`, the provider is built when an API key
    /// is available, and the cache uses the configured TTL.
    ///
    /// # Errors
    /// Returns `ExtractError` if the configuration cannot be loaded, the
    /// configured provider is unknown, or the HTTP client cannot be built.
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_extract::{DeviceVariant, RecipeExtractor};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let extractor = RecipeExtractor::builder().build()?;
    /// let recipe = extractor
    ///     .extract("https://example.com/recipe", DeviceVariant::Desktop)
    ///     .await?;
    /// println!("{}", recipe.markdown());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<RecipeExtractor, ExtractError> {
        let config = match self.config {
            Some(config) => config,
            None => ExtractorConfig::load()?,
        };

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ExtractionCache::new(config.cache.ttl())));

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            // per-request deadlines are enforced by the extractor; this is a backstop
            None => Arc::new(RequestFetcher::new(Some(
                config.desktop.fetch_timeout().max(config.mobile.fetch_timeout()),
            ))?),
        };

        let provider = if self.heuristic_only {
            None
        } else {
            match self.provider {
                Some(provider) => Some(provider),
                None => ProviderFactory::from_config(&config.llm)?,
            }
        };

        match &provider {
            Some(provider) => debug!("Extractor using LLM provider {}", provider.provider_name()),
            None => debug!("No LLM provider available, extractor is heuristic-only"),
        }

        Ok(RecipeExtractor::new(cache, fetcher, provider, config))
    }
}

impl RecipeExtractor {
    /// Creates a new builder
    ///
    /// # Example
    /// ```
    /// use recipe_extract::RecipeExtractor;
    ///
    /// let builder = RecipeExtractor::builder();
    /// ```
    pub fn builder() -> RecipeExtractorBuilder {
        RecipeExtractorBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ExtractionStrategy;

    #[test]
    fn test_build_without_key_is_heuristic_only() {
        let mut config = ExtractorConfig::default();
        config.llm.api_key = None;
        config.llm.provider = "anthropic".to_string();
        // the conventional env var may be set on a developer machine
        if config.llm.resolve_api_key().is_some() {
            return;
        }

        let extractor = RecipeExtractor::builder().config(config).build().unwrap();
        assert_eq!(extractor.strategy(), ExtractionStrategy::Heuristic);
    }

    #[test]
    fn test_build_with_key_uses_llm() {
        let mut config = ExtractorConfig::default();
        config.llm.api_key = Some("test-key".to_string());

        let extractor = RecipeExtractor::builder().config(config).build().unwrap();
        assert_eq!(extractor.strategy(), ExtractionStrategy::Llm);
    }

    #[test]
    fn test_heuristic_only_overrides_key() {
        let mut config = ExtractorConfig::default();
        config.llm.api_key = Some("test-key".to_string());

        let extractor = RecipeExtractor::builder()
            .config(config)
            .heuristic_only()
            .build()
            .unwrap();
        assert_eq!(extractor.strategy(), ExtractionStrategy::Heuristic);
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(ExtractionCache::default());
        let extractor = RecipeExtractor::builder()
            .config(ExtractorConfig::default())
            .cache(cache.clone())
            .heuristic_only()
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(extractor.cache(), &cache));
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let mut config = ExtractorConfig::default();
        config.llm.provider = "nope".to_string();
        config.llm.api_key = Some("k".to_string());

        let result = RecipeExtractor::builder().config(config).build();
        assert!(matches!(result, Err(ExtractError::BuilderError(_))));
    }
}
