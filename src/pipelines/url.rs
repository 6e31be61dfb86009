use crate::cache::{CacheKey, ExtractionCache, ExtractionStrategy};
use crate::config::{DeviceProfile, ExtractorConfig};
use crate::error::ExtractError;
use crate::markdown;
use crate::model::{
    DeviceVariant, ExtractionMethod, Recipe, RecipeContent, StructuredRecipe, DEFAULT_TITLE,
};
use crate::pipelines::text::parse_completion;
use crate::providers::{build_system_prompt, build_user_prompt, CompletionOptions, LlmProvider};
use crate::url_to_text::{HtmlRecipeScraper, PageAnalysis, PageFetcher};
use log::{debug, warn};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;

/// One step of a single extraction request
enum State {
    CacheCheck,
    PrimaryAttempt,
    /// Heuristic scrape without the LLM. Carries the page when the primary
    /// attempt already fetched it, and the failure that led here, if any.
    Fallback {
        cause: Option<ExtractError>,
        page: Option<PageAnalysis>,
    },
    Degraded {
        cause: ExtractError,
        timed_out: bool,
        title: Option<String>,
    },
    Done {
        recipe: Recipe,
        cacheable: bool,
    },
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::CacheCheck => "CacheCheck",
            State::PrimaryAttempt => "PrimaryAttempt",
            State::Fallback { .. } => "Fallback",
            State::Degraded { .. } => "Degraded",
            State::Done { .. } => "Done",
        };
        f.write_str(name)
    }
}

/// Runs the cache → LLM → heuristic → degraded cascade for one URL at a
/// time. Every terminal state yields a `Recipe`; only a malformed URL is an
/// error.
///
/// Concurrent requests for the same key are not coalesced: each runs the
/// full cascade and the last one to finish overwrites the cache entry.
pub struct RecipeExtractor {
    pub(crate) cache: Arc<ExtractionCache>,
    pub(crate) fetcher: Arc<dyn PageFetcher>,
    pub(crate) provider: Option<Arc<dyn LlmProvider>>,
    pub(crate) scraper: HtmlRecipeScraper,
    pub(crate) config: ExtractorConfig,
}

impl RecipeExtractor {
    pub fn new(
        cache: Arc<ExtractionCache>,
        fetcher: Arc<dyn PageFetcher>,
        provider: Option<Arc<dyn LlmProvider>>,
        config: ExtractorConfig,
    ) -> Self {
        RecipeExtractor {
            cache,
            fetcher,
            provider,
            scraper: HtmlRecipeScraper::new(),
            config,
        }
    }

    pub fn cache(&self) -> &Arc<ExtractionCache> {
        &self.cache
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        if self.provider.is_some() {
            ExtractionStrategy::Llm
        } else {
            ExtractionStrategy::Heuristic
        }
    }

    /// Extract a recipe from `url`.
    ///
    /// Network, LLM and parse failures never surface here: they degrade to a
    /// heuristic result or to a synthetic recipe explaining the failure.
    pub async fn extract(&self, url: &str, variant: DeviceVariant) -> Result<Recipe, ExtractError> {
        let url = validate_url(url)?;
        let key = CacheKey::new(url.as_str(), variant, self.strategy());
        let profile = self.config.profile(variant);

        let mut state = State::CacheCheck;
        loop {
            let next = match state {
                State::CacheCheck => self.check_cache(&key),
                State::PrimaryAttempt => {
                    self.primary_attempt(url.as_str(), variant, profile).await
                }
                State::Fallback { cause, page } => {
                    self.fallback(url.as_str(), profile, cause, page).await
                }
                State::Degraded {
                    cause,
                    timed_out,
                    title,
                } => {
                    warn!("Returning degraded recipe for {}: {}", url, cause);
                    return Ok(degraded_recipe(url.as_str(), &cause, timed_out, title));
                }
                State::Done { recipe, cacheable } => {
                    if cacheable {
                        self.cache.insert(key, recipe.clone());
                    }
                    debug!("Extraction of {} finished with method {}", url, recipe.method);
                    return Ok(recipe);
                }
            };
            debug!("{} -> {}", url, next);
            state = next;
        }
    }

    fn check_cache(&self, key: &CacheKey) -> State {
        match self.cache.get(key) {
            Some(recipe) => {
                debug!("Cache hit for {} ({})", key.url, key.variant);
                State::Done {
                    recipe,
                    cacheable: false,
                }
            }
            None => {
                debug!("Cache miss for {} ({})", key.url, key.variant);
                if self.provider.is_some() {
                    State::PrimaryAttempt
                } else {
                    State::Fallback {
                        cause: None,
                        page: None,
                    }
                }
            }
        }
    }

    async fn fetch_page(&self, url: &str, profile: &DeviceProfile) -> Result<String, ExtractError> {
        let deadline = profile.fetch_timeout();
        match timeout(deadline, self.fetcher.fetch(url, &profile.user_agent)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::FetchTimeout(deadline)),
        }
    }

    async fn primary_attempt(
        &self,
        url: &str,
        variant: DeviceVariant,
        profile: &DeviceProfile,
    ) -> State {
        let Some(provider) = self.provider.as_ref() else {
            return State::Fallback {
                cause: None,
                page: None,
            };
        };

        let html = match self.fetch_page(url, profile).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Primary fetch of {} failed, falling back: {}", url, e);
                return State::Fallback {
                    cause: Some(e),
                    page: None,
                };
            }
        };
        let page = self.scraper.analyze(url, &html, profile.max_prompt_chars);

        if page.structured.is_none() && page.text.trim().is_empty() {
            warn!("No readable text on {}, falling back", url);
            return State::Fallback {
                cause: Some(ExtractError::NoRecipeContent),
                page: Some(page),
            };
        }

        let (method, body) = match &page.structured {
            Some(draft) => (ExtractionMethod::DeepseekOptimized, markdown::render(draft)),
            None => {
                let method = match variant {
                    DeviceVariant::Mobile => ExtractionMethod::DeepseekMobile,
                    DeviceVariant::Desktop => ExtractionMethod::Deepseek,
                };
                (method, page.text.clone())
            }
        };

        let system_prompt = build_system_prompt(variant, &self.config.prompt.avoid_phrases);
        let user_prompt = build_user_prompt(url, &body);
        let options = CompletionOptions {
            temperature: self.config.llm.temperature,
            max_tokens: profile.max_tokens,
        };
        debug!(
            "Prompting {} for {} ({} chars, {} max tokens)",
            provider.provider_name(),
            url,
            user_prompt.len(),
            options.max_tokens
        );

        let deadline = profile.llm_timeout();
        let completion = match timeout(
            deadline,
            provider.complete(&system_prompt, &user_prompt, &options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExtractError::LlmTimeout(deadline)),
        };

        match completion.and_then(|raw| parse_completion(&raw, &page.title)) {
            Ok(content) => State::Done {
                recipe: Recipe::new(url, method, content),
                cacheable: true,
            },
            Err(e) => {
                warn!("LLM extraction of {} failed, falling back: {}", url, e);
                State::Fallback {
                    cause: Some(e),
                    page: Some(page),
                }
            }
        }
    }

    async fn fallback(
        &self,
        url: &str,
        profile: &DeviceProfile,
        cause: Option<ExtractError>,
        page: Option<PageAnalysis>,
    ) -> State {
        let earlier_timeout = cause.as_ref().is_some_and(ExtractError::is_timeout);

        let page = match page {
            Some(page) => page,
            None => match self.fetch_page(url, profile).await {
                Ok(html) => self.scraper.analyze(url, &html, profile.max_prompt_chars),
                Err(e) => {
                    return State::Degraded {
                        timed_out: earlier_timeout || e.is_timeout(),
                        cause: e,
                        title: None,
                    };
                }
            },
        };

        match page.best() {
            Some(recipe) => State::Done {
                recipe: Recipe::new(
                    url,
                    ExtractionMethod::Simple,
                    RecipeContent::Structured(recipe.clone()),
                ),
                cacheable: true,
            },
            None => State::Degraded {
                cause: cause.unwrap_or(ExtractError::NoRecipeContent),
                timed_out: earlier_timeout,
                title: Some(page.title),
            },
        }
    }
}

/// Accept only absolute http(s) URLs
pub fn validate_url(url: &str) -> Result<Url, ExtractError> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| ExtractError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(ExtractError::InvalidUrl(url.to_string())),
    }
}

/// Synthetic, always-renderable recipe explaining why extraction failed
fn degraded_recipe(
    url: &str,
    cause: &ExtractError,
    timed_out: bool,
    title: Option<String>,
) -> Recipe {
    let (method, explanation) = if timed_out {
        (
            ExtractionMethod::TimeoutFallback,
            format!("The recipe page took too long to respond ({cause})."),
        )
    } else {
        (
            ExtractionMethod::ErrorFallback,
            format!("The recipe could not be extracted ({cause})."),
        )
    };

    Recipe::new(
        url,
        method,
        RecipeContent::Structured(StructuredRecipe {
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            instructions: vec![
                explanation,
                format!("Open the original page to view the recipe: {url}"),
            ],
            ..Default::default()
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/recipe").is_ok());
        assert!(validate_url(" http://example.com ").is_ok());
        assert!(matches!(
            validate_url("not a url"),
            Err(ExtractError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/file"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_degraded_recipe_is_renderable() {
        let cause = ExtractError::FetchTimeout(std::time::Duration::from_secs(15));
        let recipe = degraded_recipe("https://example.com/r", &cause, true, None);

        assert_eq!(recipe.method, ExtractionMethod::TimeoutFallback);
        assert!(recipe.method.is_degraded());
        assert_eq!(recipe.title(), DEFAULT_TITLE);
        assert!(recipe.markdown().contains("took too long"));
        assert!(recipe.fields().instructions[1].contains("https://example.com/r"));
    }

    #[test]
    fn test_degraded_recipe_for_errors() {
        let cause = ExtractError::Fetch {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        let recipe = degraded_recipe("https://example.com/r", &cause, false, Some("Soup".into()));
        assert_eq!(recipe.method, ExtractionMethod::ErrorFallback);
        assert_eq!(recipe.title(), "Soup");
        assert!(recipe.fields().instructions[0].contains("404"));
    }
}
