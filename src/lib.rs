pub mod builder;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod grocery;
pub mod markdown;
pub mod model;
pub mod pipelines;
pub mod providers;
pub mod store;
pub mod url_to_text;

pub use builder::RecipeExtractorBuilder;
pub use cache::{CacheEntry, CacheKey, ExtractionCache, ExtractionStrategy, DEFAULT_TTL};
pub use config::{DeviceProfile, ExtractorConfig, LlmConfig};
pub use error::ExtractError;
pub use grocery::{
    CustomItem, GroceryItem, GroceryList, GroceryListAggregator, GroceryView, RecipeIngredients,
    ViewMode,
};
pub use model::{
    DeviceVariant, ExtractionMethod, IngredientGroup, Recipe, RecipeContent, StructuredRecipe,
};
pub use pipelines::RecipeExtractor;
pub use providers::{CompletionOptions, LlmProvider};
pub use store::{InMemoryStore, RecipeStore, SavedRecipe};
pub use url_to_text::{HtmlRecipeScraper, PageFetcher};

/// Extract a recipe with configuration from `recipe.toml` and the
/// environment.
///
/// Builds a fresh extractor (and cache) per call; keep a
/// [`RecipeExtractor`] around to benefit from caching.
///
/// # Errors
/// Only a malformed URL or unusable configuration is an error. Fetch and
/// LLM failures produce a degraded `Recipe` instead.
pub async fn extract(url: &str, variant: DeviceVariant) -> Result<Recipe, ExtractError> {
    pipelines::validate_url(url)?;
    let extractor = RecipeExtractor::builder().build()?;
    extractor.extract(url, variant).await
}

/// Merge ingredient lists from several recipes plus ad-hoc items into one
/// section-grouped shopping list.
pub fn aggregate_grocery_list(
    recipes: &[RecipeIngredients],
    custom_items: &[CustomItem],
) -> GroceryView {
    grocery::aggregate_grocery_list(recipes, custom_items)
}
