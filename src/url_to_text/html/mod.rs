pub mod extractors;
mod heuristic;
mod text;

pub use text::{text_blocks, truncate_chars, TextBlock};

use crate::classifier::is_navigation_noise;
use crate::error::ExtractError;
use crate::model::{StructuredRecipe, DEFAULT_TITLE};
use extractors::{
    element_text, Extractor, HtmlClassExtractor, JsonLdExtractor, MicroDataExtractor,
    ParsingContext,
};
use log::debug;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Everything the extraction pipeline needs from one page, in owned form so
/// it can be carried across await points.
#[derive(Debug, Clone, Default)]
pub struct PageAnalysis {
    pub title: String,
    /// Result of the first structured-data extractor that found content
    pub structured: Option<StructuredRecipe>,
    /// Result of the heuristic block scan, `None` when it found nothing
    pub heuristic: Option<StructuredRecipe>,
    /// Cleaned visible text, truncated for use as a prompt body
    pub text: String,
}

impl PageAnalysis {
    /// Best recipe the page offers without an LLM
    pub fn best(&self) -> Option<&StructuredRecipe> {
        self.structured.as_ref().or(self.heuristic.as_ref())
    }
}

/// Structured-data-first recipe scraper with a heuristic fallback
pub struct HtmlRecipeScraper {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for HtmlRecipeScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRecipeScraper {
    pub fn new() -> Self {
        HtmlRecipeScraper {
            extractors: vec![
                Box::new(JsonLdExtractor),
                Box::new(MicroDataExtractor),
                Box::new(HtmlClassExtractor),
            ],
        }
    }

    fn structured(&self, url: &str, document: &Html, page_title: &str) -> Option<StructuredRecipe> {
        let context = ParsingContext { url, document };
        self.extractors.iter().find_map(|extractor| {
            match extractor.parse(&context) {
                Ok(recipe) => {
                    let mut recipe = strip_noise(recipe);
                    if !recipe.has_content() {
                        debug!("{} extractor found only noise", extractor.name());
                        return None;
                    }
                    if recipe.title.trim().is_empty() {
                        recipe.title = page_title.to_string();
                    }
                    debug!("Recipe found by {} extractor", extractor.name());
                    Some(recipe)
                }
                Err(e) => {
                    debug!("{} extractor: {}", extractor.name(), e);
                    None
                }
            }
        })
    }

    /// Parse a page once and collect the structured, heuristic and text views
    pub fn analyze(&self, url: &str, html: &str, max_chars: usize) -> PageAnalysis {
        let document = Html::parse_document(html);
        let title = page_title(&document);
        let structured = self.structured(url, &document, &title);
        let blocks = text_blocks(&document);
        let heuristic = Some(heuristic::scrape(&blocks, &title)).filter(|r| r.has_content());
        let text = blocks_to_text(&blocks, max_chars);

        PageAnalysis {
            title,
            structured,
            heuristic,
            text,
        }
    }

    /// Scrape a recipe without an LLM: structured data first, then the
    /// heuristic scan
    pub fn scrape(&self, url: &str, html: &str) -> Result<StructuredRecipe, ExtractError> {
        let document = Html::parse_document(html);
        let title = page_title(&document);
        if let Some(recipe) = self.structured(url, &document, &title) {
            return Ok(recipe);
        }
        let recipe = heuristic::scrape(&text_blocks(&document), &title);
        if recipe.has_content() {
            Ok(recipe)
        } else {
            Err(ExtractError::NoRecipeContent)
        }
    }
}

/// Structured results are trusted apart from navigation chrome
fn strip_noise(mut recipe: StructuredRecipe) -> StructuredRecipe {
    recipe.fold_subsection_headers();
    recipe.ingredients.retain(|item| !is_navigation_noise(item));
    recipe.instructions.retain(|step| !is_navigation_noise(step));
    if let Some(groups) = recipe.ingredient_groups.as_mut() {
        for group in groups.iter_mut() {
            group.items.retain(|item| !is_navigation_noise(item));
        }
        groups.retain(|group| !group.items.is_empty());
    }
    if recipe
        .ingredient_groups
        .as_ref()
        .is_some_and(|groups| groups.is_empty())
    {
        recipe.ingredient_groups = None;
    }
    recipe
}

/// Page title: first `<h1>`, else `<title>` up to a " | " site suffix,
/// else the default title
pub fn page_title(document: &Html) -> String {
    let h1 = document
        .select(&H1_SELECTOR)
        .map(element_text)
        .find(|text| !text.is_empty());
    let title = || {
        document.select(&TITLE_SELECTOR).next().map(|el| {
            let text = element_text(el);
            text.split(" | ").next().unwrap_or_default().trim().to_string()
        })
    };
    h1.or_else(title)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn blocks_to_text(blocks: &[TextBlock], max_chars: usize) -> String {
    let text = blocks
        .iter()
        .filter(|block| !is_navigation_noise(&block.text))
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&text, max_chars).to_string()
}

/// Visible page text with chrome and noise removed, at most `max_chars`
/// characters
pub fn page_text(document: &Html, max_chars: usize) -> String {
    blocks_to_text(&text_blocks(document), max_chars)
}
