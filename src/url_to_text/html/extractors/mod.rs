use crate::error::ExtractError;
use crate::model::StructuredRecipe;
use scraper::Html;

mod html_class;
mod json_ld;
mod microdata;

pub use html_class::HtmlClassExtractor;
pub use json_ld::JsonLdExtractor;
pub use microdata::MicroDataExtractor;

pub struct ParsingContext<'a> {
    pub url: &'a str,
    pub document: &'a Html,
}

/// A structured-data reader: machine-readable markup in, recipe fields out
pub trait Extractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn parse(&self, context: &ParsingContext) -> Result<StructuredRecipe, ExtractError>;
}

/// Collapse runs of whitespace inside scraped element text
pub(crate) fn element_text(element: scraper::ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
