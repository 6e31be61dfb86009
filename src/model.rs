use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::markdown;

/// Title used when neither the markdown nor the page carries one
pub const DEFAULT_TITLE: &str = "Untitled Recipe";

/// Extraction profile. Mobile and desktop share the same algorithm and
/// differ only in prompt size, token budget and deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceVariant {
    Mobile,
    Desktop,
}

impl DeviceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceVariant::Mobile => "mobile",
            DeviceVariant::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(DeviceVariant::Mobile),
            "desktop" => Ok(DeviceVariant::Desktop),
            other => Err(format!("Unknown device variant: {other}")),
        }
    }
}

/// Which strategy produced a recipe. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Heuristic HTML scraper, no LLM involved
    Simple,
    /// Desktop LLM pass over cleaned page text
    Deepseek,
    /// Mobile LLM pass with the reduced budget
    DeepseekMobile,
    /// LLM pass fed a condensed draft built from structured page data
    DeepseekOptimized,
    /// Synthetic recipe explaining a non-timeout failure
    ErrorFallback,
    /// Synthetic recipe explaining a deadline overrun
    TimeoutFallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Simple => "simple",
            ExtractionMethod::Deepseek => "deepseek",
            ExtractionMethod::DeepseekMobile => "deepseek-mobile",
            ExtractionMethod::DeepseekOptimized => "deepseek-optimized",
            ExtractionMethod::ErrorFallback => "error-fallback",
            ExtractionMethod::TimeoutFallback => "timeout-fallback",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ExtractionMethod::ErrorFallback | ExtractionMethod::TimeoutFallback
        )
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named ingredient subsection such as "For the sauce"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientGroup {
    pub name: String,
    pub items: Vec<String>,
}

/// Recipe fields in structured form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRecipe {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Present only when the source had explicit subsections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_groups: Option<Vec<IngredientGroup>>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(
        default,
        alias = "prep_time",
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub prep_time: Option<String>,
    #[serde(
        default,
        alias = "cook_time",
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cook_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub servings: Option<String>,
}

/// Reads `"4 servings"` and a bare `4` alike
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}

impl StructuredRecipe {
    pub fn has_content(&self) -> bool {
        !self.ingredients.is_empty() || !self.instructions.is_empty()
    }

    /// Move subsection headers that arrived as ingredient lines, such as
    /// "For the glaze:", into `ingredient_groups`. Markdown parsing reads
    /// the same lines as group headings, so this keeps both views equal.
    pub fn fold_subsection_headers(&mut self) {
        let is_header =
            |item: &str| item.trim().ends_with(':') && markdown::subsection_heading(item).is_some();
        if !self.ingredients.iter().any(|item| is_header(item)) {
            return;
        }

        let mut groups: Vec<IngredientGroup> = Vec::new();
        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for item in self.ingredients.drain(..) {
            match markdown::subsection_heading(&item).filter(|_| is_header(&item)) {
                Some(name) => groups.push(IngredientGroup {
                    name,
                    items: Vec::new(),
                }),
                None => {
                    if let Some(group) = groups.last_mut() {
                        group.items.push(item.clone());
                    }
                    ingredients.push(item);
                }
            }
        }
        self.ingredients = ingredients;

        match self.ingredient_groups.as_mut() {
            Some(existing) => {
                for group in existing.iter_mut() {
                    group.items.retain(|item| !is_header(item));
                }
                existing.retain(|group| !group.items.is_empty());
            }
            None => {
                groups.retain(|group| !group.items.is_empty());
                if !groups.is_empty() {
                    self.ingredient_groups = Some(groups);
                }
            }
        }
    }

    /// Look up an ingredient subsection by name
    pub fn group(&self, name: &str) -> Option<&IngredientGroup> {
        self.ingredient_groups
            .as_ref()
            .and_then(|groups| groups.iter().find(|g| g.name == name))
    }
}

/// Recipe body: either canonical markdown or fields from a structured path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RecipeContent {
    Markdown(String),
    Structured(StructuredRecipe),
}

/// Canonical output of one extraction call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub url: String,
    pub method: ExtractionMethod,
    pub content: RecipeContent,
}

impl Recipe {
    pub fn new(url: impl Into<String>, method: ExtractionMethod, mut content: RecipeContent) -> Self {
        if let RecipeContent::Structured(fields) = &mut content {
            fields.fold_subsection_headers();
        }
        Recipe {
            url: url.into(),
            method,
            content,
        }
    }

    /// Structured view of the recipe; markdown content is parsed on demand
    pub fn fields(&self) -> Cow<'_, StructuredRecipe> {
        match &self.content {
            RecipeContent::Structured(fields) => Cow::Borrowed(fields),
            RecipeContent::Markdown(text) => Cow::Owned(markdown::parse(text, DEFAULT_TITLE)),
        }
    }

    /// Markdown view of the recipe; structured content is rendered on demand
    pub fn markdown(&self) -> Cow<'_, str> {
        match &self.content {
            RecipeContent::Markdown(text) => Cow::Borrowed(text),
            RecipeContent::Structured(fields) => Cow::Owned(markdown::render(fields)),
        }
    }

    pub fn title(&self) -> String {
        self.fields().title.clone()
    }
}
