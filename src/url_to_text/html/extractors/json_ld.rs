use super::{Extractor, ParsingContext};
use crate::error::ExtractError;
use crate::model::StructuredRecipe;
use html_escape::decode_html_entities;
use log::debug;
use scraper::Selector;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[type='application/ld+json']").unwrap());

pub struct JsonLdExtractor;

impl JsonLdExtractor {
    fn convert_to_recipe(&self, json_ld_recipe: JsonLdRecipe) -> StructuredRecipe {
        let servings = json_ld_recipe.recipe_yield.and_then(|yield_val| {
            let yield_str = match yield_val {
                RecipeYield::String(s) => s,
                RecipeYield::Number(n) => n.to_string(),
                // prefer the descriptive entry ("4 servings") over the bare number
                RecipeYield::Array(arr) => arr
                    .iter()
                    .find(|s| s.contains(char::is_alphabetic))
                    .or_else(|| arr.first())
                    .cloned()
                    .unwrap_or_default(),
            };
            (!yield_str.is_empty()).then_some(yield_str)
        });

        let ingredients = match json_ld_recipe.recipe_ingredient {
            Some(RecipeIngredients::Strings(ingredients)) => ingredients
                .into_iter()
                .filter(|ing| !ing.trim().is_empty())
                .map(|ing| decode_html_symbols(&ing))
                .collect(),
            Some(RecipeIngredients::Objects(ingredients)) => ingredients
                .into_iter()
                .filter(|ing| !ing.name.trim().is_empty())
                .map(|ing| {
                    let amount = ing.amount.as_deref().unwrap_or("").trim();
                    let name = decode_html_symbols(&ing.name);
                    if amount.is_empty() {
                        name
                    } else {
                        format!("{amount} {name}")
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let instructions = match json_ld_recipe.recipe_instructions {
            Some(RecipeInstructions::String(text)) => split_instruction_text(&text),
            Some(RecipeInstructions::Multiple(steps)) => steps,
            Some(RecipeInstructions::MultipleObject(steps)) => {
                steps.into_iter().map(|obj| obj.text).collect()
            }
            Some(RecipeInstructions::HowTo(items)) => {
                items.into_iter().flat_map(HowTo::into_texts).collect()
            }
            Some(RecipeInstructions::NestedSections(sections)) => sections
                .into_iter()
                .flatten()
                .flat_map(HowTo::into_texts)
                .collect(),
            None => Vec::new(),
        };
        let instructions = instructions
            .iter()
            .map(|step| decode_html_symbols(step))
            .filter(|step| !step.is_empty())
            .collect();

        StructuredRecipe {
            title: decode_html_symbols(&json_ld_recipe.name),
            description: json_ld_recipe
                .description
                .map(|desc| match desc {
                    DescriptionType::String(d) => decode_html_symbols(&d),
                    DescriptionType::Object(d) => decode_html_symbols(&d.text),
                })
                .filter(|d| !d.is_empty()),
            ingredients,
            ingredient_groups: None,
            instructions,
            prep_time: non_empty_duration(json_ld_recipe.prep_time),
            cook_time: non_empty_duration(json_ld_recipe.cook_time),
            servings,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    name: String,
    description: Option<DescriptionType>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Option<RecipeIngredients>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<RecipeInstructions>,
    #[serde(rename = "recipeYield")]
    recipe_yield: Option<RecipeYield>,
    #[serde(rename = "prepTime")]
    prep_time: Option<String>,
    #[serde(rename = "cookTime")]
    cook_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextObject {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionType {
    String(String),
    Object(TextObject),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Strings(Vec<String>),
    Objects(Vec<IngredientObject>),
}

#[derive(Debug, Deserialize)]
struct IngredientObject {
    name: String,
    amount: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInstructions {
    String(String),
    Multiple(Vec<String>),
    HowTo(Vec<HowTo>),
    MultipleObject(Vec<TextObject>),
    NestedSections(Vec<Vec<HowTo>>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "@type")]
enum HowTo {
    HowToStep(HowToStep),
    HowToSection(HowToSection),
}

#[derive(Debug, Deserialize)]
struct HowToStep {
    text: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: Vec<HowToStep>,
}

impl HowToStep {
    // prefer text over name
    fn into_text(self) -> Option<String> {
        self.text.or(self.name)
    }
}

impl HowTo {
    fn into_texts(self) -> Vec<String> {
        match self {
            HowTo::HowToStep(step) => step.into_text().into_iter().collect(),
            HowTo::HowToSection(section) => section
                .item_list_element
                .into_iter()
                .filter_map(HowToStep::into_text)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    String(String),
    Number(i64),
    Array(Vec<String>),
}

fn decode_html_symbols(text: &str) -> String {
    // some sites double-encode entities
    let decoded = decode_html_entities(&decode_html_entities(text)).into_owned();
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A single instruction blob becomes one step per line, or one step total
fn split_instruction_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_duration(duration: Option<String>) -> Option<String> {
    duration
        .filter(|d| !d.trim().is_empty())
        .map(|d| convert_duration(&d))
}

fn plural(n: u32, unit: &str) -> String {
    format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
}

/// Convert an ISO 8601 duration to human-readable form:
/// `PT30M` → "30 minutes", `PT1H30M` / `PT90M` → "1 hour 30 minutes".
/// Ranges (`PT15-20M`) and seconds (`PT5400.0S`) are handled; anything else
/// passes through unchanged.
pub(crate) fn convert_duration(duration: &str) -> String {
    let Some(duration) = duration.strip_prefix("PT") else {
        return duration.to_string();
    };
    let mut parts: Vec<String> = Vec::new();

    if let Some(h_pos) = duration.find('H') {
        let hours: u32 = duration[..h_pos].parse().unwrap_or(0);
        parts.push(plural(hours, "hour"));
    }

    if let Some(m_pos) = duration.find('M') {
        let start = duration.find('H').map(|p| p + 1).unwrap_or(0);
        let minutes_str = &duration[start..m_pos];

        if minutes_str.contains('-') {
            parts.push(format!("{minutes_str} minutes"));
        } else if let Ok(minutes) = minutes_str.parse::<u32>() {
            if minutes >= 60 {
                parts.push(plural(minutes / 60, "hour"));
                if minutes % 60 > 0 {
                    parts.push(plural(minutes % 60, "minute"));
                }
            } else {
                parts.push(plural(minutes, "minute"));
            }
        }
    }

    if let Some(s_pos) = duration.find('S') {
        let start = duration.rfind(['H', 'M']).map(|p| p + 1).unwrap_or(0);
        if let Ok(seconds) = duration[start..s_pos].parse::<f64>() {
            let total_minutes = (seconds / 60.0).round() as u32;
            parts.clear();
            if total_minutes / 60 > 0 {
                parts.push(plural(total_minutes / 60, "hour"));
            }
            if total_minutes % 60 > 0 {
                parts.push(plural(total_minutes % 60, "minute"));
            }
        }
    }

    if parts.is_empty() {
        duration.to_string()
    } else {
        parts.join(" ")
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(type_str)) => type_str.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("recipe")),
        _ => false,
    }
}

fn find_recipe_value(json_ld: &Value) -> Option<&Value> {
    if let Some(items) = json_ld.as_array() {
        items
            .iter()
            .find(|item| is_recipe_type(item) || item.get("recipeInstructions").is_some())
    } else if is_recipe_type(json_ld) {
        Some(json_ld)
    } else {
        json_ld
            .get("@graph")
            .and_then(Value::as_array)
            .and_then(|graph| graph.iter().find(|item| is_recipe_type(item)))
    }
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn parse(&self, context: &ParsingContext) -> Result<StructuredRecipe, ExtractError> {
        debug!("JsonLdExtractor: Starting parse for URL: {}", context.url);

        for (index, script) in context.document.select(&LD_JSON).enumerate() {
            let cleaned_json = sanitize_json(&script.text().collect::<String>());
            let json_ld = match serde_json::from_str::<Value>(&cleaned_json) {
                Ok(json_ld) => json_ld,
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to parse JSON-LD {}: {}", index, e);
                    continue;
                }
            };

            let Some(recipe_json) = find_recipe_value(&json_ld) else {
                debug!("JsonLdExtractor: No recipe found in JSON-LD {}", index);
                continue;
            };

            match JsonLdRecipe::deserialize(recipe_json) {
                Ok(recipe) => return Ok(self.convert_to_recipe(recipe)),
                Err(e) => debug!("JsonLdExtractor: Failed to convert JSON-LD {}: {}", index, e),
            }
        }

        Err(ExtractError::Parse(
            "No valid recipe found in any JSON-LD script".to_string(),
        ))
    }
}

/// Repair the malformed JSON-LD some sites ship: stray whitespace, missing
/// commas between values, doubled commas and trailing commas.
fn sanitize_json(json_str: &str) -> String {
    let mut minified = String::with_capacity(json_str.len());
    let mut in_string = false;
    let mut prev_char = None;
    let mut depth = 0;
    let chars: Vec<char> = json_str.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '"' if prev_char != Some('\\') => {
                in_string = !in_string;
                if !in_string {
                    // closing quote directly followed by another value
                    let next_char = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if !matches!(prev_char, Some(',') | Some('[') | Some('{'))
                        && matches!(next_char, Some('"' | '[' | '{'))
                    {
                        minified.push('"');
                        minified.push(',');
                        prev_char = Some(',');
                        continue;
                    }
                }
                minified.push(c);
            }
            '[' | '{' if !in_string => {
                depth += 1;
                minified.push(c);
            }
            ']' | '}' if !in_string => {
                depth -= 1;
                minified.push(c);
                let next_char = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if depth > 0 && matches!(next_char, Some('"')) {
                    minified.push(',');
                    prev_char = Some(',');
                    continue;
                }
            }
            ',' if !in_string => {
                if prev_char != Some(',') {
                    minified.push(c);
                }
            }
            ':' if !in_string => {
                if prev_char == Some(',') {
                    minified.pop();
                }
                minified.push(c);
            }
            _ => {
                if in_string || !c.is_whitespace() {
                    minified.push(c);
                }
            }
        }
        prev_char = Some(c);
    }

    minified
        .replace(",]", "]")
        .replace(",}", "}")
        .replace(",,", ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn create_html_document(json_ld: &str) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <script type="application/ld+json">
                    {json_ld}
                </script>
            </head>
            <body></body>
            </html>
            "#
        )
    }

    fn parse(json_ld: &str) -> Result<StructuredRecipe, ExtractError> {
        let document = Html::parse_document(&create_html_document(json_ld));
        let context = ParsingContext {
            url: "http://example.com",
            document: &document,
        };
        JsonLdExtractor.parse(&context)
    }

    #[test]
    fn test_parse_without_json_ld() {
        let document = Html::parse_document("<html><body>Test</body></html>");
        let context = ParsingContext {
            url: "http://example.com",
            document: &document,
        };
        assert!(JsonLdExtractor.parse(&context).is_err());
    }

    #[test]
    fn test_parse_basic_recipe() {
        let recipe = parse(
            r#"
            {
                "@context": "https://schema.org/",
                "@type": "Recipe",
                "name": "Chocolate Chip Cookies",
                "description": "Delicious homemade cookies",
                "recipeIngredient": ["2 cups flour", "1 cup sugar", "chocolate chips"],
                "recipeInstructions": "Mix ingredients.\nBake at 350F for 10 minutes.",
                "prepTime": "PT15M",
                "cookTime": "PT10M",
                "recipeYield": "24 cookies"
            }
            "#,
        )
        .unwrap();

        assert_eq!(recipe.title, "Chocolate Chip Cookies");
        assert_eq!(
            recipe.description.as_deref(),
            Some("Delicious homemade cookies")
        );
        assert_eq!(
            recipe.ingredients,
            vec!["2 cups flour", "1 cup sugar", "chocolate chips"]
        );
        assert_eq!(
            recipe.instructions,
            vec!["Mix ingredients.", "Bake at 350F for 10 minutes."]
        );
        assert_eq!(recipe.prep_time.as_deref(), Some("15 minutes"));
        assert_eq!(recipe.cook_time.as_deref(), Some("10 minutes"));
        assert_eq!(recipe.servings.as_deref(), Some("24 cookies"));
    }

    #[test]
    fn test_duration_conversion() {
        assert_eq!(convert_duration("PT30M"), "30 minutes");
        assert_eq!(convert_duration("PT1H"), "1 hour");
        assert_eq!(convert_duration("PT1H30M"), "1 hour 30 minutes");
        assert_eq!(convert_duration("PT90M"), "1 hour 30 minutes");
        assert_eq!(convert_duration("PT2H15M"), "2 hours 15 minutes");
        assert_eq!(convert_duration("invalid"), "invalid");
        assert_eq!(convert_duration("PT15-20M"), "15-20 minutes");
        assert_eq!(convert_duration("PT5400.0S"), "1 hour 30 minutes");
        assert_eq!(convert_duration("PT300S"), "5 minutes");
        assert_eq!(convert_duration("PT180M"), "3 hours");
        assert_eq!(convert_duration("PT1M"), "1 minute");
    }

    #[test]
    fn test_array_and_how_to_steps() {
        let recipe = parse(
            r#"
            [
                {
                    "@context": "https://schema.org/",
                    "@type": "Recipe",
                    "name": "Pasta Carbonara",
                    "recipeIngredient": ["spaghetti", "eggs", "bacon", "cheese"],
                    "recipeInstructions": [
                        {"@type": "HowToStep", "text": "Cook pasta"},
                        {"@type": "HowToStep", "text": "Fry bacon"},
                        {"@type": "HowToStep", "name": "Mix eggs and cheese"}
                    ],
                    "recipeYield": 4
                },
                {
                    "@type": "WebSite",
                    "name": "Recipe Website"
                }
            ]
            "#,
        )
        .unwrap();

        assert_eq!(recipe.title, "Pasta Carbonara");
        assert_eq!(
            recipe.instructions,
            vec!["Cook pasta", "Fry bacon", "Mix eggs and cheese"]
        );
        assert_eq!(recipe.servings.as_deref(), Some("4"));
    }

    #[test]
    fn test_graph_with_sections_and_entities() {
        let recipe = parse(
            r#"
            {
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "WebPage", "name": "Page"},
                    {
                        "@type": ["RECIPE"],
                        "name": "Mac &amp;amp; Cheese",
                        "recipeIngredient": ["8 oz macaroni", "2 cups cheddar"],
                        "recipeInstructions": [
                            {
                                "@type": "HowToSection",
                                "name": "Pasta",
                                "itemListElement": [
                                    {"@type": "HowToStep", "text": "Boil the macaroni."}
                                ]
                            },
                            {
                                "@type": "HowToSection",
                                "name": "Sauce",
                                "itemListElement": [
                                    {"@type": "HowToStep", "text": "Melt the cheddar."},
                                    {"@type": "HowToStep", "text": "Stir it in."}
                                ]
                            }
                        ]
                    }
                ]
            }
            "#,
        )
        .unwrap();

        assert_eq!(recipe.title, "Mac & Cheese");
        assert_eq!(
            recipe.instructions,
            vec!["Boil the macaroni.", "Melt the cheddar.", "Stir it in."]
        );
    }

    #[test]
    fn test_sanitize_missing_commas() {
        let recipe = parse(
            r#"
            {
                "@type": "Recipe",
                "name": "Broken"
                "recipeIngredient": ["1 egg" "1 cup milk",],
                "recipeInstructions": ["Whisk.",]
            }
            "#,
        )
        .unwrap();

        assert_eq!(recipe.title, "Broken");
        assert_eq!(recipe.ingredients, vec!["1 egg", "1 cup milk"]);
    }
}
