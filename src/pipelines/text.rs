use crate::error::ExtractError;
use crate::markdown;
use crate::model::{RecipeContent, StructuredRecipe};
use log::debug;

fn looks_like_json_object(text: &str) -> bool {
    text.starts_with('{') && text.ends_with('}')
}

fn parse_json(text: &str, default_title: &str) -> Option<StructuredRecipe> {
    match serde_json::from_str::<StructuredRecipe>(text) {
        Ok(mut recipe) => {
            if recipe.title.trim().is_empty() {
                recipe.title = default_title.to_string();
            }
            Some(recipe)
        }
        Err(e) => {
            debug!("Completion looked like JSON but did not parse: {}", e);
            None
        }
    }
}

/// Turn an LLM completion into recipe content.
///
/// A response that is syntactically a JSON object is read as structured
/// fields; anything else is treated as markdown. Markdown without a `# `
/// title gets `default_title` prepended so that re-parsing the stored text
/// gives the same title. A response matching neither contract is kept
/// verbatim as a single instruction.
///
/// Fails only when the completion is empty.
pub fn parse_completion(raw: &str, default_title: &str) -> Result<RecipeContent, ExtractError> {
    let cleaned = markdown::strip_fences(raw);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Parse("LLM returned an empty completion".into()));
    }

    if looks_like_json_object(trimmed) {
        if let Some(recipe) = parse_json(trimmed, default_title) {
            if recipe.has_content() {
                return Ok(RecipeContent::Structured(recipe));
            }
        }
    }

    let normalized = markdown::normalize_headings(trimmed);
    let parsed = markdown::parse(&normalized, "");
    if parsed.has_content() {
        let text = if parsed.title.is_empty() {
            format!("# {}\n\n{}", default_title, normalized)
        } else {
            normalized
        };
        return Ok(RecipeContent::Markdown(text));
    }

    debug!("Completion matched neither contract, keeping it as one instruction");
    Ok(RecipeContent::Structured(StructuredRecipe {
        title: if parsed.title.is_empty() {
            default_title.to_string()
        } else {
            parsed.title
        },
        instructions: vec![trimmed.to_string()],
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractionMethod, Recipe};

    #[test]
    fn test_json_completion() {
        let raw = r#"```json
{"title": "Pesto", "ingredients": ["2 cups basil", "1/2 cup olive oil"], "instructions": ["Blend everything."], "prepTime": "10 minutes"}
```"#;
        let content = parse_completion(raw, "Page Title").unwrap();
        let RecipeContent::Structured(recipe) = content else {
            panic!("expected structured content");
        };
        assert_eq!(recipe.title, "Pesto");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.prep_time.as_deref(), Some("10 minutes"));
    }

    #[test]
    fn test_json_with_numeric_servings() {
        let raw = r#"{"title":"Soup","ingredients":["1 cup water"],"instructions":["Boil."],"servings":4,"cook_time":20}"#;
        let RecipeContent::Structured(recipe) = parse_completion(raw, "Page").unwrap() else {
            panic!("expected structured content");
        };
        assert_eq!(recipe.title, "Soup");
        assert_eq!(recipe.ingredients, vec!["1 cup water"]);
        assert_eq!(recipe.instructions, vec!["Boil."]);
        assert_eq!(recipe.servings.as_deref(), Some("4"));
        assert_eq!(recipe.cook_time.as_deref(), Some("20"));
    }

    #[test]
    fn test_json_without_title_uses_default() {
        let raw = r#"{"ingredients": ["1 egg"], "instructions": ["Fry the egg."]}"#;
        let content = parse_completion(raw, "Fried Egg").unwrap();
        let recipe = Recipe::new("https://example.com", ExtractionMethod::Deepseek, content);
        assert_eq!(recipe.title(), "Fried Egg");
    }

    #[test]
    fn test_markdown_completion() {
        let raw = "# Spaghetti\n## Ingredients\n- 1 cup flour\n- 2 eggs\n## Instructions\n1. Mix ingredients.\n2. Boil water.";
        let content = parse_completion(raw, "ignored").unwrap();
        let recipe = Recipe::new("https://example.com", ExtractionMethod::Deepseek, content);
        let fields = recipe.fields();
        assert_eq!(fields.title, "Spaghetti");
        assert_eq!(fields.ingredients, vec!["1 cup flour", "2 eggs"]);
        assert_eq!(fields.instructions, vec!["Mix ingredients.", "Boil water."]);
    }

    #[test]
    fn test_markdown_headings_are_normalized_and_titled() {
        let raw = "**Ingredients**\n- 3 apples\n\n**Directions**\n1. Slice the apples.";
        let content = parse_completion(raw, "Apple Slices").unwrap();
        let recipe = Recipe::new("https://example.com", ExtractionMethod::Deepseek, content);
        assert!(matches!(recipe.content, RecipeContent::Markdown(_)));
        assert_eq!(recipe.title(), "Apple Slices");
        assert_eq!(recipe.fields().ingredients, vec!["3 apples"]);
        assert_eq!(recipe.fields().instructions, vec!["Slice the apples."]);
    }

    #[test]
    fn test_unstructured_completion_becomes_single_instruction() {
        let raw = "Sorry, I could not find a recipe on that page.";
        let content = parse_completion(raw, "Mystery").unwrap();
        let RecipeContent::Structured(recipe) = content else {
            panic!("expected structured content");
        };
        assert_eq!(recipe.title, "Mystery");
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.instructions, vec![raw]);
    }

    #[test]
    fn test_empty_completion_is_an_error() {
        assert!(matches!(
            parse_completion("  ``` ```  ", "x"),
            Err(ExtractError::Parse(_))
        ));
    }
}
