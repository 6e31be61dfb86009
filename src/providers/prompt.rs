use crate::model::DeviceVariant;

/// Base system prompt for recipe extraction.
///
/// Loaded from `prompt.txt` at compile time so the wording can be edited
/// without dealing with Rust string syntax.
pub const RECIPE_EXTRACTION_PROMPT: &str = include_str!("prompt.txt");

/// System prompt for one device variant. Mobile asks for a terser answer to
/// fit the smaller token budget; both carry the list of page chrome strings
/// the model must never mistake for recipe content.
pub fn build_system_prompt(variant: DeviceVariant, avoid_phrases: &[String]) -> String {
    let mut prompt = RECIPE_EXTRACTION_PROMPT.to_string();

    if variant == DeviceVariant::Mobile {
        prompt.push_str(
            "\n\nKeep the answer compact: omit the description and shorten long instructions without dropping any step.",
        );
    }

    let phrases: Vec<&str> = avoid_phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !phrases.is_empty() {
        prompt.push_str(&format!(
            "\n\nThese strings are website interface text, never ingredients or steps: {}.",
            phrases
                .iter()
                .map(|p| format!("\"{p}\""))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    prompt
}

/// User prompt: the page text (or structured draft) with its source URL
pub fn build_user_prompt(url: &str, page_text: &str) -> String {
    format!("Source: {url}\n\n{page_text}")
}
