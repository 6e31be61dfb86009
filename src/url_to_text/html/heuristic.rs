//! Last-resort scanning of page text blocks when a page carries no
//! machine-readable recipe markup.

use super::text::TextBlock;
use crate::classifier::{
    has_measurement, is_navigation_noise, looks_like_ingredient, looks_like_instruction,
};
use crate::model::StructuredRecipe;
use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static STEP_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:step\s*)?\d+[.):]\s*").unwrap());

enum Candidate {
    Ingredient,
    Instruction,
}

fn candidate(block: &TextBlock) -> Option<Candidate> {
    let text = block.text.as_str();
    match block.tag.as_str() {
        "li" if !block.ordered => {
            if has_measurement(text) || (looks_like_ingredient(text) && !looks_like_instruction(text))
            {
                Some(Candidate::Ingredient)
            } else if looks_like_instruction(text) {
                Some(Candidate::Instruction)
            } else {
                None
            }
        }
        "li" | "p" | "div" | "td" | "section" | "article" | "main" | "body" => {
            looks_like_instruction(text).then_some(Candidate::Instruction)
        }
        _ => None,
    }
}

/// Sort text blocks into ingredient and instruction lists. Navigation noise
/// and repeated lines are dropped; the caller decides whether the result
/// has enough content to use.
pub fn scrape(blocks: &[TextBlock], title: &str) -> StructuredRecipe {
    let mut seen = HashSet::new();
    let mut recipe = StructuredRecipe {
        title: title.to_string(),
        ..Default::default()
    };

    for block in blocks {
        if is_navigation_noise(&block.text) || !seen.insert(block.text.to_lowercase()) {
            continue;
        }
        match candidate(block) {
            Some(Candidate::Ingredient) => recipe.ingredients.push(block.text.clone()),
            Some(Candidate::Instruction) => {
                let step = STEP_NUMBER_RE.replace(&block.text, "").trim().to_string();
                if !step.is_empty() {
                    recipe.instructions.push(step);
                }
            }
            None => {}
        }
    }

    debug!(
        "Heuristic scan: {} ingredients, {} instructions from {} blocks",
        recipe.ingredients.len(),
        recipe.instructions.len(),
        blocks.len()
    );
    recipe
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(tag: &str, ordered: bool, text: &str) -> TextBlock {
        TextBlock {
            tag: tag.to_string(),
            ordered,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_lists_are_sorted_by_shape() {
        let blocks = vec![
            block("li", false, "2 cups flour"),
            block("li", false, "1 tsp salt"),
            block("li", false, "Skip to content"),
            block("li", true, "1. Preheat the oven to 350 degrees."),
            block("p", false, "Bake for 25 minutes until golden brown."),
            block("p", false, "I love this one."),
        ];
        let recipe = scrape(&blocks, "Bread");

        assert_eq!(recipe.title, "Bread");
        assert_eq!(recipe.ingredients, vec!["2 cups flour", "1 tsp salt"]);
        assert_eq!(
            recipe.instructions,
            vec![
                "Preheat the oven to 350 degrees.",
                "Bake for 25 minutes until golden brown."
            ]
        );
    }

    #[test]
    fn test_noise_and_duplicates_dropped() {
        let blocks = vec![
            block("li", false, "Subscribe to our Newsletter"),
            block("li", false, "2 tbsp butter"),
            block("li", false, "2 tbsp butter"),
        ];
        let recipe = scrape(&blocks, "Toast");
        assert_eq!(recipe.ingredients, vec!["2 tbsp butter"]);
        assert!(recipe.instructions.is_empty());
    }

    #[test]
    fn test_no_candidates() {
        let blocks = vec![block("h2", false, "About me"), block("p", false, "Hi!")];
        assert!(!scrape(&blocks, "Blog").has_content());
    }
}
