use super::{element_text, Extractor, ParsingContext};
use crate::error::ExtractError;
use crate::model::StructuredRecipe;
use log::debug;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ITEMSCOPE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[itemscope]").unwrap());

pub struct MicroDataExtractor;

impl MicroDataExtractor {
    fn find_recipe_container<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&ITEMSCOPE).find(|element| {
            element.value().attr("itemtype").is_some_and(|itemtype| {
                itemtype.contains("schema.org/Recipe")
                    || itemtype.contains("data-vocabulary.org/Recipe")
            })
        })
    }

    fn itemprop_selector(prop: &str) -> Result<Selector, ExtractError> {
        Selector::parse(&format!("[itemprop='{}']", prop))
            .map_err(|e| ExtractError::Parse(format!("Invalid itemprop selector: {e}")))
    }

    fn get_itemprop(&self, root: ElementRef, prop: &str) -> Option<String> {
        let selector = Self::itemprop_selector(prop).ok()?;
        root.select(&selector)
            .next()
            .map(|el| {
                // durations are usually carried in a machine-readable attribute
                el.value()
                    .attr("content")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(el))
            })
            .filter(|text| !text.is_empty())
    }

    fn get_itemprop_list(&self, root: ElementRef, prop: &str) -> Vec<String> {
        let Ok(selector) = Self::itemprop_selector(prop) else {
            return Vec::new();
        };
        root.select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl Extractor for MicroDataExtractor {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn parse(&self, context: &ParsingContext) -> Result<StructuredRecipe, ExtractError> {
        debug!("Attempting to extract recipe using MicroData extractor");

        // Only itemprops scoped to a Recipe item count; page-wide "name" or
        // "description" props belong to the site, not the recipe.
        let container = self
            .find_recipe_container(context.document)
            .ok_or_else(|| ExtractError::Parse("No MicroData Recipe container found".into()))?;

        let title = self
            .get_itemprop(container, "name")
            .ok_or_else(|| ExtractError::Parse("Could not extract recipe name".into()))?;

        let mut ingredients = self.get_itemprop_list(container, "recipeIngredient");
        if ingredients.is_empty() {
            ingredients = self.get_itemprop_list(container, "ingredients");
        }

        let mut instructions = self.get_itemprop_list(container, "recipeInstructions");
        if instructions.is_empty() {
            instructions = self.get_itemprop_list(container, "instructions");
        }

        if ingredients.is_empty() && instructions.is_empty() {
            return Err(ExtractError::NoRecipeContent);
        }

        Ok(StructuredRecipe {
            title,
            description: self.get_itemprop(container, "description"),
            ingredients,
            ingredient_groups: None,
            instructions,
            prep_time: self
                .get_itemprop(container, "prepTime")
                .map(|t| super::json_ld::convert_duration(&t)),
            cook_time: self
                .get_itemprop(container, "cookTime")
                .map(|t| super::json_ld::convert_duration(&t)),
            servings: self.get_itemprop(container, "recipeYield"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Result<StructuredRecipe, ExtractError> {
        let document = Html::parse_document(html);
        let context = ParsingContext {
            url: "https://example.com/recipe",
            document: &document,
        };
        MicroDataExtractor.parse(&context)
    }

    #[test]
    fn test_microdata_recipe() {
        let recipe = parse(
            r#"
            <html><body>
            <span itemprop="name">Site Name</span>
            <div itemscope itemtype="https://schema.org/Recipe">
                <h1 itemprop="name">Lemon   Bars</h1>
                <p itemprop="description">Tart and sweet.</p>
                <meta itemprop="prepTime" content="PT20M">
                <span itemprop="recipeYield">16 bars</span>
                <ul>
                    <li itemprop="recipeIngredient">1 cup butter</li>
                    <li itemprop="recipeIngredient">2 cups flour</li>
                </ul>
                <div itemprop="recipeInstructions">Bake the crust for 20 minutes.</div>
            </div>
            </body></html>
            "#,
        )
        .unwrap();

        assert_eq!(recipe.title, "Lemon Bars");
        assert_eq!(recipe.description.as_deref(), Some("Tart and sweet."));
        assert_eq!(recipe.prep_time.as_deref(), Some("20 minutes"));
        assert_eq!(recipe.servings.as_deref(), Some("16 bars"));
        assert_eq!(recipe.ingredients, vec!["1 cup butter", "2 cups flour"]);
        assert_eq!(recipe.instructions, vec!["Bake the crust for 20 minutes."]);
    }

    #[test]
    fn test_requires_recipe_container() {
        let result = parse(
            r#"<html><body><span itemprop="name">Site</span>
            <li itemprop="recipeIngredient">1 egg</li></body></html>"#,
        );
        assert!(result.is_err());
    }
}
