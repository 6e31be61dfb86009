use super::{element_text, Extractor, ParsingContext};
use crate::error::ExtractError;
use crate::model::{IngredientGroup, StructuredRecipe};
use log::debug;
use scraper::{ElementRef, Html, Selector};

pub struct HtmlClassExtractor;

/// Class names used by recipe-card plugins (WPRM, Tasty, Mediavine, WP Zoom)
/// and common hand-rolled themes, most specific first.
const TITLE_CLASSES: &[&str] = &[
    "wprm-recipe-name",
    "tasty-recipes-title",
    "mv-create-title",
    "wpzoom-recipe-card-title",
    "recipe-card-title",
    "recipe-name",
    "recipe-title",
];

const DESCRIPTION_CLASSES: &[&str] = &[
    "wprm-recipe-summary",
    "tasty-recipes-description",
    "mv-create-description",
    "wpzoom-recipe-summary",
    "recipe-summary",
    "recipe-description",
];

const INGREDIENT_CLASSES: &[&str] = &[
    "wprm-recipe-ingredients-container",
    "tasty-recipes-ingredients",
    "mv-create-ingredients",
    "wpzoom-recipe-ingredients",
    "recipe-ingredients",
    "recipe-ingredient-list",
    "structured-ingredients",
];

const INSTRUCTION_CLASSES: &[&str] = &[
    "wprm-recipe-instructions-container",
    "tasty-recipes-instructions",
    "mv-create-instructions",
    "wpzoom-recipe-instructions",
    "recipe-instructions",
    "recipe-instruction-list",
    "recipe-directions",
    "directions",
];

const PREP_TIME_CLASSES: &[&str] = &[
    "wprm-recipe-prep_time-container",
    "wprm-recipe-prep-time",
    "tasty-recipes-prep-time",
    "mv-create-time-prep",
    "recipe-prep-time",
    "prep-time",
];

const COOK_TIME_CLASSES: &[&str] = &[
    "wprm-recipe-cook_time-container",
    "wprm-recipe-cook-time",
    "tasty-recipes-cook-time",
    "mv-create-time-active",
    "recipe-cook-time",
    "cook-time",
];

const SERVINGS_CLASSES: &[&str] = &[
    "wprm-recipe-servings",
    "tasty-recipes-yield",
    "mv-create-yield",
    "recipe-servings",
    "recipe-yield",
];

/// Heading classes that open an ingredient group inside a container
const GROUP_NAME_CLASSES: &[&str] = &[
    "wprm-recipe-ingredient-group-name",
    "wprm-recipe-group-name",
    "tasty-recipes-ingredients-header",
    "mv-create-ingredients-group-name",
];

fn class_selector(class_name: &str) -> Option<Selector> {
    Selector::parse(&format!(".{class_name}")).ok()
}

fn has_any_class(element: ElementRef, classes: &[&str]) -> bool {
    element
        .value()
        .classes()
        .any(|class| classes.contains(&class))
}

fn find_text(document: &Html, classes: &[&str]) -> Option<String> {
    classes.iter().find_map(|class_name| {
        let selector = class_selector(class_name)?;
        let text = document
            .select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            None
        } else {
            debug!("Found text using class: {}", class_name);
            Some(text)
        }
    })
}

fn find_container<'a>(
    document: &'a Html,
    classes: &[&'static str],
) -> Option<(ElementRef<'a>, &'static str)> {
    classes.iter().find_map(|class_name| {
        let selector = class_selector(class_name)?;
        document.select(&selector).next().map(|el| (el, *class_name))
    })
}

/// List items of a container in document order, with group headings
/// opening a new group
fn collect_items(container: ElementRef) -> (Vec<String>, Vec<IngredientGroup>) {
    let mut items = Vec::new();
    let mut groups: Vec<IngredientGroup> = Vec::new();

    for element in container.descendants().filter_map(ElementRef::wrap) {
        if has_any_class(element, GROUP_NAME_CLASSES) {
            let name = element_text(element)
                .trim_end_matches(':')
                .trim()
                .to_string();
            if !name.is_empty() {
                groups.push(IngredientGroup {
                    name,
                    items: Vec::new(),
                });
            }
        } else if element.value().name() == "li" {
            let text = element_text(element);
            if text.is_empty() {
                continue;
            }
            if let Some(group) = groups.last_mut() {
                group.items.push(text.clone());
            }
            items.push(text);
        }
    }

    // steps laid out as paragraphs instead of a list
    if items.is_empty() {
        if let Ok(selector) = Selector::parse("p") {
            items = container
                .select(&selector)
                .map(element_text)
                .filter(|text| text.len() > 5 && text.len() < 500)
                .collect();
        }
    }

    groups.retain(|group| !group.items.is_empty());
    (items, groups)
}

impl Extractor for HtmlClassExtractor {
    fn name(&self) -> &'static str {
        "html-class"
    }

    fn parse(&self, context: &ParsingContext) -> Result<StructuredRecipe, ExtractError> {
        debug!("Attempting to extract recipe using HTML class matchers");
        let document = context.document;

        let (ingredients, groups) = match find_container(document, INGREDIENT_CLASSES) {
            Some((container, class_name)) => {
                debug!("Found ingredients using class: {}", class_name);
                collect_items(container)
            }
            None => (Vec::new(), Vec::new()),
        };
        let instructions = find_container(document, INSTRUCTION_CLASSES)
            .map(|(container, _)| collect_items(container).0)
            .unwrap_or_default();

        if ingredients.is_empty() && instructions.is_empty() {
            return Err(ExtractError::Parse(
                "Could not extract recipe content from HTML classes".to_string(),
            ));
        }

        let title = find_text(document, TITLE_CLASSES)
            .ok_or_else(|| ExtractError::Parse("Could not extract recipe title from HTML".into()))?;

        debug!(
            "HTML class extraction: {} ingredients, {} instructions",
            ingredients.len(),
            instructions.len()
        );

        Ok(StructuredRecipe {
            title,
            description: find_text(document, DESCRIPTION_CLASSES),
            ingredients,
            ingredient_groups: (!groups.is_empty()).then_some(groups),
            instructions,
            prep_time: find_text(document, PREP_TIME_CLASSES),
            cook_time: find_text(document, COOK_TIME_CLASSES),
            servings: find_text(document, SERVINGS_CLASSES),
        })
    }
}
