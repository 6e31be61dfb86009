//! Markdown recipe contract: `# Title`, `## Ingredients`, `## Instructions`.
//!
//! `parse` and `render` are inverses for single-line items, which is what
//! lets a `Recipe` carry only its markdown and derive the fields lazily.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::model::{IngredientGroup, StructuredRecipe};

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s+(.+?)\s*$").unwrap());

static STEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s*(.+)$").unwrap());

static METADATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\*\*(prep time|cook time|servings):\*\*\s*(.+)$").unwrap()
});

static HASH_SUBSECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{3,}\s*(.+?):?\s*$").unwrap());

static BOLD_SUBSECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(.+?):?\*\*:?$").unwrap());

static CAPS_SUBSECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z0-9 &'/,()\-]*):$").unwrap());

static FOR_THE_SUBSECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(for the .+?):$").unwrap());

static CAPITALIZED_SUBSECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][a-z]+(?:\s+[A-Za-z]+){0,3}):$").unwrap());

static CANONICAL_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:#{1,6}\s*)?(?:\*\*)?\s*(ingredients?|instructions|directions|method|steps|preparation)\s*:?\s*(?:\*\*)?\s*:?$",
    )
    .unwrap()
});

/// One `## ` section of a markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Ingredients,
    Instructions,
    Other,
}

fn section_kind(heading: &str) -> SectionKind {
    let heading = heading.trim().to_lowercase();
    if heading.starts_with("ingredient") {
        SectionKind::Ingredients
    } else if ["instruction", "direction", "method", "step", "preparation"]
        .iter()
        .any(|prefix| heading.starts_with(prefix))
    {
        SectionKind::Instructions
    } else {
        SectionKind::Other
    }
}

/// Remove code-fence artifacts that LLMs like to wrap markdown in
pub fn strip_fences(text: &str) -> String {
    let mut body = text.trim();

    if body.starts_with("```") || body.starts_with("'''") {
        body = match body.find('\n') {
            Some(pos) => &body[pos + 1..],
            None => "",
        };
    }
    let trimmed_end = body.trim_end();
    if trimmed_end.ends_with("```") || trimmed_end.ends_with("'''") {
        body = &trimmed_end[..trimmed_end.len() - 3];
    }

    body.lines()
        .filter(|line| line.trim() != "```")
        .collect::<Vec<_>>()
        .join("\n")
        .replace("'''", "")
}

/// Split a document on `## ` headings. Text before the first heading is not
/// part of any section.
pub fn parse_markdown_sections(markdown: &str) -> Vec<MarkdownSection> {
    let cleaned = strip_fences(markdown);
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in cleaned.lines() {
        if let Some(heading) = line.trim_start().strip_prefix("## ") {
            if let Some((heading, body)) = current.take() {
                sections.push(MarkdownSection {
                    heading,
                    body: body.join("\n").trim().to_string(),
                });
            }
            current = Some((heading.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((heading, body)) = current {
        sections.push(MarkdownSection {
            heading,
            body: body.join("\n").trim().to_string(),
        });
    }

    sections
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Recognise an ingredient subsection header and return its name
pub fn subsection_heading(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.len() > 80 {
        return None;
    }

    [
        &*HASH_SUBSECTION_RE,
        &*BOLD_SUBSECTION_RE,
        &*FOR_THE_SUBSECTION_RE,
        &*CAPS_SUBSECTION_RE,
        &*CAPITALIZED_SUBSECTION_RE,
    ]
    .iter()
    .find_map(|re| re.captures(line))
    .map(|caps| caps[1].trim().trim_end_matches(':').trim().to_string())
    .filter(|name| !name.is_empty())
}

fn parse_ingredients(
    body: &str,
    ingredients: &mut Vec<String>,
    groups: &mut Vec<IngredientGroup>,
) {
    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match list_item(line) {
            Some(item) => {
                if item.ends_with(':') {
                    if let Some(name) = subsection_heading(item) {
                        groups.push(IngredientGroup {
                            name,
                            items: Vec::new(),
                        });
                        continue;
                    }
                }
                ingredients.push(item.to_string());
                if let Some(group) = groups.last_mut() {
                    group.items.push(item.to_string());
                }
            }
            None => {
                if let Some(name) = subsection_heading(line) {
                    groups.push(IngredientGroup {
                        name,
                        items: Vec::new(),
                    });
                }
            }
        }
    }
}

fn parse_instructions(body: &str, instructions: &mut Vec<String>) {
    for raw in body.lines() {
        let line = raw.trim();
        if let Some(caps) = STEP_RE.captures(line) {
            instructions.push(caps[1].trim().to_string());
        } else if let Some(item) = list_item(line) {
            instructions.push(item.to_string());
        }
    }
}

/// Parse a markdown recipe. Missing sections yield empty lists; a missing
/// `# ` title yields `default_title`.
pub fn parse(markdown: &str, default_title: &str) -> StructuredRecipe {
    let cleaned = strip_fences(markdown);

    let title = cleaned
        .lines()
        .find_map(|line| TITLE_RE.captures(line.trim()))
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| default_title.to_string());

    let mut recipe = StructuredRecipe {
        title,
        ..Default::default()
    };

    // Preamble: everything before the first `## ` heading
    let mut description = Vec::new();
    for line in cleaned.lines() {
        let line = line.trim();
        if line.starts_with("## ") {
            break;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(caps) = METADATA_RE.captures(line) {
            let value = caps[2].trim().to_string();
            match caps[1].to_lowercase().as_str() {
                "prep time" => recipe.prep_time = Some(value),
                "cook time" => recipe.cook_time = Some(value),
                _ => recipe.servings = Some(value),
            }
        } else {
            description.push(line);
        }
    }
    if !description.is_empty() {
        recipe.description = Some(description.join(" "));
    }

    let mut groups = Vec::new();
    for section in parse_markdown_sections(&cleaned) {
        match section_kind(&section.heading) {
            SectionKind::Ingredients => {
                parse_ingredients(&section.body, &mut recipe.ingredients, &mut groups)
            }
            SectionKind::Instructions => parse_instructions(&section.body, &mut recipe.instructions),
            SectionKind::Other => debug!("Skipping markdown section: {}", section.heading),
        }
    }

    groups.retain(|group| !group.items.is_empty());
    if !groups.is_empty() {
        recipe.ingredient_groups = Some(groups);
    }

    recipe
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render structured fields into the markdown contract. Steps are always
/// numbered from 1 regardless of any numbering in the source.
pub fn render(recipe: &StructuredRecipe) -> String {
    let mut out = format!("# {}\n", single_line(&recipe.title));

    if let Some(description) = recipe.description.as_deref().map(single_line) {
        if !description.is_empty() {
            out.push_str(&format!("\n{description}\n"));
        }
    }

    let metadata: Vec<String> = [
        ("Prep Time", &recipe.prep_time),
        ("Cook Time", &recipe.cook_time),
        ("Servings", &recipe.servings),
    ]
    .iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .map(single_line)
            .filter(|v| !v.is_empty())
            .map(|v| format!("**{label}:** {v}"))
    })
    .collect();
    if !metadata.is_empty() {
        out.push('\n');
        for line in metadata {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out.push_str("\n## Ingredients\n\n");
    match grouped_layout(recipe) {
        Some((ungrouped, groups)) => {
            for item in ungrouped {
                out.push_str(&format!("- {}\n", single_line(item)));
            }
            for group in groups {
                out.push_str(&format!("\n### {}\n\n", single_line(&group.name)));
                for item in &group.items {
                    out.push_str(&format!("- {}\n", single_line(item)));
                }
            }
        }
        None => {
            for item in &recipe.ingredients {
                out.push_str(&format!("- {}\n", single_line(item)));
            }
        }
    }

    out.push_str("\n## Instructions\n\n");
    for (i, step) in recipe.instructions.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, single_line(step)));
    }

    out
}

/// Groups are only rendered when they account for a suffix of the flat
/// ingredient list; anything else would not round-trip.
fn grouped_layout(recipe: &StructuredRecipe) -> Option<(&[String], &[IngredientGroup])> {
    let groups = recipe.ingredient_groups.as_deref()?;
    let grouped: Vec<&String> = groups.iter().flat_map(|g| g.items.iter()).collect();
    if grouped.is_empty() || grouped.len() > recipe.ingredients.len() {
        return None;
    }
    let split = recipe.ingredients.len() - grouped.len();
    let suffix_matches = recipe.ingredients[split..]
        .iter()
        .zip(grouped.iter())
        .all(|(a, b)| a == *b);
    suffix_matches.then(|| (&recipe.ingredients[..split], groups))
}

/// Rewrite ad-hoc section headings ("**Directions:**", "# Method",
/// "Ingredients:") into the canonical `## Ingredients` / `## Instructions`.
pub fn normalize_headings(markdown: &str) -> String {
    markdown
        .lines()
        .map(|line| match CANONICAL_HEADING_RE.captures(line.trim()) {
            Some(caps) => {
                if caps[1].to_lowercase().starts_with("ingredient") {
                    "## Ingredients".to_string()
                } else {
                    "## Instructions".to_string()
                }
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
