use regex::Regex;
use std::sync::LazyLock;

/// Qualifiers dropped from ingredient names, applied in this order
pub const UNNECESSARY_QUALIFIERS: &[&str] = &[
    "fresh", "freshly", "ripe", "whole", "large", "medium", "small", "organic", "chopped",
    "diced", "minced", "sliced", "finely", "roughly", "to taste", "optional",
];

/// Phrases that change what is bought; a qualifier inside one of these is
/// kept whenever the phrase is present.
pub const ESSENTIAL_QUALIFIERS: &[&str] = &[
    "whole grain",
    "whole wheat",
    "whole milk",
    "fresh mozzarella",
];

static QUALIFIER_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    UNNECESSARY_QUALIFIERS
        .iter()
        .map(|q| {
            let re = Regex::new(&format!(r"\b{}\b", regex::escape(q))).unwrap();
            (*q, re)
        })
        .collect()
});

static LEADING_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\d\p{P}¼½¾⅓⅔⅛]+").unwrap());

/// Clean an ingredient name for display: lowercase, drop filler qualifiers
/// one after another, then title-case each word.
pub fn standardize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut text = LEADING_NOISE_RE.replace(&lower, "").into_owned();

    for (qualifier, re) in QUALIFIER_RES.iter() {
        let protected = ESSENTIAL_QUALIFIERS
            .iter()
            .any(|essential| essential.contains(qualifier) && text.contains(essential));
        if protected {
            continue;
        }
        text = re.replace_all(&text, "").into_owned();
    }

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
