//! Quantity parsing, unit canonicalisation and merge arithmetic.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

const UNICODE_FRACTIONS: &[(char, f64)] = &[
    ('¼', 0.25),
    ('½', 0.5),
    ('¾', 0.75),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
];

/// Raw unit token → canonical unit
const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("tablespoons", "tablespoons"),
    ("tablespoon", "tablespoons"),
    ("tbsp", "tablespoons"),
    ("tbsps", "tablespoons"),
    ("tbs", "tablespoons"),
    ("teaspoons", "teaspoons"),
    ("teaspoon", "teaspoons"),
    ("tsp", "teaspoons"),
    ("tsps", "teaspoons"),
    ("ounces", "ounces"),
    ("ounce", "ounces"),
    ("oz", "ounces"),
    ("pounds", "pounds"),
    ("pound", "pounds"),
    ("lbs", "pounds"),
    ("lb", "pounds"),
    ("cups", "cups"),
    ("cup", "cups"),
    ("grams", "g"),
    ("gram", "g"),
    ("g", "g"),
    ("kilograms", "kg"),
    ("kilogram", "kg"),
    ("kg", "kg"),
    ("milliliters", "ml"),
    ("millilitres", "ml"),
    ("ml", "ml"),
    ("liters", "l"),
    ("litres", "l"),
    ("l", "l"),
    ("cloves", "cloves"),
    ("clove", "cloves"),
    ("cans", "cans"),
    ("can", "cans"),
    ("pinches", "pinch"),
    ("pinch", "pinch"),
    ("slices", "slices"),
    ("slice", "slices"),
    ("sticks", "sticks"),
    ("stick", "sticks"),
];

static WORD_FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(\d+(?:\.\d+)?)\s+)?(three[- ]quarters?|half|quarter|third)\b(?:\s+of\b)?(?:\s+an?\b)?",
    )
    .unwrap()
});

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(\d+)\s*([¼½¾⅓⅔])|([¼½¾⅓⅔])|(\d+)\s+(\d+)/(\d+)|(\d+)/(\d+)|(\d+(?:\.\d+)?))",
    )
    .unwrap()
});

static UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z]+)\.?(?:\s|$)").unwrap());

/// Package size between the amount and the unit, as in "1 (14 oz) can"
static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\(\s*([\d¼½¾⅓⅔/.]+)\s*-?\s*([A-Za-z]+)\.?\s*\)").unwrap()
});

static LEADING_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\d¼½¾⅓⅔/.\-]+").unwrap());

static COUNT_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*$").unwrap());

/// A numeric amount with a canonical (possibly empty) unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: f64,
    pub unit: String,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.amount))?;
        if !self.unit.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

/// Result of merging two quantity strings
#[derive(Debug, Clone, PartialEq)]
pub enum MergedQuantity {
    /// Same unit on both sides, amounts added
    Summed(Quantity),
    /// Incompatible or unparseable; both kept verbatim
    Concatenated(String, String),
    /// One side had no quantity at all
    Kept(String),
}

impl fmt::Display for MergedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergedQuantity::Summed(quantity) => write!(f, "{quantity}"),
            MergedQuantity::Concatenated(a, b) => write!(f, "{a} + {b}"),
            MergedQuantity::Kept(text) => f.write_str(text),
        }
    }
}

pub fn canonical_unit(token: &str) -> Option<&'static str> {
    let token = token.trim().trim_end_matches('.').to_lowercase();
    UNIT_SYNONYMS
        .iter()
        .find(|(raw, _)| *raw == token)
        .map(|(_, canonical)| *canonical)
}

fn fraction_glyph_value(glyph: &str) -> Option<f64> {
    let c = glyph.chars().next()?;
    UNICODE_FRACTIONS
        .iter()
        .find(|(g, _)| *g == c)
        .map(|(_, value)| *value)
}

fn fraction_word_value(word: &str) -> f64 {
    let word = word.to_lowercase();
    if word.starts_with("three") {
        0.75
    } else if word == "half" {
        0.5
    } else if word == "quarter" {
        0.25
    } else {
        1.0 / 3.0
    }
}

fn number(caps: &Captures, index: usize) -> Option<f64> {
    caps.get(index).and_then(|m| m.as_str().parse::<f64>().ok())
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Leading amount of `text` and the byte offset where it ends
fn parse_amount(text: &str) -> Option<(f64, usize)> {
    if let Some(caps) = WORD_FRACTION_RE.captures(text) {
        let end = caps.get(0)?.end();
        // "half-and-half" is an ingredient, not an amount
        if !text[end..].starts_with('-') {
            let whole = number(&caps, 1).unwrap_or(0.0);
            return Some((whole + fraction_word_value(&caps[2]), end));
        }
    }

    let caps = AMOUNT_RE.captures(text)?;
    let end = caps.get(0)?.end();
    let amount = if caps.get(2).is_some() {
        number(&caps, 1)? + fraction_glyph_value(&caps[2])?
    } else if let Some(glyph) = caps.get(3) {
        fraction_glyph_value(glyph.as_str())?
    } else if caps.get(4).is_some() {
        number(&caps, 4)? + ratio(number(&caps, 5), number(&caps, 6))?
    } else if caps.get(7).is_some() {
        ratio(number(&caps, 7), number(&caps, 8))?
    } else {
        number(&caps, 9)?
    };
    Some((amount, end))
}

/// "(14 oz)" → "(14 ounces)" and the byte length consumed
fn parse_package(rest: &str) -> Option<(String, usize)> {
    let caps = PACKAGE_RE.captures(rest)?;
    let unit = canonical_unit(&caps[2]).map_or_else(|| caps[2].to_lowercase(), str::to_string);
    Some((format!("({} {})", &caps[1], unit), caps.get(0)?.end()))
}

/// Parse a leading quantity (amount, optional package size, optional known
/// unit) and report the byte offset just past it. A package size becomes
/// part of the unit so that only identical packages are summed.
pub fn parse_prefix(text: &str) -> Option<(Quantity, usize)> {
    let (amount, amount_end) = parse_amount(text)?;
    let (package, unit_start) = match parse_package(&text[amount_end..]) {
        Some((package, len)) => (Some(package), amount_end + len),
        None => (None, amount_end),
    };

    let unit_match = UNIT_RE.captures(&text[unit_start..]).and_then(|caps| {
        let unit = canonical_unit(&caps[1])?;
        Some((unit, unit_start + caps.get(1)?.end()))
    });
    let (unit, end) = match unit_match {
        Some((unit, unit_end)) if text[unit_end..].starts_with('.') => (unit, unit_end + 1),
        Some((unit, unit_end)) => (unit, unit_end),
        None => ("", unit_start),
    };

    let unit = match package {
        Some(package) if unit.is_empty() => package,
        Some(package) => format!("{package} {unit}"),
        None => unit.to_string(),
    };
    Some((Quantity { amount, unit }, end))
}

/// Parse a quantity string such as "¾ cup" or "1 1/2 tbsp". The whole
/// string must be consumed.
pub fn parse(text: &str) -> Option<Quantity> {
    let (quantity, end) = parse_prefix(text)?;
    text[end..].trim().is_empty().then_some(quantity)
}

/// Split an ingredient line into its raw quantity text and the remainder
pub fn split_quantity(text: &str) -> (String, &str) {
    match parse_prefix(text) {
        Some((_, end)) => (text[..end].trim().to_string(), text[end..].trim()),
        None => (String::new(), text.trim()),
    }
}

/// Render an amount; common fractions come back as their glyphs
pub fn format_amount(amount: f64) -> String {
    if let Some((glyph, _)) = UNICODE_FRACTIONS
        .iter()
        .find(|(_, value)| (amount - value).abs() < 0.005)
    {
        return glyph.to_string();
    }
    if (amount - amount.round()).abs() < 1e-9 {
        return format!("{}", amount.round() as i64);
    }
    let text = format!("{amount:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format(quantity: &Quantity) -> String {
    quantity.to_string()
}

/// Merge two quantity strings for the same ingredient
pub fn merge(a: &str, b: &str) -> MergedQuantity {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() {
        return MergedQuantity::Kept(b.to_string());
    }
    if b.is_empty() {
        return MergedQuantity::Kept(a.to_string());
    }

    match (parse(a), parse(b)) {
        (Some(qa), Some(qb)) if qa.unit == qb.unit => MergedQuantity::Summed(Quantity {
            amount: qa.amount + qb.amount,
            unit: qa.unit,
        }),
        _ => MergedQuantity::Concatenated(a.to_string(), b.to_string()),
    }
}

/// Key used to decide whether two grocery entries are the same ingredient:
/// leading amount, one leading unit word and a trailing "(N)" are dropped.
pub fn merge_key(name: &str) -> String {
    let lower = name.to_lowercase();
    let without_amount = LEADING_AMOUNT_RE.replace(&lower, "");
    let unit_end = UNIT_RE
        .captures(&without_amount)
        .filter(|caps| canonical_unit(&caps[1]).is_some())
        .and_then(|caps| caps.get(0).map(|m| m.end()));
    let without_unit = match unit_end {
        Some(end) => without_amount[end..].to_string(),
        None => without_amount.into_owned(),
    };
    COUNT_SUFFIX_RE
        .replace(&without_unit, "")
        .trim()
        .to_string()
}
