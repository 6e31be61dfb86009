//! Keyword classification for scraped text and grocery items.
//!
//! Everything here is a pure function over lowercase substring containment;
//! the tables are ordered and the first match wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Grocery-aisle category for an ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Produce,
    MeatSeafood,
    DairyEggs,
    Bakery,
    Frozen,
    Pantry,
    SpicesSeasonings,
    Beverages,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::MeatSeafood => "Meat & Seafood",
            Category::DairyEggs => "Dairy & Eggs",
            Category::Bakery => "Bakery",
            Category::Frozen => "Frozen",
            Category::Pantry => "Pantry",
            Category::SpicesSeasonings => "Spices & Seasonings",
            Category::Beverages => "Beverages",
            Category::Other => "Other",
        }
    }

    /// Display order of grocery sections, `Other` last
    pub fn ordered() -> impl Iterator<Item = Category> {
        CATEGORY_TABLE
            .iter()
            .map(|(category, _)| *category)
            .chain(std::iter::once(Category::Other))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered (category, keywords) table. No keyword may contain a keyword of
/// an earlier category, otherwise it would be shadowed.
pub const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Produce,
        &[
            "apple", "avocado", "banana", "basil", "bell pepper", "berries", "berry", "broccoli",
            "cabbage", "carrot", "cauliflower", "celery", "cilantro", "cucumber", "eggplant",
            "garlic", "ginger", "grape", "green onion", "jalapeno", "kale", "lemon", "lettuce",
            "lime", "mango", "mint", "mushroom", "onion", "orange", "parsley", "peach", "potato",
            "scallion", "shallot", "spinach", "squash", "tomato", "zucchini", "dill",
        ],
    ),
    (
        Category::MeatSeafood,
        &[
            "beef", "chicken", "pork", "bacon", "sausage", "turkey", "lamb", "ham", "steak",
            "veal", "duck", "chorizo", "prosciutto", "salmon", "shrimp", "tuna", "cod", "fish",
            "prawn", "crab", "lobster", "scallop", "anchov", "mussel",
        ],
    ),
    (
        Category::DairyEggs,
        &[
            "milk", "butter", "cheese", "cream", "yogurt", "egg", "parmesan", "mozzarella",
            "cheddar", "ricotta", "feta", "ghee", "half-and-half",
        ],
    ),
    (
        Category::Bakery,
        &[
            "bread", "buns", "bagel", "tortilla", "pita", "baguette", "croissant", "muffin",
            "brioche",
        ],
    ),
    (
        Category::Frozen,
        &["frozen", "sorbet", "puff pastry", "phyllo"],
    ),
    (
        Category::Pantry,
        &[
            "flour", "sugar", "rice", "pasta", "spaghetti", "noodle", "oil", "vinegar", "broth",
            "stock", "beans", "lentil", "chickpea", "oats", "honey", "syrup", "soy sauce",
            "baking soda", "baking powder", "yeast", "cornstarch", "chocolate", "vanilla",
            "almond", "peanut", "walnut", "pecan", "quinoa", "couscous", "mustard", "ketchup",
            "mayonnaise", "salsa", "tahini", "cocoa", "cornmeal", "canned",
        ],
    ),
    (
        Category::SpicesSeasonings,
        &[
            "salt", "pepper", "cinnamon", "paprika", "cumin", "oregano", "thyme", "rosemary",
            "nutmeg", "chili powder", "bay leaf", "bay leaves", "sage", "turmeric", "cayenne",
            "seasoning", "coriander", "clove", "allspice", "cardamom",
        ],
    ),
    (
        Category::Beverages,
        &[
            "wine", "beer", "coffee", "juice", "soda", "sparkling water", "kombucha", "green tea",
            "black tea",
        ],
    ),
];

/// Site chrome that shows up in scraped lists and paragraphs
pub const NAVIGATION_TERMS: &[&str] = &[
    "home page",
    "about us",
    "contact us",
    "privacy policy",
    "terms of use",
    "terms of service",
    "cookie policy",
    "cookie settings",
    "all rights reserved",
    "copyright",
    "subscribe",
    "newsletter",
    "log in",
    "login",
    "sign up",
    "sign in",
    "my account",
    "facebook",
    "twitter",
    "instagram",
    "pinterest",
    "youtube",
    "tiktok",
    "share this",
    "share on",
    "follow us",
    "read more",
    "jump to recipe",
    "print recipe",
    "skip to content",
    "advertisement",
    "leave a comment",
    "menu",
];

/// Food words that are not grocery keywords but still mark an ingredient line
const EXTRA_FOOD_TERMS: &[&str] = &[
    "sauce", "meat", "herb", "spice", "nut", "seed", "fruit", "vegetable", "water", "dough",
    "pastry", "tofu", "corn", "pea", "bean",
];

const COOKING_VERBS: &[&str] = &[
    "preheat", "heat", "mix", "stir", "add", "combine", "whisk", "bake", "cook", "boil",
    "simmer", "pour", "place", "remove", "serve", "season", "chop", "slice", "dice", "mince",
    "fold", "beat", "blend", "cover", "drain", "transfer", "spread", "sprinkle", "bring",
    "reduce", "let", "allow", "melt", "toss", "roast", "grill", "fry", "saute", "sauté",
    "knead", "roll", "cut", "arrange", "garnish", "top", "set", "line", "grease", "prepare",
    "marinate", "refrigerate", "chill", "cool", "repeat", "divide", "shape", "peel", "wash",
    "rinse", "in a", "using",
];

const COOKING_CONTEXT_TERMS: &[&str] = &[
    "minute", "hour", "oven", "pan", "pot", "skillet", "bowl", "heat", "degrees", "°",
    "until", "medium", "tender", "golden", "boil", "simmer", "stir",
];

static MEASUREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[\d¼½¾⅓⅔]+\s*(cups?|tbsp|tsp|oz|g|kg|ml|l|lbs?|pounds?|teaspoons?|tablespoons?|grams?|ounces?)\b",
    )
    .unwrap()
});

/// Whole-word match on `EXTRA_FOOD_TERMS`, plural allowed, so "pea" does not
/// fire inside "repeat"
static EXTRA_FOOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{})(?:s|es)?\b",
        EXTRA_FOOD_TERMS.join("|")
    ))
    .unwrap()
});

static NUMBERED_STEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());

/// First category whose keyword set intersects the lowercased text
pub fn classify(text: &str) -> Category {
    let lower = text.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// True when the text carries a quantity with a recognised unit
pub fn has_measurement(text: &str) -> bool {
    MEASUREMENT_RE.is_match(text)
}

/// Navigation chrome, unless a measurement rescues it as a real ingredient
pub fn is_navigation_noise(text: &str) -> bool {
    let lower = text.to_lowercase();
    NAVIGATION_TERMS.iter().any(|term| lower.contains(term)) && !has_measurement(text)
}

fn contains_food_term(lower: &str) -> bool {
    CATEGORY_TABLE
        .iter()
        .flat_map(|(_, keywords)| keywords.iter())
        .any(|term| lower.contains(term))
        || EXTRA_FOOD_RE.is_match(lower)
}

pub fn looks_like_ingredient(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.chars().count() >= 200 {
        return false;
    }
    has_measurement(text) || contains_food_term(&text.to_lowercase())
}

pub fn looks_like_instruction(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if len <= 20 || len >= 500 {
        return false;
    }

    let lower = text.to_lowercase();
    let starts_with_verb = COOKING_VERBS.iter().any(|verb| {
        lower.starts_with(verb)
            && lower[verb.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    });

    starts_with_verb
        || NUMBERED_STEP_RE.is_match(text)
        || COOKING_CONTEXT_TERMS.iter().any(|term| lower.contains(term))
}
