use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;
use uuid::Uuid;

use super::normalize::standardize;
use super::quantity::{merge, merge_key, split_quantity};
use crate::classifier::{classify, Category};

/// `source` tag carried by manually added items
pub const CUSTOM_ITEM_SOURCE: &str = "Custom Item";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub section: String,
    pub is_checked: bool,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    /// In the merged view: ids of every stored item folded into this entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_ids: Vec<String>,
}

impl GroceryItem {
    fn new(name: String, quantity: String, source: &str, recipe_id: Option<&str>) -> Self {
        let section = classify(&name).as_str().to_string();
        GroceryItem {
            id: Uuid::new_v4().to_string(),
            name,
            quantity,
            section,
            is_checked: false,
            source: source.to_string(),
            recipe_id: recipe_id.map(str::to_string),
            merged_ids: Vec::new(),
        }
    }

    /// Build an item from a raw ingredient line such as "1 tbsp butter"
    fn from_ingredient(text: &str, source: &str, recipe_id: Option<&str>) -> Option<Self> {
        let (quantity, rest) = split_quantity(text);
        let name = standardize(rest);
        if name.is_empty() {
            return None;
        }
        Some(GroceryItem::new(name, quantity, source, recipe_id))
    }
}

/// Ingredients contributed by one recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeGrouping {
    pub id: String,
    pub name: String,
    pub items: Vec<GroceryItem>,
}

/// Persistable grocery list state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryList {
    #[serde(default)]
    pub recipes: Vec<RecipeGrouping>,
    #[serde(default)]
    pub custom_items: Vec<GroceryItem>,
}

impl GroceryList {
    fn items(&self) -> impl Iterator<Item = &GroceryItem> {
        self.recipes
            .iter()
            .flat_map(|recipe| recipe.items.iter())
            .chain(self.custom_items.iter())
    }

    fn collect_garbage(&mut self) {
        self.recipes.retain(|recipe| !recipe.items.is_empty());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Merge matching ingredients across recipes and custom items
    All,
    /// Every recipe's items as-is, no cross-recipe merging
    ByRecipe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrocerySection {
    pub name: String,
    pub items: Vec<GroceryItem>,
}

/// Section-grouped list, sections in aisle order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroceryView {
    pub sections: Vec<GrocerySection>,
}

impl GroceryView {
    pub fn section(&self, name: &str) -> Option<&GrocerySection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn from_items(items: Vec<GroceryItem>) -> Self {
        let mut order: Vec<String> = Category::ordered().map(|c| c.as_str().to_string()).collect();
        for item in &items {
            if !order.contains(&item.section) {
                order.push(item.section.clone());
            }
        }

        let mut by_section: HashMap<String, Vec<GroceryItem>> = HashMap::new();
        for item in items {
            by_section.entry(item.section.clone()).or_default().push(item);
        }

        let sections = order
            .into_iter()
            .filter_map(|name| {
                by_section
                    .remove(&name)
                    .map(|items| GrocerySection { name, items })
            })
            .collect();

        GroceryView { sections }
    }
}

/// Grocery list with change notification. Every mutation that alters the
/// list bumps a revision observers can watch.
#[derive(Debug)]
pub struct GroceryListAggregator {
    list: GroceryList,
    changes: watch::Sender<u64>,
}

impl Default for GroceryListAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl GroceryListAggregator {
    pub fn new() -> Self {
        Self::from_list(GroceryList::default())
    }

    pub fn from_list(list: GroceryList) -> Self {
        let (changes, _) = watch::channel(0);
        GroceryListAggregator { list, changes }
    }

    pub fn list(&self) -> &GroceryList {
        &self.list
    }

    pub fn into_list(self) -> GroceryList {
        self.list
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    pub fn item_count(&self) -> usize {
        self.list.items().count()
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    /// Add a recipe's ingredients. A recipe whose name is already present is
    /// ignored, so re-extracting the same recipe never duplicates it.
    pub fn add_recipe<S: AsRef<str>>(
        &mut self,
        recipe_id: &str,
        recipe_name: &str,
        ingredients: &[S],
    ) -> bool {
        if self.list.recipes.iter().any(|r| r.name == recipe_name) {
            debug!("Recipe '{}' already on the grocery list", recipe_name);
            return false;
        }

        let items: Vec<GroceryItem> = ingredients
            .iter()
            .filter_map(|text| {
                GroceryItem::from_ingredient(text.as_ref(), recipe_name, Some(recipe_id))
            })
            .collect();
        if items.is_empty() {
            return false;
        }

        debug!(
            "Adding {} items from recipe '{}' to grocery list",
            items.len(),
            recipe_name
        );
        self.list.recipes.push(RecipeGrouping {
            id: recipe_id.to_string(),
            name: recipe_name.to_string(),
            items,
        });
        self.notify();
        true
    }

    /// Add a manually entered item and return its id
    pub fn add_custom_item(&mut self, name: &str, quantity: &str) -> Option<String> {
        let name = standardize(name);
        if name.is_empty() {
            return None;
        }
        let item = GroceryItem::new(name, quantity.trim().to_string(), CUSTOM_ITEM_SOURCE, None);
        let id = item.id.clone();
        self.list.custom_items.push(item);
        self.notify();
        Some(id)
    }

    pub fn toggle_checked(&mut self, item_id: &str) -> bool {
        let item = self
            .list
            .recipes
            .iter_mut()
            .flat_map(|recipe| recipe.items.iter_mut())
            .chain(self.list.custom_items.iter_mut())
            .find(|item| item.id == item_id);

        match item {
            Some(item) => {
                item.is_checked = !item.is_checked;
                self.notify();
                true
            }
            None => false,
        }
    }

    /// Check or uncheck an entry taken from either view. A merged entry is
    /// checked only when all of its contributors are, so toggling it sets
    /// every contributor to the same new state.
    pub fn toggle_view_item(&mut self, item: &GroceryItem) -> bool {
        if item.merged_ids.is_empty() {
            return self.toggle_checked(&item.id);
        }

        let checked = !item.is_checked;
        let mut changed = false;
        for stored in self
            .list
            .recipes
            .iter_mut()
            .flat_map(|recipe| recipe.items.iter_mut())
            .chain(self.list.custom_items.iter_mut())
            .filter(|stored| item.merged_ids.contains(&stored.id))
        {
            if stored.is_checked != checked {
                stored.is_checked = checked;
                changed = true;
            }
        }
        if changed {
            self.notify();
        }
        changed
    }

    /// Remove one item; a recipe left without items is dropped entirely
    pub fn remove(&mut self, item_id: &str) -> bool {
        let before = self.item_count();
        for recipe in &mut self.list.recipes {
            recipe.items.retain(|item| item.id != item_id);
        }
        self.list.custom_items.retain(|item| item.id != item_id);
        self.list.collect_garbage();

        let removed = self.item_count() < before;
        if removed {
            self.notify();
        }
        removed
    }

    /// Remove every checked item and return how many went
    pub fn remove_checked(&mut self) -> usize {
        let before = self.item_count();
        for recipe in &mut self.list.recipes {
            recipe.items.retain(|item| !item.is_checked);
        }
        self.list.custom_items.retain(|item| !item.is_checked);
        self.list.collect_garbage();

        let removed = before - self.item_count();
        if removed > 0 {
            self.notify();
        }
        removed
    }

    pub fn clear_all(&mut self) -> bool {
        if self.list.recipes.is_empty() && self.list.custom_items.is_empty() {
            return false;
        }
        self.list = GroceryList::default();
        self.notify();
        true
    }

    pub fn view(&self, mode: ViewMode) -> GroceryView {
        match mode {
            ViewMode::ByRecipe => GroceryView::from_items(self.list.items().cloned().collect()),
            ViewMode::All => {
                let mut merged: Vec<GroceryItem> = Vec::new();
                let mut index: HashMap<String, usize> = HashMap::new();

                for item in self.list.items() {
                    let key = merge_key(&item.name);
                    match index.get(&key) {
                        Some(&i) => {
                            let bucket = &mut merged[i];
                            bucket.quantity = merge(&bucket.quantity, &item.quantity).to_string();
                            if bucket.merged_ids.is_empty() {
                                bucket.merged_ids.push(bucket.id.clone());
                            }
                            bucket.merged_ids.push(item.id.clone());
                            bucket.is_checked &= item.is_checked;
                        }
                        None => {
                            index.insert(key, merged.len());
                            merged.push(item.clone());
                        }
                    }
                }

                GroceryView::from_items(merged)
            }
        }
    }
}

/// One recipe's ingredient lines, as handed to `aggregate_grocery_list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredients {
    pub recipe_name: String,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomItem {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

/// Build a merged, section-grouped list from recipes plus custom items
pub fn aggregate_grocery_list(recipes: &[RecipeIngredients], custom_items: &[CustomItem]) -> GroceryView {
    let mut aggregator = GroceryListAggregator::new();
    for recipe in recipes {
        let recipe_id = Uuid::new_v4().to_string();
        aggregator.add_recipe(&recipe_id, &recipe.recipe_name, &recipe.ingredients);
    }
    for item in custom_items {
        aggregator.add_custom_item(&item.name, &item.quantity);
    }
    aggregator.view(ViewMode::All)
}
