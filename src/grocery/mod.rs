//! Grocery list: ingredient clean-up, quantity arithmetic and aggregation.

mod aggregator;
pub mod normalize;
pub mod quantity;

pub use aggregator::{
    aggregate_grocery_list, CustomItem, GroceryItem, GroceryList, GroceryListAggregator,
    GrocerySection, GroceryView, RecipeGrouping, RecipeIngredients, ViewMode,
    CUSTOM_ITEM_SOURCE,
};
pub use normalize::standardize;
pub use quantity::{merge, merge_key, MergedQuantity, Quantity};
