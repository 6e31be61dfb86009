//! Persistence collaborator for saved recipes and grocery-list state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::cache::now_millis;
use crate::error::ExtractError;
use crate::grocery::GroceryList;
use crate::model::Recipe;

/// A recipe saved by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: String,
    pub user_id: String,
    pub recipe: Recipe,
    pub saved_at_millis: u64,
}

/// Key-value storage scoped by user id. Errors are returned to the caller
/// unchanged; retry policy belongs to the implementation's owner.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Save a recipe and return its id. A recipe with the same title or the
    /// same source URL already saved by this user is updated in place.
    async fn save(&self, user_id: &str, recipe: &Recipe) -> Result<String, ExtractError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SavedRecipe>, ExtractError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<SavedRecipe>, ExtractError>;

    /// Returns whether a recipe was deleted
    async fn delete_by_id(&self, id: &str) -> Result<bool, ExtractError>;

    async fn save_grocery_list(&self, user_id: &str, list: &GroceryList)
        -> Result<(), ExtractError>;

    async fn load_grocery_list(&self, user_id: &str) -> Result<Option<GroceryList>, ExtractError>;
}

/// In-memory store. Data lives as long as the value does.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    recipes: RwLock<Vec<SavedRecipe>>,
    grocery_lists: RwLock<HashMap<String, GroceryList>>,
}

fn poisoned<T>(_: T) -> ExtractError {
    ExtractError::Persistence("store lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn recipes(&self) -> Result<RwLockReadGuard<'_, Vec<SavedRecipe>>, ExtractError> {
        self.recipes.read().map_err(poisoned)
    }

    fn recipes_mut(&self) -> Result<RwLockWriteGuard<'_, Vec<SavedRecipe>>, ExtractError> {
        self.recipes.write().map_err(poisoned)
    }

    /// Number of saved recipes across all users
    pub fn recipe_count(&self) -> usize {
        self.recipes.read().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn save(&self, user_id: &str, recipe: &Recipe) -> Result<String, ExtractError> {
        let title = recipe.title();
        let mut recipes = self.recipes_mut()?;

        let existing = recipes.iter_mut().find(|saved| {
            saved.user_id == user_id
                && (saved.recipe.url == recipe.url || saved.recipe.title() == title)
        });
        if let Some(saved) = existing {
            saved.recipe = recipe.clone();
            saved.saved_at_millis = now_millis();
            return Ok(saved.id.clone());
        }

        let id = Uuid::new_v4().to_string();
        recipes.push(SavedRecipe {
            id: id.clone(),
            user_id: user_id.to_string(),
            recipe: recipe.clone(),
            saved_at_millis: now_millis(),
        });
        Ok(id)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SavedRecipe>, ExtractError> {
        Ok(self
            .recipes()?
            .iter()
            .filter(|saved| saved.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<SavedRecipe>, ExtractError> {
        Ok(self.recipes()?.iter().find(|saved| saved.id == id).cloned())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, ExtractError> {
        let mut recipes = self.recipes_mut()?;
        let before = recipes.len();
        recipes.retain(|saved| saved.id != id);
        Ok(recipes.len() != before)
    }

    async fn save_grocery_list(
        &self,
        user_id: &str,
        list: &GroceryList,
    ) -> Result<(), ExtractError> {
        self.grocery_lists
            .write()
            .map_err(poisoned)?
            .insert(user_id.to_string(), list.clone());
        Ok(())
    }

    async fn load_grocery_list(&self, user_id: &str) -> Result<Option<GroceryList>, ExtractError> {
        Ok(self
            .grocery_lists
            .read()
            .map_err(poisoned)?
            .get(user_id)
            .cloned())
    }
}
