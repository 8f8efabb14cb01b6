use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::debug;

use crate::catalog::NutrientCatalog;
use crate::error::EngineError;
use crate::nutrients::{round_to_tenth, NutrientVector};
use crate::recipe::Recipe;

/// Whole-recipe totals and the per-serving share, both rounded to one decimal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct NutritionReport {
    pub total: NutrientVector,
    #[serde(rename = "perServing")]
    pub per_serving: NutrientVector,
}

/// Sums catalog nutrients over the recipe's ingredients.
///
/// Each ingredient contributes `entry * quantity / 100`. Ingredients with no exact
/// catalog match contribute nothing, and repeated ingredients count every time.
/// Totals are rounded to one decimal first; per-serving values are the rounded
/// totals divided by `servings`, rounded again.
///
/// A recipe with zero servings is rejected rather than divided by.
pub fn calculate_nutrition(recipe: &Recipe, catalog: &NutrientCatalog) -> Result<NutritionReport, EngineError> {
    let Some(servings) = NonZeroU32::new(recipe.servings) else {
        return Err(EngineError::Validation("Servings must be greater than 0".to_string()));
    };

    let mut total = NutrientVector::default();
    for ingredient in &recipe.ingredients {
        match catalog.lookup(&ingredient.name) {
            Some(entry) => total.add_scaled(&entry.per_100, ingredient.quantity / 100.0),
            None => debug!(ingredient = %ingredient.name, "no catalog entry, contributes nothing"),
        }
    }

    let total = total.map(round_to_tenth);
    let servings = f64::from(servings.get());
    let per_serving = total.map(|value| round_to_tenth(value / servings));

    Ok(NutritionReport { total, per_serving })
}
