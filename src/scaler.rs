use crate::error::EngineError;
use crate::recipe::{Ingredient, Recipe};

pub const MIN_SCALE_FACTOR: f64 = 0.5;
pub const MAX_SCALE_FACTOR: f64 = 10.0;

/// Range check applied at the request boundary; `scale_recipe` itself only
/// requires a finite positive factor.
pub fn validate_scale_factor(factor: f64) -> Result<f64, EngineError> {
    if factor.is_finite() && (MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&factor) {
        Ok(factor)
    } else {
        Err(EngineError::Validation(format!(
            "Scale factor must be between {} and {}",
            MIN_SCALE_FACTOR, MAX_SCALE_FACTOR
        )))
    }
}

/// Returns a new recipe with every quantity multiplied by `factor` and servings
/// rounded to the nearest integer, never below 1.
pub fn scale_recipe(recipe: &Recipe, factor: f64) -> Result<Recipe, EngineError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(EngineError::Validation("Scale factor must be positive".to_string()));
    }

    let scaled_servings = (f64::from(recipe.servings) * factor).round().max(1.0);
    let ingredients = recipe
        .ingredients
        .iter()
        .map(|ingredient| Ingredient {
            quantity: ingredient.quantity * factor,
            ..ingredient.clone()
        })
        .collect();

    Ok(Recipe {
        // float-to-int casts saturate
        servings: scaled_servings as u32,
        ingredients,
        ..recipe.clone()
    })
}
