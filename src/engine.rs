use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::catalog::NutrientCatalog;
use crate::error::EngineError;
use crate::recipe::{Recipe, UserProfile};
use crate::recipe_aggregator::{calculate_nutrition, NutritionReport};
use crate::scaler::{scale_recipe, validate_scale_factor};
use crate::store::RecordStore;
use crate::substitution::{suggest_substitutions, ReasoningService, Substitution};
use crate::targets::{calculate_percentages, DiseaseTargets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    MapNutrients,
    Scale,
    Substitute,
}

/// One caller request. A stored recipe (`recipe_id`) takes precedence over an inline one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_payload: Option<Recipe>,
    pub operation: Operation,
    pub user_profile: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
}

impl ModifyRequest {
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::Validation(format!("Invalid request: {}", e)))
    }
}

/// The single output shape of every operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModificationResult {
    pub recipe: Recipe,
    pub nutrition: NutritionReport,
    pub targets: BTreeMap<String, Value>,
    pub percentages: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitutions: Option<Vec<Substitution>>,
}

/// Runs `recipe` through the aggregator and the percentage calculator.
pub fn build_result(
    recipe: Recipe,
    catalog: &NutrientCatalog,
    targets: &DiseaseTargets,
    substitutions: Option<Vec<Substitution>>,
) -> Result<ModificationResult, EngineError> {
    let nutrition = calculate_nutrition(&recipe, catalog)?;
    let percentages = calculate_percentages(&nutrition, targets);
    Ok(ModificationResult {
        recipe,
        nutrition,
        targets: targets.targets.clone(),
        percentages,
        substitutions,
    })
}

pub struct RecipeEngine<S, R> {
    store: S,
    reasoning: R,
}

impl<S: RecordStore, R: ReasoningService> RecipeEngine<S, R> {
    pub fn new(store: S, reasoning: R) -> Self {
        Self { store, reasoning }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn resolve_recipe(&self, request: &ModifyRequest) -> Result<Recipe, EngineError> {
        let recipe = if let Some(id) = &request.recipe_id {
            self.store
                .fetch_recipe(id)
                .await?
                .ok_or_else(|| EngineError::NotFound("Recipe not found".to_string()))?
        } else if let Some(payload) = &request.recipe_payload {
            payload.clone()
        } else {
            return Err(EngineError::Validation(
                "Either recipeId or recipePayload is required".to_string(),
            ));
        };
        recipe.validate()?;
        Ok(recipe)
    }

    pub async fn modify(&self, request: &ModifyRequest) -> Result<ModificationResult, EngineError> {
        let scale_factor = match request.operation {
            Operation::Scale => Some(validate_scale_factor(request.scale_factor.unwrap_or(1.0))?),
            _ => None,
        };
        let recipe = self.resolve_recipe(request).await?;

        let catalog = self.store.fetch_catalog().await?;
        let disease = request.user_profile.disease.as_str();
        let targets = self
            .store
            .fetch_disease_targets(disease)
            .await?
            .unwrap_or_else(|| DiseaseTargets {
                disease: disease.to_string(),
                targets: BTreeMap::new(),
            });

        info!(operation = ?request.operation, recipe = %recipe.title, disease, "running recipe operation");

        match (request.operation, scale_factor) {
            (Operation::Scale, Some(factor)) => {
                build_result(scale_recipe(&recipe, factor)?, &catalog, &targets, None)
            }
            (Operation::Substitute, _) => {
                let outcome = suggest_substitutions(
                    &recipe,
                    &request.user_profile,
                    &catalog,
                    &targets,
                    &self.reasoning,
                )
                .await?;
                build_result(outcome.recipe, &catalog, &targets, Some(outcome.substitutions))
            }
            _ => build_result(recipe, &catalog, &targets, None),
        }
    }
}
