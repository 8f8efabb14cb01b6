use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api_connection::connection::ApiConnectionError;
use crate::catalog::NutrientCatalog;
use crate::error::EngineError;
use crate::recipe::{Recipe, UserProfile};
use crate::targets::DiseaseTargets;

/// An external text-generation service: one prompt in, free text out.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ApiConnectionError>;
}

/// Advisory ingredient replacement. Never applied to the stored recipe.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Substitution {
    pub original: String,
    pub substitute: String,
    #[serde(default)]
    pub reason: String,
}

/// Shape the service is asked to reply with. Both fields may be absent.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionReply {
    #[serde(default)]
    pub substitutions: Option<Vec<Substitution>>,
    #[serde(default)]
    pub modified_recipe: Option<Recipe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionOutcome {
    pub substitutions: Vec<Substitution>,
    pub recipe: Recipe,
}

impl SubstitutionOutcome {
    fn unchanged(recipe: &Recipe) -> Self {
        Self {
            substitutions: Vec::new(),
            recipe: recipe.clone(),
        }
    }
}

pub fn build_substitution_prompt(
    recipe: &Recipe,
    profile: &UserProfile,
    catalog: &NutrientCatalog,
    targets: &DiseaseTargets,
) -> String {
    let ingredient_lines = recipe
        .ingredients
        .iter()
        .map(|ing| format!("- {} {} {}", ing.quantity, ing.unit, ing.name))
        .collect::<Vec<String>>()
        .join("\n");
    let targets_json = serde_json::to_string(&targets.targets).unwrap_or_else(|_| "{}".to_string());
    let allergies = profile.allergies_text();
    let available = catalog.ingredient_names().join(", ");

    format!(
        "You are a nutrition expert. Given this recipe and user health profile, suggest ingredient substitutions.

Recipe:
Title: {title}
Servings: {servings}
Ingredients:
{ingredient_lines}

User Profile:
Disease: {disease}
Allergies: {allergies}

Disease Targets: {targets_json}

Available ingredients in our database: {available}

Please suggest substitutions that:
1. Are suitable for {disease}
2. Avoid allergens: {allergies}
3. Use only ingredients from our database
4. Maintain similar culinary purpose

Respond with a JSON object containing:
{{
  \"substitutions\": [
    {{\"original\": \"ingredient_name\", \"substitute\": \"new_ingredient_name\", \"reason\": \"explanation\"}}
  ],
  \"modifiedRecipe\": {{
    \"title\": \"new title\",
    \"servings\": number,
    \"ingredients\": [{{\"name\": \"...\", \"quantity\": number, \"unit\": \"...\"}}],
    \"steps\": [\"...\"]
  }}
}}",
        title = recipe.title,
        servings = recipe.servings,
        ingredient_lines = ingredient_lines,
        disease = profile.disease,
        allergies = allergies,
        targets_json = targets_json,
        available = available,
    )
}

/// Returns the first balanced `{ ... }` block in `text`, ignoring braces inside
/// JSON string literals. `None` if there is no opening brace or it is never closed.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Tolerant decode of the service reply. `None` when there is no JSON object at
/// all; otherwise each field decodes on its own, and an unusable field reads as
/// absent. Substitution entries that do not decode are skipped individually.
pub fn parse_substitution_reply(text: &str) -> Option<SubstitutionReply> {
    let Some(block) = extract_json_block(text) else {
        warn!("reasoning reply contains no balanced JSON block");
        return None;
    };
    let mut object = match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            warn!("reasoning reply is not a JSON object");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "failed to decode reasoning reply");
            return None;
        }
    };

    Some(SubstitutionReply {
        substitutions: object.remove("substitutions").and_then(decode_substitutions),
        modified_recipe: object.remove("modifiedRecipe").and_then(decode_modified_recipe),
    })
}

fn decode_substitutions(value: Value) -> Option<Vec<Substitution>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return None,
        _ => {
            warn!("substitutions field is not a list, ignoring it");
            return None;
        }
    };
    let substitutions = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Substitution>(item) {
            Ok(substitution) => Some(substitution),
            Err(e) => {
                warn!(error = %e, "skipping malformed substitution");
                None
            }
        })
        .collect();
    Some(substitutions)
}

fn decode_modified_recipe(mut value: Value) -> Option<Recipe> {
    if value.is_null() {
        return None;
    }
    // Whole-number floats such as 4.0 count as integer servings.
    if let Some(servings) = value.get_mut("servings") {
        if let Some(whole) = servings.as_f64().filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64) {
            *servings = Value::from(whole as u32);
        }
    }
    match serde_json::from_value::<Recipe>(value) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            warn!(error = %e, "modified recipe does not decode, keeping the original");
            None
        }
    }
}

/// Applies the fallbacks: no reply means no change, a missing or unusable
/// modified recipe means the original recipe.
pub fn resolve_reply(reply: Option<SubstitutionReply>, original: &Recipe) -> SubstitutionOutcome {
    let Some(reply) = reply else {
        return SubstitutionOutcome::unchanged(original);
    };

    let recipe = match reply.modified_recipe {
        Some(modified) if modified.is_computable() => modified,
        Some(_) => {
            warn!("modified recipe has no servings or invalid quantities, keeping the original");
            original.clone()
        }
        None => original.clone(),
    };

    SubstitutionOutcome {
        substitutions: reply.substitutions.unwrap_or_default(),
        recipe,
    }
}

/// Asks the reasoning service for substitutions and returns them with the recipe
/// to report on. Service failures are errors; unusable replies are not.
pub async fn suggest_substitutions(
    recipe: &Recipe,
    profile: &UserProfile,
    catalog: &NutrientCatalog,
    targets: &DiseaseTargets,
    service: &dyn ReasoningService,
) -> Result<SubstitutionOutcome, EngineError> {
    if catalog.is_empty() {
        warn!("ingredient catalog is empty, no substitute can be grounded in it");
    }
    let prompt = build_substitution_prompt(recipe, profile, catalog, targets);
    debug!(prompt = %prompt, "substitution prompt");

    let reply_text = service.complete(&prompt).await?;
    debug!(reply = %reply_text, "raw reasoning reply");

    let outcome = resolve_reply(parse_substitution_reply(&reply_text), recipe);

    for substitution in &outcome.substitutions {
        if catalog.lookup(&substitution.substitute).is_none() {
            warn!(substitute = %substitution.substitute, "suggested substitute is not in the catalog");
        }
    }
    info!(count = outcome.substitutions.len(), "substitutions received");

    Ok(outcome)
}
