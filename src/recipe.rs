use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

pub const MIN_STEP_CHARS: usize = 10;
pub const MAX_STEP_CHARS: usize = 500;

/// A recipe line. `quantity` is on the same 100-unit basis as the catalog entry for `name`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub servings: u32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Recipe {
    pub fn new(title: &str, servings: u32, ingredients: Vec<Ingredient>, steps: Vec<String>) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            servings,
            ingredients,
            steps,
            created_at: None,
        }
    }

    /// Checks the authoring rules a recipe must satisfy before any computation or storage.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.title.trim().is_empty() {
            return Err(EngineError::Validation("Title is required".to_string()));
        }
        if self.servings == 0 {
            return Err(EngineError::Validation(
                "Servings must be greater than 0".to_string(),
            ));
        }
        for ingredient in &self.ingredients {
            let quantity_ok = ingredient.quantity.is_finite() && ingredient.quantity > 0.0;
            if ingredient.name.trim().is_empty() || ingredient.unit.trim().is_empty() || !quantity_ok {
                return Err(EngineError::Validation(
                    "Each ingredient must have name, quantity, and unit".to_string(),
                ));
            }
        }
        for step in &self.steps {
            let len = step.chars().count();
            if !(MIN_STEP_CHARS..=MAX_STEP_CHARS).contains(&len) {
                return Err(EngineError::Validation(format!(
                    "Each step must be between {} and {} characters",
                    MIN_STEP_CHARS, MAX_STEP_CHARS
                )));
            }
        }
        Ok(())
    }

    /// Weaker than `validate`: only what the nutrition computation itself needs.
    pub fn is_computable(&self) -> bool {
        self.servings >= 1
            && self
                .ingredients
                .iter()
                .all(|i| i.quantity.is_finite() && i.quantity >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disease {
    Type1Diabetes,
    Celiac,
    LactoseIntolerance,
}

impl Disease {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Disease::Type1Diabetes => "type1_diabetes",
            Disease::Celiac => "celiac",
            Disease::LactoseIntolerance => "lactose_intolerance",
        }
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "type1_diabetes" => Ok(Disease::Type1Diabetes),
            "celiac" => Ok(Disease::Celiac),
            "lactose_intolerance" => Ok(Disease::LactoseIntolerance),
            other => Err(format!(
                "unknown disease '{}' (expected type1_diabetes, celiac or lactose_intolerance)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "other" => Ok(Sex::Other),
            other => Err(format!("unknown sex '{}' (expected male, female or other)", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub disease: Disease,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl UserProfile {
    pub fn new(disease: Disease) -> Self {
        Self {
            disease,
            age: None,
            sex: None,
            allergies: Vec::new(),
        }
    }

    /// Comma-separated allergy list, or "none".
    pub fn allergies_text(&self) -> String {
        let listed: Vec<&str> = self
            .allergies
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if listed.is_empty() {
            "none".to_string()
        } else {
            listed.join(", ")
        }
    }
}
