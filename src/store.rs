use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{load_nutrient_catalog, NutrientCatalog};
use crate::error::EngineError;
use crate::recipe::Recipe;
use crate::targets::DiseaseTargets;

pub const CATALOG_FILE: &str = "catalog.csv";
pub const DISEASE_TARGETS_FILE: &str = "disease_targets.json";
pub const RECIPES_FILE: &str = "recipes.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Read access to recipes and reference data, plus recipe authoring.
/// Lookups return `Ok(None)` when the record does not exist.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError>;
    async fn fetch_catalog(&self) -> Result<NutrientCatalog, StoreError>;
    async fn fetch_disease_targets(&self, disease: &str) -> Result<Option<DiseaseTargets>, StoreError>;
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;
    /// Validates, assigns `id` and `created_at`, stores, and returns the stored record.
    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, EngineError>;
}

/// Store backed by a data directory: `catalog.csv`, `disease_targets.json` and
/// `recipes.json`. Reference data is loaded once; recipes are written back on insert.
pub struct LocalRecordStore {
    catalog: NutrientCatalog,
    disease_targets: Vec<DiseaseTargets>,
    recipes: RwLock<Vec<Recipe>>,
    recipes_path: Option<PathBuf>,
}

impl LocalRecordStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let catalog = load_nutrient_catalog(&data_dir.join(CATALOG_FILE))?;

        let targets_path = data_dir.join(DISEASE_TARGETS_FILE);
        let targets_text = std::fs::read_to_string(&targets_path)
            .with_context(|| format!("Failed to read disease targets from {:?}", targets_path))?;
        let disease_targets: Vec<DiseaseTargets> = serde_json::from_str(&targets_text)
            .with_context(|| format!("Failed to parse disease targets in {:?}", targets_path))?;

        let recipes_path = data_dir.join(RECIPES_FILE);
        let recipes: Vec<Recipe> = if recipes_path.exists() {
            let text = std::fs::read_to_string(&recipes_path)
                .with_context(|| format!("Failed to read recipes from {:?}", recipes_path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse recipes in {:?}", recipes_path))?
        } else {
            Vec::new()
        };

        info!(
            catalog_entries = catalog.len(),
            diseases = disease_targets.len(),
            recipes = recipes.len(),
            "record store opened from {:?}",
            data_dir
        );

        Ok(Self {
            catalog,
            disease_targets,
            recipes: RwLock::new(recipes),
            recipes_path: Some(recipes_path),
        })
    }

    /// Store that never touches the filesystem.
    pub fn in_memory(
        catalog: NutrientCatalog,
        disease_targets: Vec<DiseaseTargets>,
        recipes: Vec<Recipe>,
    ) -> Self {
        Self {
            catalog,
            disease_targets,
            recipes: RwLock::new(recipes),
            recipes_path: None,
        }
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn fetch_recipe(&self, id: &str) -> Result<Option<Recipe>, StoreError> {
        let recipes = self.recipes.read().map_err(|_| StoreError::Poisoned)?;
        Ok(recipes.iter().find(|r| r.id.as_deref() == Some(id)).cloned())
    }

    async fn fetch_catalog(&self) -> Result<NutrientCatalog, StoreError> {
        Ok(self.catalog.clone())
    }

    async fn fetch_disease_targets(&self, disease: &str) -> Result<Option<DiseaseTargets>, StoreError> {
        Ok(self
            .disease_targets
            .iter()
            .find(|t| t.disease == disease)
            .cloned())
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = self.recipes.read().map_err(|_| StoreError::Poisoned)?.clone();
        // Newest first; undated records sort last.
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    async fn insert_recipe(&self, recipe: Recipe) -> Result<Recipe, EngineError> {
        recipe.validate()?;

        let stored = Recipe {
            id: Some(Uuid::new_v4().to_string()),
            created_at: Some(Utc::now()),
            ..recipe
        };

        let snapshot = {
            let mut recipes = self.recipes.write().map_err(|_| StoreError::Poisoned)?;
            recipes.push(stored.clone());
            serde_json::to_string_pretty(&*recipes).map_err(StoreError::from)?
        };

        if let Some(path) = &self.recipes_path {
            tokio::fs::write(path, snapshot).await.map_err(StoreError::from)?;
        }
        info!(id = ?stored.id, title = %stored.title, "recipe stored");
        Ok(stored)
    }
}
