use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "OPENROUTER_BASE_URL";
pub const MODEL_ENV_VAR: &str = "OPENROUTER_MODEL";
pub const DATA_DIR_ENV_VAR: &str = "RECIPE_DATA_DIR";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Runtime settings. The API key itself is not stored here: only the name of the
/// variable holding it, which is read when the reasoning service is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key_env_var: String,
    pub base_url: String,
    pub model: String,
    pub site_url: String,
    pub app_name: String,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            site_url: "http://localhost:3000".to_string(),
            app_name: "RecipePersonalizer".to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl Config {
    /// Loads `.env` (if any) and overlays environment variables on the defaults.
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Config::default();
        Self {
            api_key_env_var: defaults.api_key_env_var,
            base_url: env::var(BASE_URL_ENV_VAR).unwrap_or(defaults.base_url),
            model: env::var(MODEL_ENV_VAR).unwrap_or(defaults.model),
            site_url: env::var("SITE_URL").unwrap_or(defaults.site_url),
            app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
            data_dir: env::var(DATA_DIR_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }
}
