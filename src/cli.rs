use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::recipe::{Disease, Sex, UserProfile};

#[derive(Parser, Debug)]
#[command(author, version, about = "Personalize recipes for health conditions", long_about = None)]
pub struct Cli {
    /// Directory holding catalog.csv, disease_targets.json and recipes.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging (prompts and raw replies included)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute nutrition and target percentages for a recipe
    MapNutrients(OperationArgs),
    /// Scale a recipe by a factor between 0.5 and 10
    Scale {
        #[command(flatten)]
        operation: OperationArgs,
        #[arg(short, long)]
        factor: f64,
    },
    /// Ask the reasoning service for ingredient substitutions
    Substitute(OperationArgs),
    /// Run a JSON request ({recipeId|recipePayload, operation, userProfile, scaleFactor?})
    Request {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Validate and store a recipe from a JSON file
    AddRecipe {
        #[arg(short, long)]
        recipe_file: PathBuf,
    },
    /// List stored recipes, newest first
    ListRecipes,
    /// Show one stored recipe
    ShowRecipe { id: String },
}

#[derive(Args, Debug)]
pub struct OperationArgs {
    /// Id of a stored recipe
    #[arg(long, conflicts_with = "recipe_file")]
    pub recipe_id: Option<String>,

    /// Path to a recipe JSON file
    #[arg(short, long)]
    pub recipe_file: Option<PathBuf>,

    #[arg(long)]
    pub disease: Disease,

    /// Comma-separated allergy list
    #[arg(long, value_delimiter = ',')]
    pub allergies: Vec<String>,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long)]
    pub sex: Option<Sex>,
}

impl OperationArgs {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            disease: self.disease,
            age: self.age,
            sex: self.sex,
            allergies: self
                .allergies
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
