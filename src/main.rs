use anyhow::{Context, Result};
use recipe_personalizer::api_connection::endpoints::Provider;
use recipe_personalizer::cli::{parse_args, Command, OperationArgs};
use recipe_personalizer::config::Config;
use recipe_personalizer::engine::{ModifyRequest, Operation, RecipeEngine};
use recipe_personalizer::error::{EngineError, ErrorClass, ErrorResponse};
use recipe_personalizer::recipe::Recipe;
use recipe_personalizer::store::{LocalRecordStore, RecordStore};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type Engine = RecipeEngine<LocalRecordStore, Provider>;

async fn read_input_file(path: &Path, what: &str) -> Result<String, EngineError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EngineError::Validation(format!("Failed to read {} file '{}': {}", what, path.display(), e)))
}

async fn read_recipe_file(path: &Path) -> Result<Recipe, EngineError> {
    let text = read_input_file(path, "recipe").await?;
    serde_json::from_str(&text).map_err(|e| EngineError::Validation(format!("Invalid recipe file: {}", e)))
}

async fn build_request(operation: Operation, args: &OperationArgs, scale_factor: Option<f64>) -> Result<ModifyRequest> {
    let recipe_payload = match &args.recipe_file {
        Some(path) => Some(read_recipe_file(path).await?),
        None => None,
    };
    Ok(ModifyRequest {
        recipe_id: args.recipe_id.clone(),
        recipe_payload,
        operation,
        user_profile: args.profile(),
        scale_factor,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_status_for(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::BadRequest => 2,
        ErrorClass::NotFound => 3,
        ErrorClass::ServerError => 1,
    }
}

/// JSON body and exit status for a failed command. Errors that are not
/// `EngineError`s (startup failures) count as server errors.
fn failure_report(err: &anyhow::Error) -> (ErrorResponse, u8) {
    match err.downcast_ref::<EngineError>() {
        Some(engine_error) => (engine_error.to_response(), exit_status_for(engine_error.class())),
        None => (
            ErrorResponse {
                error: format!("{:#}", err),
            },
            exit_status_for(ErrorClass::ServerError),
        ),
    }
}

async fn run(engine: &Engine, command: Command) -> Result<()> {
    let request = match command {
        Command::MapNutrients(args) => build_request(Operation::MapNutrients, &args, None).await?,
        Command::Scale { operation, factor } => {
            build_request(Operation::Scale, &operation, Some(factor)).await?
        }
        Command::Substitute(args) => build_request(Operation::Substitute, &args, None).await?,
        Command::Request { file } => ModifyRequest::from_json(&read_input_file(&file, "request").await?)?,
        Command::AddRecipe { recipe_file } => {
            let recipe = read_recipe_file(&recipe_file).await?;
            let stored = engine.store().insert_recipe(recipe).await?;
            return print_json(&stored);
        }
        Command::ListRecipes => {
            let recipes = engine.store().list_recipes().await.map_err(EngineError::from)?;
            return print_json(&recipes);
        }
        Command::ShowRecipe { id } => {
            let recipe = engine
                .store()
                .fetch_recipe(&id)
                .await
                .map_err(EngineError::from)?
                .ok_or_else(|| EngineError::NotFound("Recipe not found".to_string()))?;
            return print_json(&recipe);
        }
    };

    let result = engine.modify(&request).await?;
    print_json(&result)
}

async fn open_engine(config: &Config) -> Result<Engine> {
    info!("Opening record store at {:?}", config.data_dir);
    let store = LocalRecordStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open record store at {:?}", config.data_dir))?;
    Ok(RecipeEngine::new(store, Provider::from_config(config)))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli_args = parse_args();

    let log_level = if cli_args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().with_data_dir(cli_args.data_dir.clone());
    let outcome = match open_engine(&config).await {
        Ok(engine) => run(&engine, cli_args.command).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{:#}", e);
            let (response, status) = failure_report(&e);
            print_json(&response)?;
            Ok(ExitCode::from(status))
        }
    }
}
