pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod nutrients;
pub mod recipe;
pub mod recipe_aggregator;
pub mod scaler;
pub mod store;
pub mod substitution;
pub mod targets;
