use axum::extract::FromRef;

pub mod commands;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod escape;
pub mod expiry;
pub mod fingerprint;
pub mod ids;
pub mod models;
pub mod types;

pub use error::{AppError, AppResult};

use crate::config::Config;
use crate::controllers::paste::PasteStore;
use crate::db::Database;
use crate::ids::IdGenerator;

/// Everything a command needs, shared with request handlers as axum state.
#[derive(Clone, FromRef)]
pub struct App {
    pub config: Config,
    pub store: PasteStore,
}

impl App {
    /// Connect to the configured database and build the paste store.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database = Database::connect(&config.database.url).await?;
        let ids = IdGenerator::new(config.ids.length)?;
        let store = PasteStore::new(database, ids, config.base_url.clone());
        Ok(App { config, store })
    }
}
