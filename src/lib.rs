/// Public library interface for the habit tracker backend
///
/// This module exports the server wiring and the public types used by the
/// binary, by tests and by anyone embedding the router.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;

pub mod api;
pub mod calendar;
pub mod config;
pub mod text;

mod domain;
mod storage;

// Re-export public modules and types
pub use domain::*;
pub use storage::{HabitStorage, SqliteStorage, StorageError};

use crate::api::AppState;
use crate::calendar::InMemoryEventStore;
use crate::config::ServerConfig;
use crate::text::{TextCapabilities, TextError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text generation setup failed: {0}")]
    Text(#[from] TextError),
}

/// The habit tracker HTTP server
///
/// Owns the shared state (storage, text capabilities, calendar store) and
/// serves the API router over TCP.
pub struct HabitTrackerServer {
    config: ServerConfig,
    state: AppState,
}

impl HabitTrackerServer {
    /// Create a new server from resolved configuration
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing habit tracker with database: {:?}", config.database_path);

        let storage = Arc::new(SqliteStorage::new(config.database_path.clone())?);
        let text = TextCapabilities::from_config(config.text_generation.as_ref())?;
        let events = Arc::new(InMemoryEventStore::new());

        let state = AppState::new(storage, text, events);
        Ok(Self { config, state })
    }

    /// Serve HTTP until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        let habits = self.state.storage.list_habits(None)?;
        tracing::info!("Database ready, found {} existing habits", habits.len());

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }

    /// The application router over this server's state
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &dyn HabitStorage {
        self.state.storage.as_ref()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
