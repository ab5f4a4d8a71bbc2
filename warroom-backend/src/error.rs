//! Crate-level error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarRoomError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("roster error: {0}")]
    Roster(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("Unknown officer: {0}")]
    UnknownOfficer(String),

    /// Research councils need exactly one officer per perspective.
    #[error("Expected 4 officers in {class}, found {found}")]
    ResearchCouncilSize { class: String, found: usize },
}

pub type DbResult<T> = Result<T, WarRoomError>;
