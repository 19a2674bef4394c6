use thiserror::Error;

/// Failure to obtain a payload from the weather API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("weather API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("weather API request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("weather API returned a body that is not JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(err) => err.status().map(|s| s.as_u16()),
            FetchError::Decode(_) => Some(200),
        }
    }
}

/// The payload does not hold the observation data a record is built from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing current weather data in the API response")]
    MissingCurrentWeather,
}

/// Failure to write a record to the destination table.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to start transaction on {path}: {source}")]
    Begin {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to ensure weather table exists: {0}")]
    CreateTable(#[source] rusqlite::Error),

    #[error("value {value} cannot be stored in {column} column `{name}`")]
    ColumnType {
        name: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("failed to insert weather row: {0}")]
    Insert(#[source] rusqlite::Error),

    #[error("failed to commit weather row: {0}")]
    Commit(#[source] rusqlite::Error),
}

/// Any failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl EtlError {
    /// Name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            EtlError::Fetch(_) => "fetch",
            EtlError::Validation(_) => "transform",
            EtlError::Persistence(_) => "load",
        }
    }
}
