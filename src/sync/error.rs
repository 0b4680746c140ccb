use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key {id}: {reason}")]
    InvalidKey { id: Uuid, reason: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
