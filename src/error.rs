use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("invalid circuit json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("asset for {0} could not be loaded: {1}")]
    Asset(crate::component::ComponentKind, String),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;
