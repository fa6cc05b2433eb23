use thiserror::Error;

/// Business errors for expert-profile workflows
#[derive(Debug, Error)]
pub enum ExpertError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    Conflict,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl ExpertError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ExpertError::Validation(_) => 1001,
            ExpertError::Conflict => 1002,
            ExpertError::NotFound(_) => 1003,
            ExpertError::BadRequest(_) => 1004,
            ExpertError::HashError(_) => 1101,
            ExpertError::Repository(_) => 1200,
        }
    }
}

impl From<models::errors::ModelError> for ExpertError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => ExpertError::Validation(msg),
            models::errors::ModelError::Db(msg) => ExpertError::Repository(msg),
        }
    }
}
