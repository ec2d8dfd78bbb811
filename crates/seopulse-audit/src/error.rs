use thiserror::Error;

use seopulse_db::DbError;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store \"{domain}\" has no content origin configured")]
    MissingContentOrigin { domain: String },

    #[error("no content could be fetched for \"{domain}\": every resource type failed")]
    NoContent { domain: String },

    #[error("audit {stage} stage timed out after {seconds}s")]
    StageTimeout { stage: &'static str, seconds: u64 },
}
