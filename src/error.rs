use thiserror::Error;

/// Error kinds surfaced by the library's service APIs. Pipeline binaries
/// keep their orchestration errors local and log-and-continue instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("no affiliates found near stop")]
    NoAffiliates,

    #[error("store error: {0}")]
    Db(#[from] diesel::result::Error),

    #[error("pool error: {0}")]
    Pool(String),

    #[error("bus error: {0}")]
    Bus(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("activity {activity} exhausted {attempts} attempts: {source}")]
    ActivityExhausted {
        activity: &'static str,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("workflow rolled back after {source}")]
    RollbackRequired {
        #[source]
        source: Box<Error>,
    },

    #[error("rollback failed ({rollback_error}) after {source}; operator reconciliation required")]
    RollbackFailed {
        #[source]
        source: Box<Error>,
        rollback_error: String,
    },
}

impl Error {
    /// Input-invalid and not-found are caller mistakes and must never be
    /// retried; everything else may be.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::InvalidInput(_) | Error::NotFound(_, _) | Error::NoAffiliates
        )
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for Error {
    fn from(e: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        Error::Pool(e.to_string())
    }
}
