use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table creation error: {0}")]
    TableCreation(String),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(i64),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Store failures reach the engine as lookup errors.
impl From<DatabaseError> for authz::AuthzError {
    fn from(err: DatabaseError) -> Self {
        authz::AuthzError::Lookup(err.to_string())
    }
}
