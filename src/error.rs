use thiserror::Error;

/// Errors raised by the activity store.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("user already exists: {0}")]
    DuplicateUser(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("no user with id {0}")]
    UnknownUserId(i64),

    #[error("username must not be blank")]
    InvalidUsername,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
