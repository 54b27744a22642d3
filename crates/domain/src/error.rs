use crate::NameError;

/// Failure of the remote store.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("no connection")]
    NoConnection,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl StorageError {
    /// Transient failures are retried by the sync queue instead of being reported.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::NoConnection)
    }
}

/// Failure of the local durable storage.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("failed to read local state: {0}")]
    Read(Box<dyn std::error::Error>),
    #[error("failed to write local state: {0}")]
    Write(Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username must not be empty")]
    EmptyUsername,
    #[error("Password must not be empty")]
    EmptyPassword,
    #[error(transparent)]
    Name(#[from] NameError),
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user already exists")]
    AlreadyExists,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("no session")]
    NoSession,
    #[error("no active workout")]
    NoActiveWorkout,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<NameError> for SessionError {
    fn from(value: NameError) -> Self {
        SessionError::Validation(ValidationError::Name(value))
    }
}
