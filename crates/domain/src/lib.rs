#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod clock;
mod error;
mod local;
mod name;
mod reconcile;
mod service;
mod session;
mod sync;
mod template;
mod timer;
mod user;
mod workout;

pub use clock::{Clock, SystemClock, format_clock};
pub use error::{
    AuthError, PersistenceError, SessionError, StorageError, ValidationError,
};
pub use local::{LocalRepository, LocalState};
pub use name::{Name, NameError};
pub use reconcile::{Reconciliation, RecordSource, reconcile};
pub use service::{Service, SetUpdate};
pub use session::{FinishOutcome, SessionState, UNTITLED_WORKOUT};
pub use sync::{DrainOutcome, SyncOutcome, SyncQueue, SyncQueueEntry, SyncQueueRepository};
pub use template::{DEFAULT_TEMPLATE_NAME, Template, TemplateExercise, TemplateID};
pub use timer::{RestTick, RestTimer};
pub use user::{
    CURRENT_VERSION, ExerciseHistory, ExerciseLibrary, LastSet, UserRecord, Username,
};
pub use workout::{
    DEFAULT_REST_DURATION, Exercise, ExerciseID, Set, SetField, Workout, WorkoutID,
    WorkoutSummary,
};

/// Remote copy of the user records.
#[allow(async_fn_in_trait)]
pub trait RemoteRepository {
    /// Returns `None` if the user has no remote record.
    async fn read_record(&self, username: &Username) -> Result<Option<UserRecord>, StorageError>;
    /// Overwrites the remote record. Writing the same record twice has no further effect.
    async fn write_record(&self, username: &Username, record: &UserRecord)
    -> Result<(), StorageError>;
}

/// Credential verification, done by the server.
#[allow(async_fn_in_trait)]
pub trait AuthRepository {
    /// Returns the remote record of the user.
    async fn verify_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserRecord, AuthError>;
    /// Creates a user and returns its initial record.
    async fn register(&self, username: &Username, password: &str) -> Result<UserRecord, AuthError>;
}

/// Test doubles for the repositories and the clock.
#[cfg(any(test, feature = "test-util"))]
#[allow(clippy::missing_panics_doc)]
pub mod testing {
    mod clock;
    mod memory;

    pub use clock::ManualClock;
    pub use memory::MemoryRepository;
}
