use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use crate::{
    AuthError, AuthRepository, LocalRepository, LocalState, PersistenceError, RemoteRepository,
    StorageError, SyncQueueEntry, SyncQueueRepository, UserRecord, Username,
};

/// In-memory stand-in for the local storage and the server.
///
/// Clones share their data, so a test can keep a handle while the service owns another.
#[derive(Clone, Default)]
pub struct MemoryRepository(Rc<Inner>);

#[derive(Default)]
struct Inner {
    local_state: RefCell<LocalState>,
    sync_queue: RefCell<VecDeque<SyncQueueEntry>>,
    local_failure: Cell<bool>,
    offline: Cell<bool>,
    successful_writes_left: Cell<Option<usize>>,
    passwords: RefCell<BTreeMap<Username, String>>,
    remote: RefCell<BTreeMap<Username, UserRecord>>,
    delivered: RefCell<Vec<(Username, UserRecord)>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Going online also lifts a limit set by `fail_after`.
    pub fn set_online(&self, online: bool) {
        self.0.offline.set(!online);
        self.0.successful_writes_left.set(None);
    }

    /// Lets the next `n` remote writes succeed and fails all following ones.
    pub fn fail_after(&self, n: usize) {
        self.0.successful_writes_left.set(Some(n));
    }

    pub fn set_local_failure(&self, fail: bool) {
        self.0.local_failure.set(fail);
    }

    pub fn add_user(&self, username: &str, password: &str, record: UserRecord) {
        let username = Username::new(username).unwrap();
        self.0
            .passwords
            .borrow_mut()
            .insert(username.clone(), password.to_string());
        self.0.remote.borrow_mut().insert(username, record);
    }

    pub fn remote_record(&self, username: &str) -> Option<UserRecord> {
        self.0
            .remote
            .borrow()
            .get(&Username::new(username).unwrap())
            .cloned()
    }

    pub fn set_remote_record(&self, username: &str, record: UserRecord) {
        self.0
            .remote
            .borrow_mut()
            .insert(Username::new(username).unwrap(), record);
    }

    pub fn local_state(&self) -> LocalState {
        self.0.local_state.borrow().clone()
    }

    pub fn sync_queue(&self) -> Vec<SyncQueueEntry> {
        self.0.sync_queue.borrow().iter().cloned().collect()
    }

    pub fn delivered(&self) -> Vec<(Username, UserRecord)> {
        self.0.delivered.borrow().clone()
    }

    fn check_connection(&self) -> Result<(), StorageError> {
        if self.0.offline.get() {
            return Err(StorageError::NoConnection);
        }
        Ok(())
    }
}

impl LocalRepository for MemoryRepository {
    fn read_state(&self) -> Result<LocalState, PersistenceError> {
        if self.0.local_failure.get() {
            return Err(PersistenceError::Read("disk failure".into()));
        }
        Ok(self.local_state())
    }

    fn write_state(&self, state: &LocalState) -> Result<(), PersistenceError> {
        if self.0.local_failure.get() {
            return Err(PersistenceError::Write("disk failure".into()));
        }
        *self.0.local_state.borrow_mut() = state.clone();
        Ok(())
    }
}

impl SyncQueueRepository for MemoryRepository {
    fn read_sync_queue(&self) -> Result<VecDeque<SyncQueueEntry>, PersistenceError> {
        if self.0.local_failure.get() {
            return Err(PersistenceError::Read("disk failure".into()));
        }
        Ok(self.0.sync_queue.borrow().clone())
    }

    fn write_sync_queue(&self, queue: &VecDeque<SyncQueueEntry>) -> Result<(), PersistenceError> {
        if self.0.local_failure.get() {
            return Err(PersistenceError::Write("disk failure".into()));
        }
        *self.0.sync_queue.borrow_mut() = queue.clone();
        Ok(())
    }
}

impl RemoteRepository for MemoryRepository {
    async fn read_record(&self, username: &Username) -> Result<Option<UserRecord>, StorageError> {
        self.check_connection()?;
        Ok(self.0.remote.borrow().get(username).cloned())
    }

    async fn write_record(
        &self,
        username: &Username,
        record: &UserRecord,
    ) -> Result<(), StorageError> {
        self.check_connection()?;
        match self.0.successful_writes_left.get() {
            Some(0) => return Err(StorageError::NoConnection),
            Some(n) => self.0.successful_writes_left.set(Some(n - 1)),
            None => {}
        }
        self.0
            .remote
            .borrow_mut()
            .insert(username.clone(), record.clone());
        self.0
            .delivered
            .borrow_mut()
            .push((username.clone(), record.clone()));
        Ok(())
    }
}

impl AuthRepository for MemoryRepository {
    async fn verify_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        self.check_connection()?;
        if self.0.passwords.borrow().get(username).map(String::as_str) != Some(password) {
            return Err(AuthError::InvalidCredentials);
        }
        self.0
            .remote
            .borrow()
            .get(username)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn register(&self, username: &Username, password: &str) -> Result<UserRecord, AuthError> {
        self.check_connection()?;
        if self.0.passwords.borrow().contains_key(username) {
            return Err(AuthError::AlreadyExists);
        }
        let record = UserRecord::new(format!("hash:{password}"));
        self.0
            .passwords
            .borrow_mut()
            .insert(username.clone(), password.to_string());
        self.0
            .remote
            .borrow_mut()
            .insert(username.clone(), record.clone());
        Ok(record)
    }
}
