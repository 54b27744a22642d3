//! File-backed key-value storage.
//!
//! Each key is stored as a JSON file in the data directory. Files are replaced atomically, so
//! a crash during a write leaves the previous value in place.

use std::{
    collections::VecDeque,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use fitjournal_app::log;
use fitjournal_domain as domain;
use serde::{Serialize, de::DeserializeOwned};
use strum::AsRefStr;

use crate::record::{self, RecordError};

#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    #[strum(serialize = "fitnessJournalState")]
    State,
    #[strum(serialize = "syncQueue")]
    SyncQueue,
    #[strum(serialize = "log")]
    Log,
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns `None` if nothing has been stored under the key.
    pub fn get<T: DeserializeOwned>(&self, key: Key) -> Result<Option<T>, LocalStorageError> {
        let path = self.path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(anyhow::Error::from(err)
                .context(format!("failed to read {}", path.display()))
                .into()),
        }
    }

    pub fn set<T: Serialize>(&self, key: Key, value: &T) -> Result<(), LocalStorageError> {
        let bytes = serde_json::to_vec(value)?;
        let path = self.path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;

        Ok(())
    }

    fn path(&self, key: Key) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_ref()))
    }
}

impl domain::LocalRepository for LocalStorage {
    fn read_state(&self) -> Result<domain::LocalState, domain::PersistenceError> {
        self.get::<record::LocalState>(Key::State)
            .and_then(|state| Ok(domain::LocalState::try_from(state.unwrap_or_default())?))
            .map_err(|err| domain::PersistenceError::Read(Box::new(err)))
    }

    fn write_state(&self, state: &domain::LocalState) -> Result<(), domain::PersistenceError> {
        self.set(Key::State, &record::LocalState::from(state))
            .map_err(|err| domain::PersistenceError::Write(Box::new(err)))
    }
}

impl domain::SyncQueueRepository for LocalStorage {
    fn read_sync_queue(
        &self,
    ) -> Result<VecDeque<domain::SyncQueueEntry>, domain::PersistenceError> {
        self.get::<Vec<record::SyncQueueEntry>>(Key::SyncQueue)
            .and_then(|queue| Ok(record::sync_queue_into_domain(queue.unwrap_or_default())?))
            .map_err(|err| domain::PersistenceError::Read(Box::new(err)))
    }

    fn write_sync_queue(
        &self,
        queue: &VecDeque<domain::SyncQueueEntry>,
    ) -> Result<(), domain::PersistenceError> {
        self.set(Key::SyncQueue, &record::sync_queue_from_domain(queue))
            .map_err(|err| domain::PersistenceError::Write(Box::new(err)))
    }
}

impl log::Repository for LocalStorage {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        self.get(Key::Log)
            .map(Option::unwrap_or_default)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        let mut entries = self.read_entries()?;
        log::push_entry(&mut entries, entry);
        self.set(Key::Log, &entries)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LocalStorageError {
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use fitjournal_domain::{LocalRepository, SyncQueueRepository};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::tests::data::{USER_RECORD, USER_RECORD_2, USERNAME};

    use super::*;

    fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("fitjournal"));
        (dir, storage)
    }

    #[rstest]
    #[case(Key::State, "fitnessJournalState")]
    #[case(Key::SyncQueue, "syncQueue")]
    #[case(Key::Log, "log")]
    fn test_key(#[case] key: Key, #[case] expected: &str) {
        assert_eq!(key.as_ref(), expected);
    }

    #[test]
    fn test_get_set() {
        let (_dir, storage) = storage();
        assert_eq!(storage.get::<Vec<u32>>(Key::Log).unwrap(), None);

        storage.set(Key::Log, &vec![1, 2, 3]).unwrap();
        assert_eq!(storage.get::<Vec<u32>>(Key::Log).unwrap(), Some(vec![1, 2, 3]));
        assert!(!storage.path(Key::Log).with_extension("json.tmp").exists());

        storage.set(Key::Log, &vec![4]).unwrap();
        assert_eq!(storage.get::<Vec<u32>>(Key::Log).unwrap(), Some(vec![4]));
    }

    #[test]
    fn test_get_corrupt_value() {
        let (_dir, storage) = storage();
        fs::create_dir_all(&storage.dir).unwrap();
        fs::write(storage.path(Key::State), "{").unwrap();

        assert!(matches!(
            storage.get::<record::LocalState>(Key::State),
            Err(LocalStorageError::Serialization(_))
        ));
        assert!(matches!(
            storage.read_state(),
            Err(domain::PersistenceError::Read(_))
        ));
    }

    #[test]
    fn test_set_into_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "").unwrap();
        let storage = LocalStorage::new(file.join("fitjournal"));

        assert!(matches!(
            storage.write_state(&domain::LocalState::default()),
            Err(domain::PersistenceError::Write(_))
        ));
    }

    #[test]
    fn test_state() {
        let (_dir, storage) = storage();
        assert_eq!(storage.read_state().unwrap(), domain::LocalState::default());

        let state = domain::LocalState {
            current_user: Some(USERNAME.clone()),
            trusted_user: Some(USERNAME.clone()),
            users: [
                (USERNAME.clone(), USER_RECORD.clone()),
                (
                    domain::Username::new("bob").unwrap(),
                    USER_RECORD_2.clone(),
                ),
            ]
            .into(),
        };
        storage.write_state(&state).unwrap();

        assert_eq!(storage.read_state().unwrap(), state);
        assert_eq!(LocalStorage::new(&storage.dir).read_state().unwrap(), state);
    }

    #[test]
    fn test_state_written_by_older_version() {
        let (_dir, storage) = storage();
        fs::create_dir_all(&storage.dir).unwrap();
        fs::write(
            storage.path(Key::State),
            r#"{"currentUser":"alice","users":{"alice":{"passwordHash":"hash","workouts":[]}}}"#,
        )
        .unwrap();

        let state = storage.read_state().unwrap();
        assert_eq!(state.current_user, Some(USERNAME.clone()));
        assert_eq!(state.trusted_user, None);
        assert_eq!(
            state.users[&*USERNAME],
            domain::UserRecord::new("hash".to_string())
        );
    }

    #[test]
    fn test_sync_queue() {
        let (_dir, storage) = storage();
        assert!(storage.read_sync_queue().unwrap().is_empty());

        let queue = VecDeque::from([
            domain::SyncQueueEntry {
                username: USERNAME.clone(),
                record: USER_RECORD.clone(),
            },
            domain::SyncQueueEntry {
                username: domain::Username::new("bob").unwrap(),
                record: USER_RECORD_2.clone(),
            },
        ]);
        storage.write_sync_queue(&queue).unwrap();

        assert_eq!(storage.read_sync_queue().unwrap(), queue);

        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(storage.path(Key::SyncQueue)).unwrap()).unwrap();
        assert_eq!(value[0]["username"], "alice");
        assert_eq!(value[1]["data"]["updatedAt"], 1_709_290_000_000_i64);
    }

    #[test]
    fn test_log() {
        use fitjournal_app::log::Repository;

        let (_dir, storage) = storage();
        assert!(storage.read_entries().unwrap().is_empty());

        for i in 0..=log::CAPACITY {
            storage
                .write_entry(log::Entry {
                    time: "Mar 01 08:00:00".to_string(),
                    level: ::log::Level::Info,
                    message: i.to_string(),
                })
                .unwrap();
        }

        let entries = storage.read_entries().unwrap();
        assert_eq!(entries.len(), log::CAPACITY);
        assert_eq!(entries[0].message, log::CAPACITY.to_string());
    }
}
