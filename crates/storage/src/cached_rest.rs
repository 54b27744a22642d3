//! Cached REST
//!
//! The `REST` server holds the remote copy of each user record, while `LocalStorage` keeps the
//! device state and the sync queue. All modifications are applied to the local storage first
//! and can be made without a connection to the server.

use std::{collections::VecDeque, path::PathBuf, time::Duration};

use fitjournal_app::Config;
use fitjournal_domain as domain;

use super::local_storage::LocalStorage;
use super::rest::{REST, ReqwestSendRequest, SendRequest};

pub struct CachedREST<S: SendRequest> {
    pub local: LocalStorage,
    pub rest: REST<S>,
}

impl CachedREST<ReqwestSendRequest> {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            local: LocalStorage::new(data_dir),
            rest: REST::new(base_url, timeout)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.data_dir,
            &config.server_url,
            config.request_timeout(),
        )
    }
}

impl<S: SendRequest> domain::LocalRepository for CachedREST<S> {
    fn read_state(&self) -> Result<domain::LocalState, domain::PersistenceError> {
        self.local.read_state()
    }

    fn write_state(&self, state: &domain::LocalState) -> Result<(), domain::PersistenceError> {
        self.local.write_state(state)
    }
}

impl<S: SendRequest> domain::SyncQueueRepository for CachedREST<S> {
    fn read_sync_queue(
        &self,
    ) -> Result<VecDeque<domain::SyncQueueEntry>, domain::PersistenceError> {
        self.local.read_sync_queue()
    }

    fn write_sync_queue(
        &self,
        queue: &VecDeque<domain::SyncQueueEntry>,
    ) -> Result<(), domain::PersistenceError> {
        self.local.write_sync_queue(queue)
    }
}

impl<S: SendRequest> domain::RemoteRepository for CachedREST<S> {
    async fn read_record(
        &self,
        username: &domain::Username,
    ) -> Result<Option<domain::UserRecord>, domain::StorageError> {
        self.rest.read_record(username).await
    }

    async fn write_record(
        &self,
        username: &domain::Username,
        record: &domain::UserRecord,
    ) -> Result<(), domain::StorageError> {
        self.rest.write_record(username, record).await
    }
}

impl<S: SendRequest> domain::AuthRepository for CachedREST<S> {
    async fn verify_credentials(
        &self,
        username: &domain::Username,
        password: &str,
    ) -> Result<domain::UserRecord, domain::AuthError> {
        self.rest.verify_credentials(username, password).await
    }

    async fn register(
        &self,
        username: &domain::Username,
        password: &str,
    ) -> Result<domain::UserRecord, domain::AuthError> {
        self.rest.register(username, password).await
    }
}

#[cfg(test)]
mod tests {
    use fitjournal_domain::{
        LocalRepository, RecordSource, Service, SetField, SyncQueueRepository, SystemClock,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::record::UserRecord;
    use crate::rest::tests::{MockSendRequest, rest_with_response};
    use crate::tests::data::{USER_RECORD, USERNAME};

    use super::*;

    fn cached_rest(
        dir: &tempfile::TempDir,
        response: Option<(u16, serde_json::Value)>,
    ) -> CachedREST<MockSendRequest> {
        CachedREST {
            local: LocalStorage::new(dir.path()),
            rest: rest_with_response(response),
        }
    }

    fn respond(service: &Service<CachedREST<MockSendRequest>, SystemClock>, status: u16) {
        *service.repository().rest.sender.response.borrow_mut() =
            Some((status, json!({ "success": true }).to_string()));
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            server_url: "https://example.com/.netlify/functions/".to_string(),
            data_dir: dir.path().join("fitjournal"),
            ..Config::default()
        };

        let cached_rest = CachedREST::from_config(&config).unwrap();

        assert_eq!(cached_rest.rest.base_url, config.server_url);
        assert_eq!(
            cached_rest.local.read_state().unwrap(),
            domain::LocalState::default()
        );
    }

    #[tokio::test]
    async fn test_offline_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::new(
            cached_rest(
                &dir,
                Some((
                    200,
                    json!({ "username": "alice", "data": UserRecord::from(&*USER_RECORD) }),
                )),
            ),
            SystemClock,
        );

        assert_eq!(
            service.login("alice", "secret", true).await.unwrap(),
            RecordSource::Remote
        );
        assert_eq!(
            service.record().unwrap().workouts,
            USER_RECORD.workouts
        );

        service.start_workout().await.unwrap();
        service.add_exercise("Squat").await.unwrap();
        service
            .update_set(0, 0, SetField::Weight, "100")
            .await
            .unwrap();
        service
            .update_set(0, 0, SetField::Reps, "5")
            .await
            .unwrap();
        service.finish_workout().await.unwrap();

        let storage = LocalStorage::new(dir.path());
        let state = storage.read_state().unwrap();
        assert_eq!(state.current_user, Some(USERNAME.clone()));
        assert_eq!(state.current_record().unwrap().workouts.len(), 2);

        let queue = storage.read_sync_queue().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(&queue[0].record, service.record().unwrap());

        respond(&service, 200);
        let outcome = service.process_sync_queue().await.unwrap();
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.pending, 0);
        assert!(storage.read_sync_queue().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_session_without_connection() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = Service::new(
            cached_rest(
                &dir,
                Some((
                    200,
                    json!({ "username": "alice", "data": UserRecord::from(&*USER_RECORD) }),
                )),
            ),
            SystemClock,
        );
        service.login("alice", "secret", true).await.unwrap();

        let mut service = Service::new(cached_rest(&dir, None), SystemClock);
        assert_eq!(service.restore_session().unwrap(), Some(&*USERNAME));
        assert_eq!(
            service.record().unwrap().templates,
            USER_RECORD.templates
        );
    }
}
