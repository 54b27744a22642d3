use std::collections::BTreeMap;

use crate::{PersistenceError, UserRecord, Username};

/// Everything that is kept on the device between runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocalState {
    pub current_user: Option<Username>,
    /// User whose session may be restored without contacting the server.
    pub trusted_user: Option<Username>,
    pub users: BTreeMap<Username, UserRecord>,
}

impl LocalState {
    #[must_use]
    pub fn current_record(&self) -> Option<&UserRecord> {
        self.users.get(self.current_user.as_ref()?)
    }

    pub fn current_record_mut(&mut self) -> Option<&mut UserRecord> {
        self.users.get_mut(self.current_user.as_ref()?)
    }

    /// A session is restorable if the current user is trusted and has a cached record.
    #[must_use]
    pub fn is_restorable(&self) -> bool {
        self.current_user.is_some()
            && self.current_user == self.trusted_user
            && self.current_record().is_some()
    }
}

pub trait LocalRepository {
    fn read_state(&self) -> Result<LocalState, PersistenceError>;
    fn write_state(&self, state: &LocalState) -> Result<(), PersistenceError>;
}
