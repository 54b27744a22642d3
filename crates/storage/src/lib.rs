#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod cached_rest;
#[allow(clippy::module_name_repetitions)]
pub mod local_storage;
pub mod record;
pub mod rest;

pub use cached_rest::CachedREST;
pub use local_storage::{Key, LocalStorage, LocalStorageError};
pub use rest::{REST, ReqwestSendRequest, SendRequest};
