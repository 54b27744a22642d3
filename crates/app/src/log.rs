use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use serde::{Deserialize, Serialize};

/// Number of entries kept by a repository.
pub const CAPACITY: usize = 100;

pub static LOG: Mutex<Option<Arc<Mutex<dyn Repository>>>> = Mutex::new(None);

/// Persistent store of the most recent log entries, newest first.
#[allow(clippy::missing_errors_doc)]
pub trait Repository: Send + Sync + 'static {
    fn read_entries(&self) -> Result<VecDeque<Entry>, Error>;
    fn write_entry(&self, entry: Entry) -> Result<(), Error>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub time: String,
    #[serde(with = "LevelDef")]
    pub level: Level,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "Level")]
pub enum LevelDef {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Adds an entry in front and drops the oldest entries beyond the capacity.
pub fn push_entry(entries: &mut VecDeque<Entry>, entry: Entry) {
    entries.push_front(entry);
    entries.truncate(CAPACITY);
}

static LOGGER: Logger = Logger;

/// # Errors
///
/// Returns an error if the logger has already been initialized.
pub fn init(storage: Arc<Mutex<dyn Repository>>, level: LevelFilter) -> Result<(), SetLoggerError> {
    if let Ok(mut log) = LOG.lock() {
        *log = Some(storage);
    }
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

struct Logger;

/// Local wall-clock time, e.g. `Mar 01 08:00:00`.
fn timestamp() -> String {
    Local::now().format("%b %d %H:%M:%S").to_string()
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = Entry {
            time: timestamp(),
            level: record.level(),
            message: record.args().to_string(),
        };

        eprintln!("{} {:<5} {}", entry.time, entry.level, entry.message);

        if let Ok(log) = LOG.lock()
            && let Some(ref log) = *log
            && let Ok(repository) = log.lock()
        {
            let _ = repository.write_entry(entry);
        }
    }

    fn flush(&self) {}
}
