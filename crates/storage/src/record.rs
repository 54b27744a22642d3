//! Serialized form of the user records.
//!
//! The same JSON shape is used for the local blobs and for the server. All fields except
//! identifiers are optional when reading, so records written by older versions can still be
//! loaded. Loaded records are upgraded to the current schema version.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, NaiveDate};
use fitjournal_domain as domain;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub active_workout: Option<Workout>,
    #[serde(default)]
    pub exercise_history: BTreeMap<String, ExerciseHistory>,
    #[serde(default)]
    pub exercise_library: Vec<String>,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl From<&domain::UserRecord> for UserRecord {
    fn from(value: &domain::UserRecord) -> Self {
        Self {
            password_hash: value.password_hash.clone(),
            workouts: value.workouts.iter().map(Workout::from).collect(),
            active_workout: value.active_workout.as_ref().map(Workout::from),
            exercise_history: value
                .exercise_history
                .iter()
                .map(|(name, history)| (name.to_string(), ExerciseHistory::from(history)))
                .collect(),
            exercise_library: value.exercise_library.iter().map(ToString::to_string).collect(),
            templates: value.templates.iter().map(Template::from).collect(),
            updated_at: value.updated_at,
            version: value.version,
        }
    }
}

impl TryFrom<UserRecord> for domain::UserRecord {
    type Error = RecordError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            password_hash: value.password_hash,
            workouts: value
                .workouts
                .into_iter()
                .map(domain::Workout::try_from)
                .collect::<Result<_, RecordError>>()?,
            active_workout: value
                .active_workout
                .map(domain::Workout::try_from)
                .transpose()?,
            exercise_history: value
                .exercise_history
                .into_iter()
                .map(|(name, history)| {
                    Ok((
                        domain::Name::new(&name)?,
                        domain::ExerciseHistory::from(history),
                    ))
                })
                .collect::<Result<_, RecordError>>()?,
            exercise_library: value
                .exercise_library
                .iter()
                .map(|name| domain::Name::new(name))
                .collect::<Result<_, domain::NameError>>()?,
            templates: value
                .templates
                .into_iter()
                .map(domain::Template::try_from)
                .collect::<Result<_, domain::NameError>>()?,
            updated_at: value.updated_at,
            version: value.version.max(domain::CURRENT_VERSION),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default = "default_use_rest_timer")]
    pub use_rest_timer: bool,
    #[serde(default = "default_rest_duration")]
    pub rest_duration: u32,
}

fn default_use_rest_timer() -> bool {
    true
}

fn default_rest_duration() -> u32 {
    domain::DEFAULT_REST_DURATION
}

impl From<&domain::Workout> for Workout {
    fn from(value: &domain::Workout) -> Self {
        Self {
            id: *value.id,
            name: value.name.clone(),
            date: value.date,
            exercises: value.exercises.iter().map(Exercise::from).collect(),
            start_time: value.start_time.map(|t| t.timestamp_millis()),
            elapsed_seconds: value.elapsed_seconds,
            is_paused: value.is_paused,
            use_rest_timer: value.use_rest_timer,
            rest_duration: value.rest_duration,
        }
    }
}

impl TryFrom<Workout> for domain::Workout {
    type Error = RecordError;

    fn try_from(value: Workout) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: value.name,
            date: value.date,
            exercises: value
                .exercises
                .into_iter()
                .map(domain::Exercise::try_from)
                .collect::<Result<_, domain::NameError>>()?,
            start_time: value
                .start_time
                .map(|ms| {
                    DateTime::from_timestamp_millis(ms).ok_or(RecordError::InvalidTimestamp(ms))
                })
                .transpose()?,
            elapsed_seconds: value.elapsed_seconds,
            is_paused: value.is_paused,
            use_rest_timer: value.use_rest_timer,
            rest_duration: value.rest_duration,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<Set>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            sets: value.sets.iter().map(Set::from).collect(),
            previous: value.previous.clone(),
            notes: value.notes.clone(),
        }
    }
}

impl TryFrom<Exercise> for domain::Exercise {
    type Error = domain::NameError;

    fn try_from(value: Exercise) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            sets: value.sets.into_iter().map(domain::Set::from).collect(),
            previous: value.previous,
            notes: value.notes,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Set {
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub completed: bool,
}

impl From<&domain::Set> for Set {
    fn from(value: &domain::Set) -> Self {
        Self {
            weight: value.weight.clone(),
            reps: value.reps.clone(),
            completed: value.completed,
        }
    }
}

impl From<Set> for domain::Set {
    fn from(value: Set) -> Self {
        Self {
            weight: value.weight,
            reps: value.reps,
            completed: value.completed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseHistory {
    #[serde(default)]
    pub last_sets: Vec<LastSet>,
    pub last_performed: NaiveDate,
}

impl From<&domain::ExerciseHistory> for ExerciseHistory {
    fn from(value: &domain::ExerciseHistory) -> Self {
        Self {
            last_sets: value
                .last_sets
                .iter()
                .map(|s| LastSet {
                    weight: s.weight.clone(),
                    reps: s.reps.clone(),
                })
                .collect(),
            last_performed: value.last_performed,
        }
    }
}

impl From<ExerciseHistory> for domain::ExerciseHistory {
    fn from(value: ExerciseHistory) -> Self {
        Self {
            last_sets: value
                .last_sets
                .into_iter()
                .map(|s| domain::LastSet {
                    weight: s.weight,
                    reps: s.reps,
                })
                .collect(),
            last_performed: value.last_performed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LastSet {
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub reps: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<TemplateExercise>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TemplateExercise {
    pub name: String,
}

impl From<&domain::Template> for Template {
    fn from(value: &domain::Template) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            exercises: value
                .exercises
                .iter()
                .map(|e| TemplateExercise {
                    name: e.name.to_string(),
                })
                .collect(),
        }
    }
}

impl TryFrom<Template> for domain::Template {
    type Error = domain::NameError;

    fn try_from(value: Template) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            exercises: value
                .exercises
                .into_iter()
                .map(|e| {
                    Ok(domain::TemplateExercise {
                        name: domain::Name::new(&e.name)?,
                    })
                })
                .collect::<Result<_, domain::NameError>>()?,
        })
    }
}

/// Blob holding the device state.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    #[serde(default)]
    pub current_user: Option<String>,
    #[serde(default)]
    pub trusted_user: Option<String>,
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
}

impl From<&domain::LocalState> for LocalState {
    fn from(value: &domain::LocalState) -> Self {
        Self {
            current_user: value.current_user.as_ref().map(ToString::to_string),
            trusted_user: value.trusted_user.as_ref().map(ToString::to_string),
            users: value
                .users
                .iter()
                .map(|(username, record)| (username.to_string(), UserRecord::from(record)))
                .collect(),
        }
    }
}

impl TryFrom<LocalState> for domain::LocalState {
    type Error = RecordError;

    fn try_from(value: LocalState) -> Result<Self, Self::Error> {
        Ok(Self {
            current_user: value
                .current_user
                .as_deref()
                .map(domain::Username::new)
                .transpose()?,
            trusted_user: value
                .trusted_user
                .as_deref()
                .map(domain::Username::new)
                .transpose()?,
            users: value
                .users
                .into_iter()
                .map(|(username, record)| {
                    Ok((
                        domain::Username::new(&username)?,
                        domain::UserRecord::try_from(record)?,
                    ))
                })
                .collect::<Result<_, RecordError>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SyncQueueEntry {
    pub username: String,
    pub data: UserRecord,
}

impl From<&domain::SyncQueueEntry> for SyncQueueEntry {
    fn from(value: &domain::SyncQueueEntry) -> Self {
        Self {
            username: value.username.to_string(),
            data: UserRecord::from(&value.record),
        }
    }
}

impl TryFrom<SyncQueueEntry> for domain::SyncQueueEntry {
    type Error = RecordError;

    fn try_from(value: SyncQueueEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            username: domain::Username::new(&value.username)?,
            record: domain::UserRecord::try_from(value.data)?,
        })
    }
}

pub fn sync_queue_from_domain(queue: &VecDeque<domain::SyncQueueEntry>) -> Vec<SyncQueueEntry> {
    queue.iter().map(SyncQueueEntry::from).collect()
}

pub fn sync_queue_into_domain(
    queue: Vec<SyncQueueEntry>,
) -> Result<VecDeque<domain::SyncQueueEntry>, RecordError> {
    queue
        .into_iter()
        .map(domain::SyncQueueEntry::try_from)
        .collect()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error(transparent)]
    Name(#[from] domain::NameError),
    #[error(transparent)]
    Validation(#[from] domain::ValidationError),
}
