use std::collections::BTreeMap;

use chrono::NaiveDate;
use derive_more::{AsRef, Display};

use crate::{Name, Template, ValidationError, Workout};

pub const CURRENT_VERSION: u32 = 1;

#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(username: &str) -> Result<Self, ValidationError> {
        let trimmed_username = username.trim();

        if trimmed_username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }

        Ok(Username(trimmed_username.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// All data of one user. Synchronized as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub password_hash: String,
    /// Finished workouts in chronological order.
    pub workouts: Vec<Workout>,
    pub active_workout: Option<Workout>,
    pub exercise_history: BTreeMap<Name, ExerciseHistory>,
    pub exercise_library: ExerciseLibrary,
    pub templates: Vec<Template>,
    /// Milliseconds since the Unix epoch of the last modification.
    pub updated_at: i64,
    pub version: u32,
}

impl UserRecord {
    #[must_use]
    pub fn new(password_hash: String) -> Self {
        Self {
            password_hash,
            workouts: vec![],
            active_workout: None,
            exercise_history: BTreeMap::new(),
            exercise_library: ExerciseLibrary::default(),
            templates: vec![],
            updated_at: 0,
            version: CURRENT_VERSION,
        }
    }

    /// Bumps `updated_at` to `now_ms`, or by one millisecond if the clock went backwards.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms.max(self.updated_at + 1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseHistory {
    pub last_sets: Vec<LastSet>,
    pub last_performed: NaiveDate,
}

impl ExerciseHistory {
    /// Renders the last sets as shown next to a newly added exercise.
    #[must_use]
    pub fn format_last_sets(&self) -> String {
        self.last_sets
            .iter()
            .map(|s| format!("{} x {}", s.weight, s.reps))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LastSet {
    pub weight: String,
    pub reps: String,
}

/// Known exercise names in the order they were first used.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExerciseLibrary(Vec<Name>);

impl ExerciseLibrary {
    /// Adds a name unless it is already present. Returns true if it was added.
    pub fn insert(&mut self, name: &Name) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.clone());
        true
    }

    #[must_use]
    pub fn contains(&self, name: &Name) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Name> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names containing `query`, ignoring case, in library order.
    #[must_use]
    pub fn suggest(&self, query: &str) -> Vec<&Name> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return vec![];
        }
        self.0
            .iter()
            .filter(|name| name.as_str().to_lowercase().contains(&query))
            .collect()
    }
}

impl FromIterator<Name> for ExerciseLibrary {
    fn from_iter<T: IntoIterator<Item = Name>>(iter: T) -> Self {
        let mut library = ExerciseLibrary::default();
        for name in iter {
            library.insert(&name);
        }
        library
    }
}

impl<'a> IntoIterator for &'a ExerciseLibrary {
    type Item = &'a Name;
    type IntoIter = std::slice::Iter<'a, Name>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
