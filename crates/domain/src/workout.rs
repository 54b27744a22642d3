use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{ExerciseHistory, Name, UNTITLED_WORKOUT};

pub const DEFAULT_REST_DURATION: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutID,
    pub name: String,
    pub date: NaiveDate,
    pub exercises: Vec<Exercise>,
    /// Set while the timer is running.
    pub start_time: Option<DateTime<Utc>>,
    /// Accumulated time of all finished running intervals.
    pub elapsed_seconds: u64,
    pub is_paused: bool,
    pub use_rest_timer: bool,
    pub rest_duration: u32,
}

impl Workout {
    /// Creates an empty workout dated on the given day. The timer is not started.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: WorkoutID::new(),
            name: String::new(),
            date,
            exercises: vec![],
            start_time: None,
            elapsed_seconds: 0,
            is_paused: false,
            use_rest_timer: true,
            rest_duration: DEFAULT_REST_DURATION,
        }
    }

    /// Appends an exercise with a single empty set.
    ///
    /// The previous performance is copied from the history at this point and is not
    /// updated afterwards.
    pub fn add_exercise(&mut self, name: Name, history: Option<&ExerciseHistory>) {
        self.exercises.push(Exercise {
            id: ExerciseID::new(),
            name,
            sets: vec![Set::default()],
            previous: history.map(ExerciseHistory::format_last_sets),
            notes: String::new(),
        });
    }

    /// # Panics
    ///
    /// Panics if `exercise_idx` is out of bounds.
    pub fn add_set(&mut self, exercise_idx: usize) {
        self.exercises[exercise_idx].sets.push(Set::default());
    }

    /// # Panics
    ///
    /// Panics if `exercise_idx` or `set_idx` is out of bounds.
    pub fn remove_set(&mut self, exercise_idx: usize, set_idx: usize) {
        self.exercises[exercise_idx].sets.remove(set_idx);
    }

    /// Writes a field of a set. Clearing a field marks the set as not completed.
    ///
    /// # Panics
    ///
    /// Panics if `exercise_idx` or `set_idx` is out of bounds.
    pub fn update_set(&mut self, exercise_idx: usize, set_idx: usize, field: SetField, value: &str) {
        let set = &mut self.exercises[exercise_idx].sets[set_idx];
        match field {
            SetField::Weight => set.weight = value.to_string(),
            SetField::Reps => set.reps = value.to_string(),
        }
        if value.is_empty() {
            set.completed = false;
        }
    }

    /// True if any set has a weight or reps entered.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.exercises
            .iter()
            .any(|e| e.sets.iter().any(|s| !s.weight.is_empty() || !s.reps.is_empty()))
    }

    /// Totals of the workout, including a running timer interval up to `now`.
    #[must_use]
    pub fn summary(&self, now: DateTime<Utc>) -> WorkoutSummary {
        WorkoutSummary {
            name: if self.name.is_empty() {
                UNTITLED_WORKOUT.to_string()
            } else {
                self.name.clone()
            },
            date: self.date,
            total_seconds: self.elapsed_seconds_at(now),
            exercises: self.exercises.len(),
            sets: self.exercises.iter().map(|e| e.sets.len()).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSummary {
    pub name: String,
    pub date: NaiveDate,
    pub total_seconds: u64,
    pub exercises: usize,
    pub sets: usize,
}

#[derive(Deref, Debug, Display, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkoutID(Uuid);

impl WorkoutID {
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for WorkoutID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for WorkoutID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub sets: Vec<Set>,
    pub previous: Option<String>,
    pub notes: String,
}

#[derive(Deref, Debug, Display, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseID(Uuid);

impl ExerciseID {
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ExerciseID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for ExerciseID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

/// Weight and reps are kept as entered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Set {
    pub weight: String,
    pub reps: String,
    pub completed: bool,
}

impl Set {
    #[must_use]
    pub fn is_filled(&self) -> bool {
        !self.weight.is_empty() && !self.reps.is_empty()
    }

    /// Marks the set as completed the first time both fields are filled.
    ///
    /// Returns true only for the transition.
    pub fn complete_if_filled(&mut self) -> bool {
        if !self.completed && self.is_filled() {
            self.completed = true;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Weight,
    Reps,
}
