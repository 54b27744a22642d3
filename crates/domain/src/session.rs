use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    ExerciseHistory, ExerciseLibrary, LastSet, Name, NameError, Template, TemplateID,
    UserRecord, Workout, WorkoutID,
};

pub const UNTITLED_WORKOUT: &str = "Untitled Workout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoActiveWorkout,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    Saved(WorkoutID),
    /// The workout contained no weights or reps and was dropped.
    Discarded,
}

/// Lifecycle of the active workout.
///
/// These operations only mutate the record. Stamping, persisting and synchronizing the
/// result is the responsibility of the caller.
impl UserRecord {
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        match &self.active_workout {
            None => SessionState::NoActiveWorkout,
            Some(workout) if workout.is_running() => SessionState::Running,
            Some(_) => SessionState::Paused,
        }
    }

    /// Replaces any existing active workout with a new, running one.
    pub fn start_workout(&mut self, now: DateTime<Utc>) -> &mut Workout {
        let mut workout = Workout::new(now.date_naive());
        workout.start_timer(now);
        self.active_workout.insert(workout)
    }

    /// Starts a workout named after the template, containing its exercises.
    ///
    /// Returns `None` if no template with the given ID exists.
    pub fn start_workout_from_template(
        &mut self,
        template_id: TemplateID,
        now: DateTime<Utc>,
    ) -> Option<&mut Workout> {
        let template = self.templates.iter().find(|t| t.id == template_id)?.clone();

        let mut workout = Workout::new(now.date_naive());
        workout.name = template.name.to_string();
        for exercise in template.exercises {
            add_exercise(
                &mut workout,
                &mut self.exercise_library,
                &self.exercise_history,
                exercise.name,
            );
        }
        workout.start_timer(now);

        Some(self.active_workout.insert(workout))
    }

    /// Adds an exercise to the active workout and registers its name in the library.
    ///
    /// Returns `Ok(false)` if there is no active workout. Blank names are rejected
    /// without modifying the record.
    pub fn add_exercise_to_workout(&mut self, name: &str) -> Result<bool, NameError> {
        let name = Name::new(name)?;
        let Some(workout) = self.active_workout.as_mut() else {
            return Ok(false);
        };
        add_exercise(
            workout,
            &mut self.exercise_library,
            &self.exercise_history,
            name,
        );
        Ok(true)
    }

    /// Returns false if there is no running active workout.
    pub fn pause_active_workout(&mut self, now: DateTime<Utc>) -> bool {
        match self.active_workout.as_mut() {
            Some(workout) if workout.is_running() => {
                workout.pause_timer(now);
                true
            }
            _ => false,
        }
    }

    /// Returns false if there is no paused active workout.
    pub fn resume_active_workout(&mut self, now: DateTime<Utc>) -> bool {
        match self.active_workout.as_mut() {
            Some(workout) if !workout.is_running() => {
                workout.resume_timer(now);
                true
            }
            _ => false,
        }
    }

    /// Ends the active workout.
    ///
    /// A workout with data is appended to the history and overwrites the exercise history
    /// of each of its exercises. A workout without data is discarded. Returns `None` if
    /// there is no active workout.
    pub fn finish_workout(&mut self, now: DateTime<Utc>) -> Option<FinishOutcome> {
        let mut workout = self.active_workout.take()?;
        workout.pause_timer(now);

        if !workout.has_data() {
            return Some(FinishOutcome::Discarded);
        }

        if workout.name.trim().is_empty() {
            workout.name = UNTITLED_WORKOUT.to_string();
        }

        for exercise in &workout.exercises {
            self.exercise_history.insert(
                exercise.name.clone(),
                ExerciseHistory {
                    last_sets: exercise
                        .sets
                        .iter()
                        .map(|s| LastSet {
                            weight: s.weight.clone(),
                            reps: s.reps.clone(),
                        })
                        .collect(),
                    last_performed: workout.date,
                },
            );
        }

        let id = workout.id;
        self.workouts.push(workout);
        Some(FinishOutcome::Saved(id))
    }

    /// Stores the exercise selection of the active workout as a template.
    ///
    /// Returns `None` if there is no active workout.
    pub fn save_template(&mut self, name: Option<&str>) -> Option<TemplateID> {
        let template = Template::from_workout(self.active_workout.as_ref()?, name);
        let id = template.id;
        self.templates.push(template);
        Some(id)
    }

    /// Returns false if no template with the given ID exists.
    pub fn delete_template(&mut self, template_id: TemplateID) -> bool {
        let len = self.templates.len();
        self.templates.retain(|t| t.id != template_id);
        self.templates.len() != len
    }
}

fn add_exercise(
    workout: &mut Workout,
    library: &mut ExerciseLibrary,
    history: &BTreeMap<Name, ExerciseHistory>,
    name: Name,
) {
    library.insert(&name);
    let previous = history.get(&name);
    workout.add_exercise(name, previous);
}
