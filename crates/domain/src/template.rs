use derive_more::{Deref, Display};
use uuid::Uuid;

use crate::{Name, Workout};

pub const DEFAULT_TEMPLATE_NAME: &str = "Template";

/// Exercise selection of a workout, without any set data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: TemplateID,
    pub name: Name,
    pub exercises: Vec<TemplateExercise>,
}

impl Template {
    /// Copies the exercise names of a workout.
    ///
    /// The template name falls back to the workout name and then to a default.
    #[must_use]
    pub fn from_workout(workout: &Workout, name: Option<&str>) -> Self {
        let name = name
            .and_then(|n| Name::new(n).ok())
            .or_else(|| Name::new(&workout.name).ok())
            .unwrap_or_else(|| Name::from_trusted(DEFAULT_TEMPLATE_NAME));
        Self {
            id: TemplateID::new(),
            name,
            exercises: workout
                .exercises
                .iter()
                .map(|e| TemplateExercise {
                    name: e.name.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateExercise {
    pub name: Name,
}

#[derive(Deref, Debug, Display, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TemplateID(Uuid);

impl TemplateID {
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for TemplateID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for TemplateID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}
