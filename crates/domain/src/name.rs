use derive_more::{AsRef, Display};

/// A trimmed, non-empty name of an exercise or template.
///
/// Names are compared case-sensitively.
#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    pub fn new(name: &str) -> Result<Self, NameError> {
        let trimmed_name = name.trim();

        if trimmed_name.is_empty() {
            return Err(NameError::Empty);
        }

        Ok(Name(trimmed_name.to_string()))
    }

    /// For names known to be trimmed and non-empty.
    pub(crate) fn from_trusted(name: &str) -> Self {
        Name(name.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Name must not be empty")]
    Empty,
}
