//! Team record flowing through the persistence pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum team name length in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum team description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 4096;

/// Validation failure for a team record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("team name cannot be empty")]
    EmptyName,

    #[error("team name too long: {0} characters (max {MAX_NAME_LEN})")]
    NameTooLong(usize),

    #[error("team description too long: {0} characters (max {MAX_DESCRIPTION_LEN})")]
    DescriptionTooLong(usize),

    #[error("search query cannot be empty")]
    EmptyQuery,
}

/// How a search query is matched against team text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Every word must appear, in any order
    #[default]
    Plain,
    /// The words must appear together, in order
    Phrase,
}

/// A team record.
///
/// `id` is zero until storage assigns one; it carries no meaning before the
/// record has been persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Team {
    /// Create an unpersisted team.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            is_deleted: false,
        }
    }

    /// Whether storage has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Check field constraints before any write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let name_len = self.name.chars().count();
        if name_len > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong(name_len));
        }

        let description_len = self.description.chars().count();
        if description_len > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::DescriptionTooLong(description_len));
        }

        Ok(())
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{} {:?}", self.id, self.name)?;
        if self.is_deleted {
            write!(f, " (deleted)")?;
        }
        Ok(())
    }
}

/// Inbound shape of a team that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl From<NewTeam> for Team {
    fn from(new: NewTeam) -> Self {
        Team::new(new.name, new.description)
    }
}
