//! Subject model.
//!
//! A subject is a course taught to one or more sections. Its credit count
//! fixes how many lectures per week every allocated section receives.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lowest accepted difficulty tier.
pub const MIN_DIFFICULTY: u8 = 1;
/// Highest accepted difficulty tier.
pub const MAX_DIFFICULTY: u8 = 5;

/// A subject (course) in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Human-readable name (e.g., "Design & Analysis of Algorithms").
    #[serde(default)]
    pub name: String,
    /// Catalog code (e.g., "DAA-302").
    #[serde(default)]
    pub code: String,
    /// Weekly contact hours; one lecture per credit.
    pub credits: u32,
    /// Difficulty tier (1 = light, 5 = heavy).
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Preferred rooms, most preferred first.
    #[serde(default)]
    pub preferred_rooms: Vec<String>,
    /// Domain-specific metadata.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_difficulty() -> u8 {
    MIN_DIFFICULTY
}

impl Subject {
    /// Creates a subject with the given weekly credit count.
    pub fn new(id: impl Into<String>, credits: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            code: String::new(),
            credits,
            difficulty: MIN_DIFFICULTY,
            preferred_rooms: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the subject name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the catalog code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the difficulty tier.
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Appends a preferred room (lower rank than those already added).
    pub fn with_preferred_room(mut self, room_id: impl Into<String>) -> Self {
        self.preferred_rooms.push(room_id.into());
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Rank of a room in the preference list (0 = most preferred).
    ///
    /// Returns `None` if the room is not preferred.
    pub fn room_preference(&self, room_id: &str) -> Option<usize> {
        self.preferred_rooms.iter().position(|r| r == room_id)
    }

    /// Whether the subject expresses any room preference.
    pub fn has_room_preference(&self) -> bool {
        !self.preferred_rooms.is_empty()
    }

    /// Whether the difficulty tier is within the accepted range.
    pub fn has_valid_difficulty(&self) -> bool {
        (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty)
    }
}
