//! Room model.
//!
//! Rooms are the physical spaces a lecture occupies. Each room has a
//! seating capacity that must cover the strength of the section taught in it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A room that lectures can be placed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name (e.g., "101", "Lab A").
    #[serde(default)]
    pub name: String,
    /// Number of seats.
    pub capacity: u32,
    /// Domain-specific metadata (building, floor, equipment).
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Room {
    /// Creates a room with the given capacity.
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity,
            attributes: HashMap::new(),
        }
    }

    /// Sets the room name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Display name, falling back to the ID when no name is set.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Whether the room seats a section of the given strength.
    #[inline]
    pub fn fits(&self, strength: u32) -> bool {
        self.capacity >= strength
    }
}
