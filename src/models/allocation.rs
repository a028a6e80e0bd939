//! Sections, faculty and allocations.
//!
//! An allocation binds "who teaches what to whom" before any time or room is
//! chosen. The solver expands every allocation into one [`Lecture`] per
//! credit; a lecture is the smallest placeable unit.

use serde::{Deserialize, Serialize};

/// A student cohort sharing one timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Cohort label (e.g., "A", "K").
    pub id: String,
    /// Enrolled head-count; rooms must seat at least this many.
    #[serde(default)]
    pub strength: u32,
}

impl Section {
    /// Creates a section with no strength requirement.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            strength: 0,
        }
    }

    /// Sets the enrolled head-count.
    pub fn with_strength(mut self, strength: u32) -> Self {
        self.strength = strength;
        self
    }
}

/// A faculty member, as listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    /// Unique faculty identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl Faculty {
    /// Creates a directory entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Binding of a subject to a faculty member for one section.
///
/// At most one allocation may exist per (subject, section).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub subject_id: String,
    pub faculty_id: String,
    pub section_id: String,
}

impl Allocation {
    /// Creates an allocation.
    pub fn new(
        subject_id: impl Into<String>,
        faculty_id: impl Into<String>,
        section_id: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            faculty_id: faculty_id.into(),
            section_id: section_id.into(),
        }
    }

    /// Expands the allocation into `credits` lecture variables.
    pub fn lectures(&self, credits: u32) -> impl Iterator<Item = Lecture> + '_ {
        (0..credits).map(move |occurrence| Lecture {
            subject_id: self.subject_id.clone(),
            faculty_id: self.faculty_id.clone(),
            section_id: self.section_id.clone(),
            occurrence,
        })
    }
}

/// One weekly meeting of an allocation, not yet placed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lecture {
    pub section_id: String,
    pub subject_id: String,
    pub faculty_id: String,
    /// Zero-based index among the allocation's weekly meetings.
    pub occurrence: u32,
}

impl Lecture {
    /// Stable identifier used as the schedule entry ID.
    pub fn entry_id(&self) -> String {
        format!("{}:{}:{}", self.section_id, self.subject_id, self.occurrence)
    }
}
