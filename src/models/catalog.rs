//! Resource catalog for one term.
//!
//! The catalog bundles everything the solver reads: rooms, the weekly slot
//! grid, subjects, sections, the faculty directory and the allocation table.
//! It is owned by the administration module; the engine only ever works on an
//! owned snapshot of it.

use serde::{Deserialize, Serialize};

use super::{Allocation, Faculty, Room, Section, Subject, TimeSlot};

/// Reference data and allocations for one term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub timeslots: Vec<TimeSlot>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub faculty: Vec<Faculty>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the catalog to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a time slot.
    pub fn with_timeslot(mut self, slot: TimeSlot) -> Self {
        self.timeslots.push(slot);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Adds a faculty directory entry.
    pub fn with_faculty(mut self, faculty: Faculty) -> Self {
        self.faculty.push(faculty);
        self
    }

    /// Adds an allocation.
    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocations.push(allocation);
        self
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn timeslot(&self, id: &str) -> Option<&TimeSlot> {
        self.timeslots.iter().find(|s| s.id == id)
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Display name of a faculty member; the ID if not in the directory.
    pub fn faculty_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.faculty
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(id)
    }

    /// The allocation for a (subject, section) pair, if any.
    pub fn allocation_for(&self, subject_id: &str, section_id: &str) -> Option<&Allocation> {
        self.allocations
            .iter()
            .find(|a| a.subject_id == subject_id && a.section_id == section_id)
    }

    /// All slots, breaks included, ordered by day, start time, then ID.
    pub fn ordered_timeslots(&self) -> Vec<&TimeSlot> {
        let mut slots: Vec<&TimeSlot> = self.timeslots.iter().collect();
        slots.sort_by(|a, b| (a.day, a.start, &a.id).cmp(&(b.day, b.start, &b.id)));
        slots
    }

    /// Non-break slots ordered by day, then start time.
    pub fn teaching_slots(&self) -> Vec<&TimeSlot> {
        let mut slots = self.ordered_timeslots();
        slots.retain(|s| s.is_teaching());
        slots
    }

    /// Total lectures demanded by all allocations (unknown subjects count 0).
    pub fn lecture_demand(&self) -> u64 {
        self.allocations
            .iter()
            .filter_map(|a| self.subject(&a.subject_id))
            .map(|s| u64::from(s.credits))
            .sum()
    }
}
