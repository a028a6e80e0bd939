//! Schedule (solution) model.
//!
//! A schedule is a set of entries placing every lecture of every allocation
//! into a (day, time slot, room). Schedules are stored as immutable,
//! generation-tagged batches: a new generation run produces a new batch and
//! never edits an existing one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Catalog, Weekday};

/// Lifecycle tag of a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Regenerable candidate under administrator review.
    Draft,
    /// Authoritative timetable visible to all consumers.
    Published,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Draft => f.write_str("draft"),
            Lifecycle::Published => f.write_str("published"),
        }
    }
}

/// A placed lecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Entry identifier, unique within a batch.
    pub id: String,
    pub section_id: String,
    pub subject_id: String,
    pub faculty_id: String,
    pub room_id: String,
    pub timeslot_id: String,
    /// Day of the slot (denormalized for filtering).
    pub day: Weekday,
    pub lifecycle: Lifecycle,
}

impl ScheduleEntry {
    /// Key shared by entries that meet at the same time.
    #[inline]
    pub fn slot_key(&self) -> (Weekday, &str) {
        (self.day, self.timeslot_id.as_str())
    }
}

/// An immutable batch of entries produced by one generation run.
///
/// The batch keeps the catalog snapshot it was generated from, so later
/// catalog edits never change how an existing batch reads.
#[derive(Debug, Clone)]
pub struct ScheduleBatch {
    /// Per-term generation number assigned by the store.
    pub generation: u64,
    /// Lifecycle of every entry in the batch.
    pub lifecycle: Lifecycle,
    entries: Vec<ScheduleEntry>,
    catalog: Arc<Catalog>,
}

impl ScheduleBatch {
    /// Creates a draft batch. Entries are re-tagged `Draft`.
    pub fn draft(mut entries: Vec<ScheduleEntry>, catalog: Arc<Catalog>) -> Self {
        for e in &mut entries {
            e.lifecycle = Lifecycle::Draft;
        }
        Self {
            generation: 0,
            lifecycle: Lifecycle::Draft,
            entries,
            catalog,
        }
    }

    /// Sets the generation number.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Full copy of this batch with every entry tagged `Published`.
    pub fn to_published(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .cloned()
            .map(|mut e| {
                e.lifecycle = Lifecycle::Published;
                e
            })
            .collect();
        Self {
            generation: self.generation,
            lifecycle: Lifecycle::Published,
            entries,
            catalog: Arc::clone(&self.catalog),
        }
    }

    /// All entries.
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Catalog snapshot this batch was generated from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Weekly meeting count per (section, subject).
pub fn weekly_coverage<'a>(
    entries: impl IntoIterator<Item = &'a ScheduleEntry>,
) -> HashMap<(&'a str, &'a str), u32> {
    let mut counts: HashMap<(&str, &str), u32> = HashMap::new();
    for e in entries {
        *counts
            .entry((e.section_id.as_str(), e.subject_id.as_str()))
            .or_insert(0) += 1;
    }
    counts
}

/// A violated rule found while checking a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (faculty, room, section, entry or term).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationType {
    /// A faculty member teaches twice in one slot.
    FacultyClash,
    /// A room is booked twice in one slot.
    RoomClash,
    /// A section attends two lectures in one slot.
    SectionClash,
    /// A lecture is placed in a break slot.
    BreakSlot,
    /// A (section, subject) pair has the wrong weekly meeting count.
    CoverageMismatch,
    /// An entry names a slot, room, subject or section the catalog lacks,
    /// or disagrees with the catalog about day or faculty.
    UnknownReference,
    /// There is no draft to publish.
    MissingDraft,
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationType::FacultyClash => "faculty-clash",
            ViolationType::RoomClash => "room-clash",
            ViolationType::SectionClash => "section-clash",
            ViolationType::BreakSlot => "break-slot",
            ViolationType::CoverageMismatch => "coverage-mismatch",
            ViolationType::UnknownReference => "unknown-reference",
            ViolationType::MissingDraft => "missing-draft",
        };
        f.write_str(s)
    }
}

impl Violation {
    fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        severity: i32,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
            severity,
        }
    }

    /// Creates a double-booking violation for a faculty, room or section.
    pub fn clash(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(violation_type, entity_id, message, 95)
    }

    /// Creates a break-slot violation.
    pub fn break_slot(entry_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::BreakSlot, entry_id, message, 95)
    }

    /// Creates a coverage violation.
    pub fn coverage(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::CoverageMismatch, entity_id, message, 90)
    }

    /// Creates an unknown-reference violation.
    pub fn unknown_reference(entry_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ViolationType::UnknownReference, entry_id, message, 80)
    }

    /// Creates a missing-draft violation.
    pub fn missing_draft(term: impl Into<String>) -> Self {
        let term = term.into();
        let message = format!("term '{term}' has no draft schedule");
        Self::new(ViolationType::MissingDraft, term, message, 100)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.violation_type, self.entity_id, self.message)
    }
}
