//! Input and schedule validation.
//!
//! Two independent checks:
//!
//! - [`validate_catalog`]: structural integrity of a catalog snapshot before
//!   any search. Detects duplicate IDs, zero-credit subjects, out-of-range
//!   difficulty, empty rooms, malformed or overlapping slots, dangling
//!   references and duplicate (subject, section) allocations.
//! - [`validate_schedule`]: re-checks a finished schedule against the hard
//!   rules (no faculty, room or section double-booking; no break slots;
//!   exact weekly coverage of every allocation).
//!
//! Both collect every problem instead of stopping at the first, and both
//! report in a deterministic order so the same input always yields the same
//! verdict.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::models::{
    weekly_coverage, Catalog, ScheduleEntry, Violation, ViolationType, Weekday,
};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A subject has no weekly meetings.
    ZeroCredits,
    /// A subject's difficulty tier is outside the accepted range.
    InvalidDifficulty,
    /// A room seats nobody.
    ZeroCapacity,
    /// A time slot does not end after it starts.
    InvalidTimeSlot,
    /// Two teaching slots on the same day overlap in clock time.
    OverlappingSlots,
    /// A reference names an entity that doesn't exist.
    UnknownReference,
    /// More than one allocation for the same (subject, section).
    DuplicateAllocation,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates a catalog snapshot.
///
/// Checks:
/// 1. No duplicate room, slot, subject, section or faculty IDs
/// 2. Every subject has at least one credit and a difficulty in range
/// 3. Every room has a non-zero capacity
/// 4. Every slot ends after it starts, and no two teaching slots of a day
///    overlap
/// 5. Preferred rooms and allocation references point to existing entities
/// 6. At most one allocation per (subject, section)
///
/// Faculty IDs in allocations are not checked against the directory; the
/// directory only supplies display names.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_catalog(catalog: &Catalog) -> ValidationResult {
    let mut errors = Vec::new();

    let room_ids = collect_unique(catalog.rooms.iter().map(|r| r.id.as_str()), "room", &mut errors);
    collect_unique(
        catalog.timeslots.iter().map(|s| s.id.as_str()),
        "time slot",
        &mut errors,
    );
    let subject_ids = collect_unique(
        catalog.subjects.iter().map(|s| s.id.as_str()),
        "subject",
        &mut errors,
    );
    let section_ids = collect_unique(
        catalog.sections.iter().map(|s| s.id.as_str()),
        "section",
        &mut errors,
    );
    collect_unique(
        catalog.faculty.iter().map(|f| f.id.as_str()),
        "faculty",
        &mut errors,
    );

    for room in &catalog.rooms {
        if room.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCapacity,
                format!("Room '{}' has zero capacity", room.id),
            ));
        }
    }

    for slot in &catalog.timeslots {
        if slot.duration_minutes() == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeSlot,
                format!(
                    "Time slot '{}' ends ({}) before it starts ({})",
                    slot.id, slot.end, slot.start
                ),
            ));
        }
    }

    // Sorted by day and start, so only later slots can start inside `a`
    let teaching = catalog.teaching_slots();
    for (i, a) in teaching.iter().enumerate() {
        for b in teaching[i + 1..]
            .iter()
            .take_while(|b| b.day == a.day && b.start < a.end)
        {
            if a.overlaps(b) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OverlappingSlots,
                    format!(
                        "Time slots '{}' ({}-{}) and '{}' ({}-{}) overlap on {}",
                        a.id, a.start, a.end, b.id, b.start, b.end, a.day
                    ),
                ));
            }
        }
    }

    for subject in &catalog.subjects {
        if subject.credits == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ZeroCredits,
                format!("Subject '{}' has zero credits", subject.id),
            ));
        }
        if !subject.has_valid_difficulty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDifficulty,
                format!(
                    "Subject '{}' has difficulty {} outside 1..=5",
                    subject.id, subject.difficulty
                ),
            ));
        }
        for room in &subject.preferred_rooms {
            if !room_ids.contains(room.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Subject '{}' prefers unknown room '{}'",
                        subject.id, room
                    ),
                ));
            }
        }
    }

    let mut seen_pairs = HashSet::new();
    for alloc in &catalog.allocations {
        if !subject_ids.contains(alloc.subject_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!(
                    "Allocation for section '{}' references unknown subject '{}'",
                    alloc.section_id, alloc.subject_id
                ),
            ));
        }
        if !section_ids.contains(alloc.section_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!(
                    "Allocation of subject '{}' references unknown section '{}'",
                    alloc.subject_id, alloc.section_id
                ),
            ));
        }
        if !seen_pairs.insert((alloc.subject_id.as_str(), alloc.section_id.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateAllocation,
                format!(
                    "Subject '{}' is allocated to section '{}' more than once",
                    alloc.subject_id, alloc.section_id
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_unique<'a>(
    ids: impl Iterator<Item = &'a str>,
    label: &str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut set = HashSet::new();
    for id in ids {
        if !set.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {label} ID: {id}"),
            ));
        }
    }
    set
}

/// Checks a schedule against every hard rule.
///
/// Rules:
/// 1. No two entries share (day, slot, faculty)
/// 2. No two entries share (day, slot, room)
/// 3. No two entries share (day, slot, section)
/// 4. No entry sits in a break slot
/// 5. Every allocation meets exactly `credits` times per week, and no
///    entry exists for an unallocated (section, subject)
///
/// Entries referencing slots, rooms or subjects missing from `catalog`, or
/// whose day or faculty disagree with it, are reported as
/// [`ViolationType::UnknownReference`].
///
/// Returns an empty list if the schedule is valid. The order of the list
/// depends only on the entries' content.
pub fn validate_schedule(catalog: &Catalog, entries: &[ScheduleEntry]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut sorted: Vec<&ScheduleEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    for e in &sorted {
        match catalog.timeslot(&e.timeslot_id) {
            None => violations.push(Violation::unknown_reference(
                &e.id,
                format!("entry '{}' uses unknown time slot '{}'", e.id, e.timeslot_id),
            )),
            Some(slot) => {
                if slot.day != e.day {
                    violations.push(Violation::unknown_reference(
                        &e.id,
                        format!(
                            "entry '{}' is tagged {} but slot '{}' is on {}",
                            e.id, e.day, slot.id, slot.day
                        ),
                    ));
                }
                if slot.is_break {
                    violations.push(Violation::break_slot(
                        &e.id,
                        format!(
                            "entry '{}' ({} / {}) is placed in break slot '{}'",
                            e.id, e.section_id, e.subject_id, slot.id
                        ),
                    ));
                }
            }
        }
        if catalog.room(&e.room_id).is_none() {
            violations.push(Violation::unknown_reference(
                &e.id,
                format!("entry '{}' uses unknown room '{}'", e.id, e.room_id),
            ));
        }
        match catalog.allocation_for(&e.subject_id, &e.section_id) {
            Some(alloc) if alloc.faculty_id != e.faculty_id => {
                violations.push(Violation::unknown_reference(
                    &e.id,
                    format!(
                        "entry '{}' is taught by '{}' but '{}' is allocated",
                        e.id, e.faculty_id, alloc.faculty_id
                    ),
                ));
            }
            _ => {}
        }
    }

    check_clashes(&sorted, ViolationType::FacultyClash, "faculty", |e| &e.faculty_id, &mut violations);
    check_clashes(&sorted, ViolationType::RoomClash, "room", |e| &e.room_id, &mut violations);
    check_clashes(&sorted, ViolationType::SectionClash, "section", |e| &e.section_id, &mut violations);

    check_coverage(catalog, &sorted, &mut violations);

    violations
}

fn check_clashes<'a>(
    entries: &[&'a ScheduleEntry],
    violation_type: ViolationType,
    label: &str,
    key: impl Fn(&'a ScheduleEntry) -> &'a String,
    violations: &mut Vec<Violation>,
) {
    // BTreeMap keeps the report order stable
    let mut groups: BTreeMap<(Weekday, &str, &str), Vec<&str>> = BTreeMap::new();
    for &e in entries {
        let (day, slot) = e.slot_key();
        groups
            .entry((day, slot, key(e).as_str()))
            .or_default()
            .push(e.id.as_str());
    }
    for ((day, slot, holder), ids) in groups {
        if ids.len() > 1 {
            violations.push(Violation::clash(
                violation_type.clone(),
                holder,
                format!(
                    "{label} '{holder}' is double-booked on {day} slot '{slot}' by entries {}",
                    ids.join(", ")
                ),
            ));
        }
    }
}

fn check_coverage(catalog: &Catalog, entries: &[&ScheduleEntry], violations: &mut Vec<Violation>) {
    let counts = weekly_coverage(entries.iter().copied());

    let mut allocations: Vec<_> = catalog.allocations.iter().collect();
    allocations.sort_by(|a, b| {
        (&a.section_id, &a.subject_id).cmp(&(&b.section_id, &b.subject_id))
    });

    let mut expected_pairs = HashSet::new();
    for alloc in allocations {
        let pair = (alloc.section_id.as_str(), alloc.subject_id.as_str());
        expected_pairs.insert(pair);
        let Some(subject) = catalog.subject(&alloc.subject_id) else {
            violations.push(Violation::unknown_reference(
                format!("{}/{}", alloc.section_id, alloc.subject_id),
                format!("allocation references unknown subject '{}'", alloc.subject_id),
            ));
            continue;
        };
        let actual = counts.get(&pair).copied().unwrap_or(0);
        if actual != subject.credits {
            violations.push(Violation::coverage(
                format!("{}/{}", alloc.section_id, alloc.subject_id),
                format!(
                    "section '{}' subject '{}' meets {} time(s) per week, {} required",
                    alloc.section_id, alloc.subject_id, actual, subject.credits
                ),
            ));
        }
    }

    let mut extras: Vec<_> = counts
        .iter()
        .filter(|(pair, _)| !expected_pairs.contains(*pair))
        .collect();
    extras.sort();
    for ((section, subject), n) in extras {
        violations.push(Violation::coverage(
            format!("{section}/{subject}"),
            format!("section '{section}' subject '{subject}' has {n} entries but no allocation"),
        ));
    }
}
