//! Two-phase publish: validate the Draft, then commit it.
//!
//! Validation re-checks the Draft against the catalog snapshot it was
//! generated from: every hard rule plus exact weekly coverage. Only a Draft
//! with no violations is copied into the Published slot, with every entry
//! re-tagged `Published`. A rejected publish leaves Published untouched.

use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::models::{ScheduleBatch, Violation};
use crate::store::{ScheduleStore, WriterGuard};
use crate::validation::validate_schedule;

/// Result of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// New publish version of the term.
    pub version: u64,
    /// Entries now published.
    pub entry_count: usize,
    /// Generation of the Draft that was published.
    pub generation: u64,
}

/// Violations of a (possibly missing) Draft.
///
/// A missing Draft is itself a violation. The list is deterministic for a
/// given Draft.
pub fn check_draft(term: &str, draft: Option<&ScheduleBatch>) -> Vec<Violation> {
    match draft {
        None => vec![Violation::missing_draft(term)],
        Some(batch) => validate_schedule(batch.catalog(), batch.entries()),
    }
}

/// Dry run: the violations publishing `term` right now would report.
pub fn validate_draft(store: &ScheduleStore, term: &str) -> Vec<Violation> {
    check_draft(term, store.draft(term).as_deref())
}

/// Publishes the locked term's Draft.
///
/// Fails with `PublishRejected` listing every violation if the Draft is
/// missing or invalid.
pub fn publish(guard: &WriterGuard) -> Result<PublishReport> {
    let term = guard.term();
    let draft = guard.draft();
    let violations = check_draft(term, draft.as_deref());

    let Some(draft) = draft.filter(|_| violations.is_empty()) else {
        warn!(term, violations = violations.len(), "publish rejected");
        return Err(EngineError::PublishRejected { violations });
    };

    let entry_count = draft.entry_count();
    let version = guard.commit_publish(draft.to_published());
    info!(term, version, entries = entry_count, generation = draft.generation, "published");
    Ok(PublishReport {
        version,
        entry_count,
        generation: draft.generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::models::{
        Allocation, Catalog, ClockTime, Lifecycle, Room, ScheduleEntry, Section, Subject, TimeSlot,
        ViolationType, Weekday,
    };
    use std::sync::Arc;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::new()
                .with_room(Room::new("R1", 60))
                .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:00"), t("10:00")))
                .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, t("10:00"), t("11:00")))
                .with_subject(Subject::new("MATH", 2))
                .with_section(Section::new("A"))
                .with_allocation(Allocation::new("MATH", "F1", "A")),
        )
    }

    fn entry(occ: u32, slot: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: format!("A:MATH:{occ}"),
            section_id: "A".into(),
            subject_id: "MATH".into(),
            faculty_id: "F1".into(),
            room_id: "R1".into(),
            timeslot_id: slot.into(),
            day: Weekday::Monday,
            lifecycle: Lifecycle::Draft,
        }
    }

    fn valid_batch() -> ScheduleBatch {
        ScheduleBatch::draft(vec![entry(0, "MON-1"), entry(1, "MON-2")], catalog())
    }

    #[test]
    fn test_missing_draft_is_violation() {
        let store = ScheduleStore::new();
        let violations = validate_draft(&store, "T1");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::MissingDraft);

        let guard = store.try_acquire_writer("T1", "publish").unwrap();
        let err = publish(&guard).unwrap_err();
        assert_eq!(err.kind(), FailureKind::PublishRejected);
    }

    #[test]
    fn test_publish_valid_draft() {
        let store = ScheduleStore::new();
        let guard = store.try_acquire_writer("T1", "publish").unwrap();
        guard.store_draft(valid_batch());
        let report = publish(&guard).unwrap();
        assert_eq!(report.version, 1);
        assert_eq!(report.entry_count, 2);
        assert_eq!(report.generation, 1);

        let slot = store.published("T1").unwrap();
        assert_eq!(slot.batch.lifecycle, Lifecycle::Published);
        assert!(slot.batch.entries().iter().all(|e| e.lifecycle == Lifecycle::Published));
        // Draft stays a draft
        assert_eq!(store.draft("T1").unwrap().lifecycle, Lifecycle::Draft);
        assert_eq!(publish(&guard).unwrap().version, 2);
    }

    #[test]
    fn test_incomplete_draft_rejected_published_unchanged() {
        let store = ScheduleStore::new();
        let guard = store.try_acquire_writer("T1", "publish").unwrap();
        guard.store_draft(valid_batch());
        publish(&guard).unwrap();

        guard.store_draft(ScheduleBatch::draft(vec![entry(0, "MON-1")], catalog()));
        match publish(&guard).unwrap_err() {
            EngineError::PublishRejected { violations } => {
                assert!(violations
                    .iter()
                    .any(|v| v.violation_type == ViolationType::CoverageMismatch));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.published_version("T1"), 1);
        assert_eq!(store.published("T1").unwrap().batch.entry_count(), 2);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let store = ScheduleStore::new();
        let guard = store.try_acquire_writer("T1", "generate").unwrap();
        guard.store_draft(ScheduleBatch::draft(
            vec![entry(0, "MON-1"), entry(1, "MON-1")],
            catalog(),
        ));
        let first = validate_draft(&store, "T1");
        let second = validate_draft(&store, "T1");
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
