//! Generate, publish and query timetables per term.
//!
//! [`TimetableEngine`] wires a [`CatalogSource`], a [`Solver`] and a
//! [`ScheduleStore`] together:
//!
//! - `generate` snapshots the catalog, takes the term's writer lock, runs
//!   the solver and replaces the Draft only on success. A term the source
//!   does not know fails before the store sees it.
//! - `publish` takes the same lock and copies a valid Draft into Published.
//!   A term that was never generated is rejected without touching the store.
//! - `query` never takes the writer lock.
//!
//! Failed operations leave both Draft and Published exactly as they were.

use std::sync::Arc;

use tracing::{info, info_span, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{ClockTime, ScheduleBatch, Violation, Weekday};
use crate::publish::{self, PublishReport};
use crate::query::{QueryFilter, QueryService, ScheduleRow};
use crate::scheduler::{CancelToken, ScheduleKpi, SearchStats, Solver};
use crate::source::CatalogSource;
use crate::store::ScheduleStore;

/// Result of a successful generation run.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Generation number of the new Draft.
    pub generation: u64,
    pub entry_count: usize,
    /// Soft-objective report of the new Draft.
    pub kpi: ScheduleKpi,
    pub stats: SearchStats,
}

/// Timetable engine for all terms of one institution.
///
/// # Example
///
/// ```
/// use u_timetable::{QueryFilter, TimetableEngine};
/// use u_timetable::models::{Allocation, Catalog, ClockTime, Room, Section, Subject, TimeSlot, Weekday};
/// use u_timetable::source::InMemoryCatalog;
///
/// let at = |s: &str| -> ClockTime { s.parse().unwrap() };
/// let catalog = Catalog::new()
///     .with_room(Room::new("R1", 60))
///     .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, at("09:00"), at("10:00")))
///     .with_subject(Subject::new("MATH", 1))
///     .with_section(Section::new("A"))
///     .with_allocation(Allocation::new("MATH", "F1", "A"));
///
/// let engine = TimetableEngine::new(InMemoryCatalog::new().with_term("2024-odd", catalog));
/// engine.generate("2024-odd").unwrap();
/// let report = engine.publish("2024-odd").unwrap();
/// assert_eq!(report.version, 1);
///
/// let rows = engine.query("2024-odd", &QueryFilter::published().with_section("A"));
/// assert_eq!(rows.len(), 1);
/// ```
#[derive(Debug)]
pub struct TimetableEngine<C> {
    source: C,
    solver: Solver,
    store: Arc<ScheduleStore>,
    queries: QueryService,
}

impl<C: CatalogSource> TimetableEngine<C> {
    /// Creates an engine with the default configuration.
    pub fn new(source: C) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(source: C, config: EngineConfig) -> Self {
        let store = Arc::new(ScheduleStore::new());
        Self {
            source,
            solver: Solver::new(config),
            queries: QueryService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Uses an existing store instead of a fresh one.
    pub fn with_store(mut self, store: Arc<ScheduleStore>) -> Self {
        self.queries = QueryService::new(Arc::clone(&store));
        self.store = store;
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.solver.config()
    }

    /// The catalog source.
    pub fn source(&self) -> &C {
        &self.source
    }

    /// The schedule store.
    pub fn store(&self) -> &Arc<ScheduleStore> {
        &self.store
    }

    /// Generates a new Draft for `term`.
    pub fn generate(&self, term: &str) -> Result<GenerateReport> {
        self.generate_with_cancel(term, &CancelToken::new())
    }

    /// Generates a new Draft for `term`, stopping early if `cancel` fires.
    pub fn generate_with_cancel(&self, term: &str, cancel: &CancelToken) -> Result<GenerateReport> {
        let span = info_span!("timetable.generate", term = %term);
        let _enter = span.enter();

        let catalog = Arc::new(self.source.snapshot(term)?);
        let guard = self.store.try_acquire_writer(term, "generate")?;

        let outcome = match self.solver.solve(&catalog, cancel) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "generation failed");
                return Err(err);
            }
        };

        let kpi = ScheduleKpi::calculate(
            &catalog,
            &outcome.entries,
            self.config().heavy_difficulty,
        )
        .with_search(outcome.stats);
        let entry_count = outcome.entries.len();
        let generation = guard.store_draft(ScheduleBatch::draft(outcome.entries, catalog));

        info!(
            generation,
            entries = entry_count,
            preferred_room_rate = kpi.preferred_room_rate,
            heavy_clusters = kpi.heavy_clusters,
            backtracks = outcome.stats.backtracks,
            "draft stored"
        );
        Ok(GenerateReport {
            generation,
            entry_count,
            kpi,
            stats: outcome.stats,
        })
    }

    /// Publishes the current Draft of `term`.
    pub fn publish(&self, term: &str) -> Result<PublishReport> {
        if !self.store.contains_term(term) {
            warn!(term, "publish rejected: term never generated");
            return Err(EngineError::PublishRejected {
                violations: publish::check_draft(term, None),
            });
        }
        let guard = self.store.try_acquire_writer(term, "publish")?;
        publish::publish(&guard)
    }

    /// Violations a publish of `term` would report now, without committing.
    pub fn validate_draft(&self, term: &str) -> Vec<Violation> {
        publish::validate_draft(&self.store, term)
    }

    /// Rows of `term` matching `filter`.
    pub fn query(&self, term: &str, filter: &QueryFilter) -> Vec<ScheduleRow> {
        self.queries.query(term, filter)
    }

    /// The published lecture a section is attending at `day` / `at`.
    pub fn in_session(
        &self,
        term: &str,
        section: &str,
        day: Weekday,
        at: ClockTime,
    ) -> Option<ScheduleRow> {
        self.queries.in_session(term, section, day, at)
    }

    /// Current publish version of `term` (0 if never published).
    pub fn published_version(&self, term: &str) -> u64 {
        self.store.published_version(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::models::{
        Allocation, Catalog, Faculty, Lifecycle, Room, ScheduleEntry, Section, Subject, TimeSlot,
        ViolationType,
    };
    use crate::source::InMemoryCatalog;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    const TERM: &str = "2024-odd";

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    /// One section, credits 3 + 2, one room, five teaching slots.
    fn five_slot_catalog() -> Catalog {
        Catalog::new()
            .with_room(Room::new("R101", 60).with_name("Room 101"))
            .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:30"), t("10:30")))
            .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, t("10:30"), t("11:30")))
            .with_timeslot(TimeSlot::break_slot("MON-L", Weekday::Monday, t("11:30"), t("12:30")))
            .with_timeslot(TimeSlot::new("MON-3", Weekday::Monday, t("12:30"), t("13:30")))
            .with_timeslot(TimeSlot::new("TUE-1", Weekday::Tuesday, t("09:30"), t("10:30")))
            .with_timeslot(TimeSlot::new("TUE-2", Weekday::Tuesday, t("10:30"), t("11:30")))
            .with_subject(Subject::new("DAA", 3).with_code("CS302").with_difficulty(3))
            .with_subject(Subject::new("ENG", 2).with_code("HS101"))
            .with_section(Section::new("A").with_strength(50))
            .with_faculty(Faculty::new("F1", "Dr. Rao"))
            .with_faculty(Faculty::new("F2", "Ms. Iyer"))
            .with_allocation(Allocation::new("DAA", "F1", "A"))
            .with_allocation(Allocation::new("ENG", "F2", "A"))
    }

    /// Two sections needing faculty F7 with one teaching slot.
    fn shared_faculty_catalog() -> Catalog {
        Catalog::new()
            .with_room(Room::new("R1", 60))
            .with_room(Room::new("R2", 60))
            .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:30"), t("10:30")))
            .with_subject(Subject::new("DAA", 1))
            .with_section(Section::new("A"))
            .with_section(Section::new("B"))
            .with_allocation(Allocation::new("DAA", "F7", "A"))
            .with_allocation(Allocation::new("DAA", "F7", "B"))
    }

    fn engine(catalog: Catalog) -> TimetableEngine<Arc<InMemoryCatalog>> {
        init_tracing();
        TimetableEngine::new(Arc::new(InMemoryCatalog::new().with_term(TERM, catalog)))
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TimetableEngine<InMemoryCatalog>>();
        assert_send_sync::<TimetableEngine<Arc<InMemoryCatalog>>>();
    }

    #[test]
    fn test_single_section_scenario() {
        let engine = engine(five_slot_catalog());
        let report = engine.generate(TERM).unwrap();
        assert_eq!(report.entry_count, 5);
        assert_eq!(report.generation, 1);

        let rows = engine.query(TERM, &QueryFilter::draft());
        assert_eq!(rows.len(), 5);
        let slots: HashSet<_> = rows.iter().map(|r| r.timeslot_id.as_str()).collect();
        assert_eq!(slots.len(), 5);
        assert!(!slots.contains("MON-L"));

        let mut per_subject: HashMap<&str, u32> = HashMap::new();
        for r in &rows {
            *per_subject.entry(r.subject_id.as_str()).or_insert(0) += 1;
        }
        assert_eq!(per_subject["DAA"], 3);
        assert_eq!(per_subject["ENG"], 2);
        assert!(engine.validate_draft(TERM).is_empty());
    }

    #[test]
    fn test_shared_faculty_scenario() {
        let engine = engine(shared_faculty_catalog());
        match engine.generate(TERM).unwrap_err() {
            EngineError::PlacementFailure {
                section,
                subject,
                faculty,
                conflicting_sections,
                ..
            } => {
                assert_eq!(subject, "DAA");
                assert_eq!(faculty.as_deref(), Some("F7"));
                let mut named = conflicting_sections.clone();
                named.push(section);
                named.sort();
                assert_eq!(named, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(engine.store().draft(TERM).is_none());
    }

    #[test]
    fn test_publish_then_query_published() {
        let engine = engine(five_slot_catalog());
        engine.generate(TERM).unwrap();
        assert!(engine.query(TERM, &QueryFilter::published()).is_empty());

        let report = engine.publish(TERM).unwrap();
        assert_eq!(report.version, 1);
        assert_eq!(report.entry_count, 5);
        assert_eq!(engine.published_version(TERM), 1);

        let rows = engine.query(TERM, &QueryFilter::published());
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.lifecycle == Lifecycle::Published));
        let daa = rows.iter().find(|r| r.subject_id == "DAA").unwrap();
        assert_eq!(daa.subject_code, "CS302");
        assert_eq!(daa.faculty_name, "Dr. Rao");
        assert_eq!(daa.room_name, "Room 101");

        // Rows come back ordered by day then start time
        let keys: Vec<_> = rows.iter().map(|r| (r.day, r.start)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        engine.generate(TERM).unwrap();
        assert_eq!(engine.publish(TERM).unwrap().version, 2);
    }

    #[test]
    fn test_publish_without_draft_rejected() {
        let engine = engine(five_slot_catalog());
        match engine.publish(TERM).unwrap_err() {
            EngineError::PublishRejected { violations } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].violation_type, ViolationType::MissingDraft);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.published_version(TERM), 0);
    }

    #[test]
    fn test_invalid_draft_leaves_published_unchanged() {
        let engine = engine(five_slot_catalog());
        engine.generate(TERM).unwrap();
        engine.publish(TERM).unwrap();
        let before = engine.query(TERM, &QueryFilter::published());

        // Draft with one lecture on the lunch break and the rest missing
        let catalog = Arc::new(five_slot_catalog());
        let bad = ScheduleBatch::draft(
            vec![ScheduleEntry {
                id: "A:DAA:0".into(),
                section_id: "A".into(),
                subject_id: "DAA".into(),
                faculty_id: "F1".into(),
                room_id: "R101".into(),
                timeslot_id: "MON-L".into(),
                day: Weekday::Monday,
                lifecycle: Lifecycle::Draft,
            }],
            catalog,
        );
        {
            let guard = engine.store().try_acquire_writer(TERM, "test").unwrap();
            guard.store_draft(bad);
        }

        let err = engine.publish(TERM).unwrap_err();
        assert_eq!(err.kind(), FailureKind::PublishRejected);
        assert_eq!(engine.published_version(TERM), 1);
        assert_eq!(engine.query(TERM, &QueryFilter::published()), before);
    }

    #[test]
    fn test_regenerate_is_valid_and_deterministic() {
        let engine = engine(five_slot_catalog());
        let first = engine.generate(TERM).unwrap();
        let draft_one = engine.query(TERM, &QueryFilter::draft());
        let second = engine.generate(TERM).unwrap();
        let draft_two = engine.query(TERM, &QueryFilter::draft());

        assert_eq!(second.generation, first.generation + 1);
        assert_eq!(draft_one, draft_two);
        let v1 = engine.validate_draft(TERM);
        let v2 = engine.validate_draft(TERM);
        assert!(v1.is_empty());
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_writer_lock_conflict() {
        let engine = engine(five_slot_catalog());
        let guard = engine.store().try_acquire_writer(TERM, "publish").unwrap();
        assert_eq!(
            engine.generate(TERM).unwrap_err().kind(),
            FailureKind::ConcurrencyConflict
        );
        assert_eq!(
            engine.publish(TERM).unwrap_err().kind(),
            FailureKind::ConcurrencyConflict
        );
        // Queries still work while the lock is held
        assert!(engine.query(TERM, &QueryFilter::draft()).is_empty());
        drop(guard);
        assert!(engine.generate(TERM).is_ok());
    }

    #[test]
    fn test_concurrent_generate_never_corrupts_draft() {
        let engine = engine(five_slot_catalog());
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| engine.generate(TERM))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert!(ok >= 1);
        for r in &results {
            if let Err(e) = r {
                assert_eq!(e.kind(), FailureKind::ConcurrencyConflict);
            }
        }
        assert!(engine.validate_draft(TERM).is_empty());
        assert_eq!(engine.store().draft(TERM).unwrap().generation, ok as u64);
    }

    #[test]
    fn test_zero_budget_times_out_and_keeps_draft() {
        let source = Arc::new(InMemoryCatalog::new().with_term(TERM, five_slot_catalog()));
        let engine = TimetableEngine::new(Arc::clone(&source));
        engine.generate(TERM).unwrap();
        let before = engine.query(TERM, &QueryFilter::draft());

        let hurried = TimetableEngine::with_config(
            source,
            EngineConfig::default().with_time_budget(Duration::ZERO),
        )
        .with_store(Arc::clone(engine.store()));
        let err = hurried.generate(TERM).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Timeout);

        assert_eq!(engine.store().draft(TERM).unwrap().generation, 1);
        assert_eq!(engine.query(TERM, &QueryFilter::draft()), before);
    }

    #[test]
    fn test_cancelled_generate_times_out() {
        let engine = engine(five_slot_catalog());
        let token = CancelToken::new();
        token.cancel();
        let err = engine.generate_with_cancel(TERM, &token).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert!(engine.store().draft(TERM).is_none());
    }

    #[test]
    fn test_catalog_edits_do_not_change_published() {
        let source = Arc::new(InMemoryCatalog::new().with_term(TERM, five_slot_catalog()));
        let engine = TimetableEngine::new(Arc::clone(&source));
        engine.generate(TERM).unwrap();
        engine.publish(TERM).unwrap();
        let before = engine.query(TERM, &QueryFilter::published());

        source
            .update(TERM, |c| {
                c.rooms[0].name = "Renamed Hall".into();
                c.faculty[0].name = "Dr. Someone Else".into();
            })
            .unwrap();
        engine.generate(TERM).unwrap();

        assert_eq!(engine.query(TERM, &QueryFilter::published()), before);
        let draft = engine.query(TERM, &QueryFilter::draft());
        assert!(draft.iter().all(|r| r.room_name == "Renamed Hall"));
    }

    #[test]
    fn test_unknown_term() {
        let engine = engine(five_slot_catalog());
        assert_eq!(
            engine.generate("1999-even").unwrap_err().kind(),
            FailureKind::CatalogUnavailable
        );
        assert!(engine.query("1999-even", &QueryFilter::published()).is_empty());
    }

    #[test]
    fn test_unknown_terms_leave_store_empty() {
        let engine = engine(five_slot_catalog());
        for typo in ["2024-od", "2O24-odd", "2024-even"] {
            assert_eq!(
                engine.generate(typo).unwrap_err().kind(),
                FailureKind::CatalogUnavailable
            );
            assert_eq!(
                engine.publish(typo).unwrap_err().kind(),
                FailureKind::PublishRejected
            );
        }
        assert_eq!(engine.store().term_count(), 0);

        engine.generate(TERM).unwrap();
        assert_eq!(engine.store().term_count(), 1);
    }

    #[test]
    fn test_in_session_reads_published() {
        let engine = engine(five_slot_catalog());
        engine.generate(TERM).unwrap();
        assert!(engine.in_session(TERM, "A", Weekday::Monday, t("09:45")).is_none());
        engine.publish(TERM).unwrap();
        let row = engine.in_session(TERM, "A", Weekday::Monday, t("09:45")).unwrap();
        assert_eq!(row.timeslot_id, "MON-1");
        assert!(engine.in_session(TERM, "A", Weekday::Monday, t("12:00")).is_none());
    }

    #[test]
    fn test_kpi_reported() {
        let engine = engine(five_slot_catalog());
        let report = engine.generate(TERM).unwrap();
        assert_eq!(report.kpi.entry_count, 5);
        assert_eq!(report.stats.lectures, 5);
        assert!(report.kpi.preferred_room_rate >= 0.0);
    }
}
