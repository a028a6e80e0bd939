//! Read-only timetable queries.
//!
//! Queries read whichever slot the store holds at call time and denormalize
//! it against the catalog snapshot stored with the batch, so later catalog
//! edits never change what a published timetable reads like.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{ClockTime, Lifecycle, ScheduleBatch, ScheduleEntry, Weekday};
use crate::store::ScheduleStore;

/// Which rows to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub section: Option<String>,
    pub faculty: Option<String>,
    pub day: Option<Weekday>,
    /// Slot to read.
    pub state: Lifecycle,
}

impl QueryFilter {
    /// All rows of the Draft slot.
    pub fn draft() -> Self {
        Self {
            section: None,
            faculty: None,
            day: None,
            state: Lifecycle::Draft,
        }
    }

    /// All rows of the Published slot.
    pub fn published() -> Self {
        Self {
            state: Lifecycle::Published,
            ..Self::draft()
        }
    }

    /// Restricts to one section.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Restricts to one faculty member.
    pub fn with_faculty(mut self, faculty: impl Into<String>) -> Self {
        self.faculty = Some(faculty.into());
        self
    }

    /// Restricts to one day.
    pub fn with_day(mut self, day: Weekday) -> Self {
        self.day = Some(day);
        self
    }

    fn matches(&self, entry: &ScheduleEntry) -> bool {
        self.section.as_ref().map_or(true, |s| *s == entry.section_id)
            && self.faculty.as_ref().map_or(true, |f| *f == entry.faculty_id)
            && self.day.map_or(true, |d| d == entry.day)
    }
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self::published()
    }
}

/// One lecture as displayed to students and staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub entry_id: String,
    pub section_id: String,
    pub subject_id: String,
    pub subject_code: String,
    pub subject_name: String,
    pub faculty_id: String,
    pub faculty_name: String,
    pub room_id: String,
    pub room_name: String,
    pub timeslot_id: String,
    pub day: Weekday,
    pub start: ClockTime,
    pub end: ClockTime,
    pub lifecycle: Lifecycle,
}

impl ScheduleRow {
    fn from_entry(batch: &ScheduleBatch, entry: &ScheduleEntry) -> Option<Self> {
        let catalog = batch.catalog();
        let slot = catalog.timeslot(&entry.timeslot_id)?;
        let (subject_code, subject_name) = match catalog.subject(&entry.subject_id) {
            Some(s) => (
                non_empty_or(&s.code, &s.id),
                non_empty_or(&s.name, &s.id),
            ),
            None => (entry.subject_id.clone(), entry.subject_id.clone()),
        };
        let room_name = catalog
            .room(&entry.room_id)
            .map_or(entry.room_id.as_str(), |r| r.display_name())
            .to_string();
        Some(Self {
            entry_id: entry.id.clone(),
            section_id: entry.section_id.clone(),
            subject_id: entry.subject_id.clone(),
            subject_code,
            subject_name,
            faculty_id: entry.faculty_id.clone(),
            faculty_name: catalog.faculty_name(&entry.faculty_id).to_string(),
            room_id: entry.room_id.clone(),
            room_name,
            timeslot_id: entry.timeslot_id.clone(),
            day: slot.day,
            start: slot.start,
            end: slot.end,
            lifecycle: entry.lifecycle,
        })
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Query access to a store.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<ScheduleStore>,
}

impl QueryService {
    /// Creates a query service over a store.
    pub fn new(store: Arc<ScheduleStore>) -> Self {
        Self { store }
    }

    /// Rows of `term` matching `filter`, ordered by day, start time,
    /// section and room. An empty slot yields an empty list.
    pub fn query(&self, term: &str, filter: &QueryFilter) -> Vec<ScheduleRow> {
        let batch = match filter.state {
            Lifecycle::Draft => self.store.draft(term),
            Lifecycle::Published => self.store.published(term).map(|p| Arc::clone(&p.batch)),
        };
        let Some(batch) = batch else {
            return Vec::new();
        };

        let mut rows: Vec<ScheduleRow> = batch
            .entries()
            .iter()
            .filter(|e| filter.matches(e))
            .filter_map(|e| ScheduleRow::from_entry(&batch, e))
            .collect();
        rows.sort_by(|a, b| {
            (a.day, a.start, &a.section_id, &a.room_id, &a.entry_id)
                .cmp(&(b.day, b.start, &b.section_id, &b.room_id, &b.entry_id))
        });
        rows
    }

    /// The published lecture a section is attending at `day` / `at`, if any.
    ///
    /// A slot covers `[start, end)`.
    pub fn in_session(
        &self,
        term: &str,
        section: &str,
        day: Weekday,
        at: ClockTime,
    ) -> Option<ScheduleRow> {
        self.query(
            term,
            &QueryFilter::published().with_section(section).with_day(day),
        )
        .into_iter()
        .find(|row| row.start <= at && at < row.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Allocation, Catalog, Faculty, Room, Section, Subject, TimeSlot};

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .with_room(Room::new("R1", 60).with_name("Room 101"))
            .with_room(Room::new("R2", 60))
            .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:30"), t("10:30")))
            .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, t("10:30"), t("11:30")))
            .with_timeslot(TimeSlot::new("TUE-1", Weekday::Tuesday, t("09:30"), t("10:30")))
            .with_subject(Subject::new("DAA", 2).with_code("CS302").with_name("Algorithms"))
            .with_subject(Subject::new("ENG", 1))
            .with_section(Section::new("A"))
            .with_section(Section::new("B"))
            .with_faculty(Faculty::new("F1", "Dr. Rao"))
            .with_allocation(Allocation::new("DAA", "F1", "A"))
            .with_allocation(Allocation::new("ENG", "F2", "B"))
    }

    fn entry(id: &str, section: &str, subject: &str, faculty: &str, room: &str, slot: &str, day: Weekday) -> ScheduleEntry {
        ScheduleEntry {
            id: id.into(),
            section_id: section.into(),
            subject_id: subject.into(),
            faculty_id: faculty.into(),
            room_id: room.into(),
            timeslot_id: slot.into(),
            day,
            lifecycle: Lifecycle::Draft,
        }
    }

    fn service() -> QueryService {
        let store = Arc::new(ScheduleStore::new());
        let batch = ScheduleBatch::draft(
            vec![
                entry("A:DAA:1", "A", "DAA", "F1", "R1", "TUE-1", Weekday::Tuesday),
                entry("B:ENG:0", "B", "ENG", "F2", "R1", "MON-1", Weekday::Monday),
                entry("A:DAA:0", "A", "DAA", "F1", "R2", "MON-1", Weekday::Monday),
            ],
            Arc::new(catalog()),
        );
        let guard = store.try_acquire_writer("T1", "generate").unwrap();
        guard.store_draft(batch.clone());
        guard.commit_publish(batch.to_published());
        drop(guard);
        QueryService::new(store)
    }

    #[test]
    fn test_rows_ordered_and_denormalized() {
        let rows = service().query("T1", &QueryFilter::published());
        let ids: Vec<_> = rows.iter().map(|r| r.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["A:DAA:0", "B:ENG:0", "A:DAA:1"]);

        let daa = &rows[0];
        assert_eq!(daa.subject_code, "CS302");
        assert_eq!(daa.subject_name, "Algorithms");
        assert_eq!(daa.faculty_name, "Dr. Rao");
        assert_eq!(daa.room_name, "R2");
        assert_eq!(daa.start, t("09:30"));
        assert_eq!(daa.lifecycle, Lifecycle::Published);

        let eng = &rows[1];
        assert_eq!(eng.subject_code, "ENG");
        assert_eq!(eng.faculty_name, "F2");
        assert_eq!(eng.room_name, "Room 101");
    }

    #[test]
    fn test_filters() {
        let svc = service();
        let rows = svc.query("T1", &QueryFilter::draft().with_section("A"));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.lifecycle == Lifecycle::Draft));

        let rows = svc.query("T1", &QueryFilter::published().with_faculty("F2"));
        assert_eq!(rows.len(), 1);

        let rows = svc.query(
            "T1",
            &QueryFilter::published().with_section("A").with_day(Weekday::Tuesday),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry_id, "A:DAA:1");
    }

    #[test]
    fn test_unknown_term_is_empty() {
        let svc = service();
        assert!(svc.query("T9", &QueryFilter::published()).is_empty());
        assert!(svc.query("T9", &QueryFilter::draft()).is_empty());
    }

    #[test]
    fn test_in_session() {
        let svc = service();
        let row = svc.in_session("T1", "A", Weekday::Monday, t("10:00")).unwrap();
        assert_eq!(row.entry_id, "A:DAA:0");
        // End is exclusive
        assert!(svc.in_session("T1", "A", Weekday::Monday, t("10:30")).is_none());
        assert!(svc.in_session("T1", "B", Weekday::Tuesday, t("10:00")).is_none());
    }
}
