//! Indexed view of a catalog snapshot.
//!
//! The solver works on dense indices instead of string IDs so that busy
//! checks are plain vector lookups. Building the problem never fails; it
//! assumes the catalog already passed [`validate_catalog`](crate::validation::validate_catalog)
//! and silently drops allocations whose subject or section is unknown.

use std::collections::HashMap;

use crate::models::{Catalog, Lecture, Room, Weekday};

/// A time slot, indexed.
#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub id: String,
    pub day: Weekday,
    /// Teaching slots before this one on the same day (0 = first lesson).
    /// Break slots do not count.
    pub period: u32,
    pub is_break: bool,
}

/// A subject, indexed.
#[derive(Debug, Clone)]
pub struct SubjectInfo {
    pub id: String,
    pub difficulty: u8,
    /// Whether the subject is at or above the heavy-difficulty threshold.
    pub is_heavy: bool,
    /// Preferred room indices, most preferred first.
    pub preferred_rooms: Vec<usize>,
}

/// A section, indexed.
#[derive(Debug, Clone)]
pub struct SectionInfo {
    pub id: String,
    pub strength: u32,
}

/// One placement variable.
#[derive(Debug, Clone)]
pub struct LectureVar {
    pub lecture: Lecture,
    pub section: usize,
    pub subject: usize,
    pub faculty: usize,
}

/// A (slot, room) pair a lecture could be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub slot: usize,
    pub room: usize,
}

/// A catalog snapshot in solver form.
#[derive(Debug, Clone)]
pub struct TimetableProblem {
    /// All slots, ordered by day then start time.
    pub slots: Vec<SlotInfo>,
    /// Rooms in catalog order.
    pub rooms: Vec<Room>,
    pub subjects: Vec<SubjectInfo>,
    pub sections: Vec<SectionInfo>,
    /// Interned faculty IDs.
    pub faculty: Vec<String>,
    /// Lectures ordered by section, subject, occurrence.
    pub lectures: Vec<LectureVar>,
    /// Same-day neighbouring slot indices (period - 1, period + 1).
    neighbors: Vec<Vec<usize>>,
}

impl TimetableProblem {
    /// Builds the indexed problem.
    ///
    /// `heavy_difficulty` is the tier at or above which a subject counts as
    /// heavy for the difficulty-spread cost.
    pub fn from_catalog(catalog: &Catalog, heavy_difficulty: u8) -> Self {
        let mut slots = Vec::with_capacity(catalog.timeslots.len());
        let mut period = 0u32;
        let mut current_day = None;
        for s in catalog.ordered_timeslots() {
            if current_day != Some(s.day) {
                current_day = Some(s.day);
                period = 0;
            }
            slots.push(SlotInfo {
                id: s.id.clone(),
                day: s.day,
                period,
                is_break: s.is_break,
            });
            if s.is_teaching() {
                period += 1;
            }
        }

        let neighbors = (0..slots.len())
            .map(|i| {
                let mut n = Vec::with_capacity(2);
                if i > 0 && slots[i - 1].day == slots[i].day {
                    n.push(i - 1);
                }
                if i + 1 < slots.len() && slots[i + 1].day == slots[i].day {
                    n.push(i + 1);
                }
                n
            })
            .collect();

        let rooms = catalog.rooms.clone();
        let room_index: HashMap<&str, usize> = catalog
            .rooms
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let subjects: Vec<SubjectInfo> = catalog
            .subjects
            .iter()
            .map(|s| SubjectInfo {
                id: s.id.clone(),
                difficulty: s.difficulty,
                is_heavy: s.difficulty >= heavy_difficulty,
                preferred_rooms: s
                    .preferred_rooms
                    .iter()
                    .filter_map(|r| room_index.get(r.as_str()).copied())
                    .collect(),
            })
            .collect();
        let subject_index: HashMap<&str, usize> = catalog
            .subjects
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();

        let sections: Vec<SectionInfo> = catalog
            .sections
            .iter()
            .map(|s| SectionInfo {
                id: s.id.clone(),
                strength: s.strength,
            })
            .collect();
        let section_index: HashMap<&str, usize> = catalog
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();

        let mut faculty: Vec<String> = Vec::new();
        let mut faculty_index: HashMap<String, usize> = HashMap::new();
        let mut lectures = Vec::new();
        for alloc in &catalog.allocations {
            let (Some(&subject), Some(&section)) = (
                subject_index.get(alloc.subject_id.as_str()),
                section_index.get(alloc.section_id.as_str()),
            ) else {
                continue;
            };
            let f = *faculty_index
                .entry(alloc.faculty_id.clone())
                .or_insert_with(|| {
                    faculty.push(alloc.faculty_id.clone());
                    faculty.len() - 1
                });
            let credits = catalog.subjects[subject].credits;
            lectures.extend(alloc.lectures(credits).map(|lecture| LectureVar {
                lecture,
                section,
                subject,
                faculty: f,
            }));
        }
        lectures.sort_by(|a, b| a.lecture.cmp(&b.lecture));

        Self {
            slots,
            rooms,
            subjects,
            sections,
            faculty,
            lectures,
            neighbors,
        }
    }

    /// Indices of slots that may hold lectures.
    pub fn teaching_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.slots.len()).filter(|&i| !self.slots[i].is_break)
    }

    /// Number of non-break slots.
    pub fn teaching_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_break).count()
    }

    /// Same-day slots directly before and after `slot`.
    pub fn neighbors(&self, slot: usize) -> &[usize] {
        &self.neighbors[slot]
    }

    /// Rooms that seat the section of `lecture`.
    pub fn fitting_rooms(&self, lecture: usize) -> impl Iterator<Item = usize> + '_ {
        let strength = self.sections[self.lectures[lecture].section].strength;
        (0..self.rooms.len()).filter(move |&r| self.rooms[r].fits(strength))
    }

    /// Number of lectures demanded by a section.
    pub fn section_demand(&self, section: usize) -> usize {
        self.lectures.iter().filter(|l| l.section == section).count()
    }

    /// Lectures taught by a faculty member, in lecture order.
    pub fn faculty_lectures(&self, faculty: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.lectures.len()).filter(move |&i| self.lectures[i].faculty == faculty)
    }
}
