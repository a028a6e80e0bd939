//! Committed-placement state and the hard-constraint predicate.
//!
//! `Occupancy` records which lecture holds each (slot, faculty),
//! (slot, room) and (slot, section) key, plus the per-day tallies the cost
//! rules read. `place` and `unplace` are O(1), so backtracking only pays for
//! what it undoes.

use std::collections::HashMap;

use super::problem::{Candidate, TimetableProblem};

const DAYS: usize = 7;

/// Why a candidate is not feasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    /// The slot is a break.
    BreakSlot,
    /// The room does not seat the section.
    Capacity,
    /// The section already has a lecture in the slot (holder lecture index).
    Section(usize),
    /// The faculty member already teaches in the slot (holder lecture index).
    Faculty(usize),
    /// The room is already booked in the slot (holder lecture index).
    Room(usize),
}

/// Placements committed so far.
#[derive(Debug, Clone)]
pub struct Occupancy {
    n_faculty: usize,
    n_rooms: usize,
    n_sections: usize,
    /// slot * n_faculty + faculty → holder lecture
    faculty_at: Vec<Option<usize>>,
    /// slot * n_rooms + room → holder lecture
    room_at: Vec<Option<usize>>,
    /// slot * n_sections + section → holder lecture
    section_at: Vec<Option<usize>>,
    /// faculty * 7 + day → lectures that day
    faculty_day: Vec<u32>,
    /// section * 7 + day → heavy lectures that day
    section_day_heavy: Vec<u32>,
    /// (section, subject, day) → lectures that day
    subject_day: HashMap<(usize, usize, usize), u32>,
    assignment: Vec<Option<Candidate>>,
    placed: usize,
}

impl Occupancy {
    /// Creates an empty occupancy for a problem.
    pub fn new(problem: &TimetableProblem) -> Self {
        let n_slots = problem.slots.len();
        let n_faculty = problem.faculty.len();
        let n_rooms = problem.rooms.len();
        let n_sections = problem.sections.len();
        Self {
            n_faculty,
            n_rooms,
            n_sections,
            faculty_at: vec![None; n_slots * n_faculty],
            room_at: vec![None; n_slots * n_rooms],
            section_at: vec![None; n_slots * n_sections],
            faculty_day: vec![0; n_faculty * DAYS],
            section_day_heavy: vec![0; n_sections * DAYS],
            subject_day: HashMap::new(),
            assignment: vec![None; problem.lectures.len()],
            placed: 0,
        }
    }

    /// First hard rule that `candidate` would break for `lecture`, if any.
    ///
    /// Checks, in order: break slot, room capacity, section, faculty, room.
    pub fn blocker(
        &self,
        problem: &TimetableProblem,
        lecture: usize,
        candidate: Candidate,
    ) -> Option<Blocker> {
        let var = &problem.lectures[lecture];
        let Candidate { slot, room } = candidate;
        if problem.slots[slot].is_break {
            return Some(Blocker::BreakSlot);
        }
        if !problem.rooms[room].fits(problem.sections[var.section].strength) {
            return Some(Blocker::Capacity);
        }
        if let Some(holder) = self.section_at[slot * self.n_sections + var.section] {
            return Some(Blocker::Section(holder));
        }
        if let Some(holder) = self.faculty_at[slot * self.n_faculty + var.faculty] {
            return Some(Blocker::Faculty(holder));
        }
        if let Some(holder) = self.room_at[slot * self.n_rooms + room] {
            return Some(Blocker::Room(holder));
        }
        None
    }

    /// Whether `lecture` may be placed at `candidate` given what is committed.
    #[inline]
    pub fn is_feasible(
        &self,
        problem: &TimetableProblem,
        lecture: usize,
        candidate: Candidate,
    ) -> bool {
        self.blocker(problem, lecture, candidate).is_none()
    }

    /// All feasible candidates for `lecture`, in slot-then-room order.
    pub fn domain(&self, problem: &TimetableProblem, lecture: usize) -> Vec<Candidate> {
        let mut out = Vec::new();
        for slot in problem.teaching_slots() {
            for room in 0..problem.rooms.len() {
                let c = Candidate { slot, room };
                if self.is_feasible(problem, lecture, c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Size of the feasible domain, stopping early once it reaches `limit`.
    pub fn domain_size(&self, problem: &TimetableProblem, lecture: usize, limit: usize) -> usize {
        let mut n = 0;
        for slot in problem.teaching_slots() {
            for room in 0..problem.rooms.len() {
                if self.is_feasible(problem, lecture, Candidate { slot, room }) {
                    n += 1;
                    if n >= limit {
                        return n;
                    }
                }
            }
        }
        n
    }

    /// Commits a placement. The caller guarantees feasibility.
    pub fn place(&mut self, problem: &TimetableProblem, lecture: usize, candidate: Candidate) {
        let var = &problem.lectures[lecture];
        let Candidate { slot, room } = candidate;
        let day = problem.slots[slot].day.index();
        self.section_at[slot * self.n_sections + var.section] = Some(lecture);
        self.faculty_at[slot * self.n_faculty + var.faculty] = Some(lecture);
        self.room_at[slot * self.n_rooms + room] = Some(lecture);
        self.faculty_day[var.faculty * DAYS + day] += 1;
        if problem.subjects[var.subject].is_heavy {
            self.section_day_heavy[var.section * DAYS + day] += 1;
        }
        *self
            .subject_day
            .entry((var.section, var.subject, day))
            .or_insert(0) += 1;
        self.assignment[lecture] = Some(candidate);
        self.placed += 1;
    }

    /// Reverts a placement made by [`place`](Self::place).
    ///
    /// Does nothing if the lecture is not placed.
    pub fn unplace(&mut self, problem: &TimetableProblem, lecture: usize) {
        let Some(Candidate { slot, room }) = self.assignment[lecture].take() else {
            return;
        };
        let var = &problem.lectures[lecture];
        let day = problem.slots[slot].day.index();
        self.section_at[slot * self.n_sections + var.section] = None;
        self.faculty_at[slot * self.n_faculty + var.faculty] = None;
        self.room_at[slot * self.n_rooms + room] = None;
        self.faculty_day[var.faculty * DAYS + day] -= 1;
        if problem.subjects[var.subject].is_heavy {
            self.section_day_heavy[var.section * DAYS + day] -= 1;
        }
        if let Some(n) = self.subject_day.get_mut(&(var.section, var.subject, day)) {
            *n -= 1;
        }
        self.placed -= 1;
    }

    /// Where a lecture is placed, if it is.
    pub fn assignment(&self, lecture: usize) -> Option<Candidate> {
        self.assignment[lecture]
    }

    /// Number of placed lectures.
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Lecture holding a section in a slot.
    pub fn section_holder(&self, slot: usize, section: usize) -> Option<usize> {
        self.section_at[slot * self.n_sections + section]
    }

    /// Lecture holding a faculty member in a slot.
    pub fn faculty_holder(&self, slot: usize, faculty: usize) -> Option<usize> {
        self.faculty_at[slot * self.n_faculty + faculty]
    }

    /// Lecture holding a room in a slot.
    pub fn room_holder(&self, slot: usize, room: usize) -> Option<usize> {
        self.room_at[slot * self.n_rooms + room]
    }

    /// Lectures a faculty member teaches on a day.
    pub fn faculty_day_load(&self, faculty: usize, day: usize) -> u32 {
        self.faculty_day[faculty * DAYS + day]
    }

    /// Heavy lectures a section has on a day.
    pub fn section_heavy_count(&self, section: usize, day: usize) -> u32 {
        self.section_day_heavy[section * DAYS + day]
    }

    /// Meetings of a subject a section has on a day.
    pub fn subject_day_count(&self, section: usize, subject: usize, day: usize) -> u32 {
        self.subject_day
            .get(&(section, subject, day))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Allocation, Catalog, ClockTime, Room, Section, Subject, TimeSlot, Weekday};

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    /// Sections A and B, both taught by F1; one room each fits, slot 1 is lunch.
    fn problem() -> TimetableProblem {
        let c = Catalog::new()
            .with_room(Room::new("R1", 60))
            .with_room(Room::new("R2", 20))
            .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:00"), t("10:00")))
            .with_timeslot(TimeSlot::break_slot("MON-L", Weekday::Monday, t("10:00"), t("11:00")))
            .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, t("11:00"), t("12:00")))
            .with_subject(Subject::new("MATH", 1).with_difficulty(3))
            .with_section(Section::new("A").with_strength(40))
            .with_section(Section::new("B").with_strength(10))
            .with_allocation(Allocation::new("MATH", "F1", "A"))
            .with_allocation(Allocation::new("MATH", "F1", "B"));
        TimetableProblem::from_catalog(&c, 3)
    }

    #[test]
    fn test_break_and_capacity_block() {
        let p = problem();
        let occ = Occupancy::new(&p);
        // lecture 0 = A (strength 40)
        assert_eq!(
            occ.blocker(&p, 0, Candidate { slot: 1, room: 0 }),
            Some(Blocker::BreakSlot)
        );
        assert_eq!(
            occ.blocker(&p, 0, Candidate { slot: 0, room: 1 }),
            Some(Blocker::Capacity)
        );
        assert!(occ.is_feasible(&p, 0, Candidate { slot: 0, room: 0 }));
    }

    #[test]
    fn test_domain_excludes_breaks_and_small_rooms() {
        let p = problem();
        let occ = Occupancy::new(&p);
        assert_eq!(
            occ.domain(&p, 0),
            vec![Candidate { slot: 0, room: 0 }, Candidate { slot: 2, room: 0 }]
        );
        assert_eq!(occ.domain(&p, 1).len(), 4);
        assert_eq!(occ.domain_size(&p, 1, 2), 2);
    }

    #[test]
    fn test_faculty_blocks_after_place() {
        let p = problem();
        let mut occ = Occupancy::new(&p);
        occ.place(&p, 0, Candidate { slot: 0, room: 0 });
        assert_eq!(
            occ.blocker(&p, 1, Candidate { slot: 0, room: 1 }),
            Some(Blocker::Faculty(0))
        );
        assert_eq!(occ.domain(&p, 1), vec![
            Candidate { slot: 2, room: 0 },
            Candidate { slot: 2, room: 1 },
        ]);
        assert_eq!(occ.placed(), 1);
        assert_eq!(occ.faculty_day_load(0, 0), 1);
        assert_eq!(occ.section_heavy_count(0, 0), 1);
        assert_eq!(occ.subject_day_count(0, 0, 0), 1);
    }

    #[test]
    fn test_unplace_restores_state() {
        let p = problem();
        let mut occ = Occupancy::new(&p);
        occ.place(&p, 0, Candidate { slot: 0, room: 0 });
        occ.unplace(&p, 0);
        assert_eq!(occ.placed(), 0);
        assert!(occ.assignment(0).is_none());
        assert_eq!(occ.domain(&p, 1).len(), 4);
        assert_eq!(occ.faculty_day_load(0, 0), 0);
        assert_eq!(occ.section_heavy_count(0, 0), 0);
        // Unplacing twice is a no-op
        occ.unplace(&p, 0);
        assert_eq!(occ.placed(), 0);
    }
}
