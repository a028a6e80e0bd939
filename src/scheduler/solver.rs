//! Backtracking timetable solver.
//!
//! # Algorithm
//!
//! 1. Validate the catalog and expand allocations into lectures.
//! 2. Reject hopeless input up front: a pair with no candidate at all is
//!    `Infeasible`; demand above teaching-slot × room capacity (term-wide,
//!    or per section against teaching slots) is `ResourceShortage`; a
//!    faculty member with more lectures than teaching slots is a
//!    `PlacementFailure` naming them.
//! 3. Repeatedly pick the unplaced lecture with the fewest feasible
//!    candidates (ties: section, subject, occurrence), order its candidates
//!    by soft cost and place the cheapest.
//! 4. When a lecture has no candidate left, undo the most recent placement
//!    and try its next candidate. Each undo counts as one backtrack.
//!
//! The run stops with `PlacementFailure` once the search space or the
//! backtrack cap is exhausted, and with `Timeout` once the deadline passes
//! or the run is cancelled. Both carry the most recent dead end.
//!
//! # Reference
//! Russell & Norvig (2021), "Artificial Intelligence: A Modern Approach",
//! Ch. 6: Constraint Satisfaction Problems

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::budget::{CancelToken, Deadline};
use crate::config::EngineConfig;
use crate::constraints::{Candidate, CostEngine, Occupancy, TimetableProblem};
use crate::error::{EngineError, Result};
use crate::models::{Catalog, Lifecycle, ScheduleEntry};
use crate::validation::validate_catalog;

/// Counters from one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Lectures placed.
    pub lectures: usize,
    /// Placements undone.
    pub backtracks: u64,
    /// Wall-clock time of the search (ms).
    pub elapsed_ms: u64,
}

/// A complete placement.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// One entry per lecture, tagged `Draft`, ordered by entry ID.
    pub entries: Vec<ScheduleEntry>,
    pub stats: SearchStats,
}

/// One decision on the search stack.
#[derive(Debug)]
struct Frame {
    lecture: usize,
    candidates: Vec<Candidate>,
    next: usize,
}

/// Constraint solver for weekly timetables.
///
/// # Example
///
/// ```
/// use u_timetable::config::EngineConfig;
/// use u_timetable::models::{Allocation, Catalog, ClockTime, Room, Section, Subject, TimeSlot, Weekday};
/// use u_timetable::scheduler::{CancelToken, Solver};
///
/// let at = |s: &str| -> ClockTime { s.parse().unwrap() };
/// let catalog = Catalog::new()
///     .with_room(Room::new("R1", 60))
///     .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, at("09:00"), at("10:00")))
///     .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, at("10:00"), at("11:00")))
///     .with_subject(Subject::new("MATH", 2))
///     .with_section(Section::new("A"))
///     .with_allocation(Allocation::new("MATH", "F1", "A"));
///
/// let outcome = Solver::new(EngineConfig::default())
///     .solve(&catalog, &CancelToken::new())
///     .unwrap();
/// assert_eq!(outcome.entries.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    config: EngineConfig,
    costs: CostEngine,
}

impl Solver {
    /// Creates a solver with the standard cost rules weighted by `config`.
    pub fn new(config: EngineConfig) -> Self {
        let costs = CostEngine::from_weights(&config.weights);
        Self { config, costs }
    }

    /// Replaces the cost engine.
    pub fn with_cost_engine(mut self, costs: CostEngine) -> Self {
        self.costs = costs;
        self
    }

    /// The solver's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Places every lecture of `catalog`, or explains why it cannot.
    pub fn solve(&self, catalog: &Catalog, cancel: &CancelToken) -> Result<SolveOutcome> {
        let deadline = Deadline::after(self.config.time_budget());

        validate_catalog(catalog).map_err(|errors| EngineError::Validation { errors })?;
        let problem = TimetableProblem::from_catalog(catalog, self.config.heavy_difficulty);
        precheck(catalog, &problem)?;
        debug!(
            lectures = problem.lectures.len(),
            slots = problem.teaching_slot_count(),
            rooms = problem.rooms.len(),
            "prechecks passed"
        );

        let mut search = Search::new(&problem, &self.costs, &self.config);
        search.run(&deadline, cancel)?;

        let stats = SearchStats {
            lectures: problem.lectures.len(),
            backtracks: search.backtracks,
            elapsed_ms: deadline.elapsed_ms(),
        };
        info!(
            lectures = stats.lectures,
            backtracks = stats.backtracks,
            elapsed_ms = stats.elapsed_ms,
            "search complete"
        );
        Ok(SolveOutcome {
            entries: build_entries(&problem, &search.occupancy),
            stats,
        })
    }
}

fn precheck(catalog: &Catalog, problem: &TimetableProblem) -> Result<()> {
    let teaching = problem.teaching_slot_count();

    for (i, var) in problem.lectures.iter().enumerate() {
        if var.lecture.occurrence != 0 {
            continue;
        }
        let reason = if teaching == 0 {
            "the week has no teaching slots".to_string()
        } else if problem.fitting_rooms(i).next().is_none() {
            format!(
                "no room seats {} students",
                problem.sections[var.section].strength
            )
        } else {
            continue;
        };
        warn!(section = %var.lecture.section_id, subject = %var.lecture.subject_id, %reason, "infeasible pair");
        return Err(EngineError::Infeasible {
            section: var.lecture.section_id.clone(),
            subject: var.lecture.subject_id.clone(),
            reason,
        });
    }

    let demand = catalog.lecture_demand();
    let capacity = (teaching * problem.rooms.len()) as u64;
    if demand > capacity {
        warn!(demand, capacity, "term resource shortage");
        return Err(EngineError::ResourceShortage {
            scope: "term".to_string(),
            demand,
            capacity,
        });
    }

    for (s, section) in problem.sections.iter().enumerate() {
        let demand = problem.section_demand(s);
        if demand > teaching {
            warn!(section = %section.id, demand, teaching, "section resource shortage");
            return Err(EngineError::ResourceShortage {
                scope: format!("section '{}'", section.id),
                demand: demand as u64,
                capacity: teaching as u64,
            });
        }
    }

    for (f, name) in problem.faculty.iter().enumerate() {
        let lectures: Vec<usize> = problem.faculty_lectures(f).collect();
        let Some(&overflow) = lectures.get(teaching) else {
            continue;
        };
        let var = &problem.lectures[overflow];
        let conflicting_sections = section_ids(
            problem,
            lectures.iter().map(|&l| problem.lectures[l].section),
            var.section,
        );
        warn!(faculty = %name, demand = lectures.len(), teaching, "faculty overload");
        return Err(EngineError::PlacementFailure {
            section: var.lecture.section_id.clone(),
            subject: var.lecture.subject_id.clone(),
            faculty: Some(name.clone()),
            room: None,
            conflicting_sections,
        });
    }
    Ok(())
}

/// Sorted, distinct IDs of `sections` other than `except`.
fn section_ids(
    problem: &TimetableProblem,
    sections: impl Iterator<Item = usize>,
    except: usize,
) -> Vec<String> {
    sections
        .filter(|&s| s != except)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|s| problem.sections[s].id.clone())
        .collect()
}

/// What blocked the most recent lecture found without candidates.
#[derive(Debug, Clone)]
struct DeadEnd {
    lecture: usize,
    faculty: Option<String>,
    room: Option<String>,
    conflicting_sections: Vec<String>,
}

struct Search<'a> {
    problem: &'a TimetableProblem,
    costs: &'a CostEngine,
    occupancy: Occupancy,
    stack: Vec<Frame>,
    rng: Option<StdRng>,
    backtracks: u64,
    max_backtracks: u64,
    dead_end: Option<DeadEnd>,
}

impl<'a> Search<'a> {
    fn new(problem: &'a TimetableProblem, costs: &'a CostEngine, config: &EngineConfig) -> Self {
        Self {
            problem,
            costs,
            occupancy: Occupancy::new(problem),
            stack: Vec::with_capacity(problem.lectures.len()),
            rng: config.tie_break_seed.map(StdRng::seed_from_u64),
            backtracks: 0,
            max_backtracks: config.max_backtracks,
            dead_end: None,
        }
    }

    fn run(&mut self, deadline: &Deadline, cancel: &CancelToken) -> Result<()> {
        loop {
            let Some(lecture) = self.select() else {
                return Ok(());
            };
            if cancel.is_cancelled() || deadline.is_expired() {
                return Err(self.timeout(deadline, cancel, lecture));
            }

            let candidates = self.order(lecture);
            if let Some(&first) = candidates.first() {
                self.occupancy.place(self.problem, lecture, first);
                self.stack.push(Frame {
                    lecture,
                    candidates,
                    next: 0,
                });
            } else {
                self.dead_end = Some(diagnose(self.problem, &self.occupancy, lecture));
                self.backtrack()?;
            }
        }
    }

    /// Most constrained unplaced lecture, or `None` when all are placed.
    fn select(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for lecture in 0..self.problem.lectures.len() {
            if self.occupancy.assignment(lecture).is_some() {
                continue;
            }
            let limit = best.map_or(usize::MAX, |(_, size)| size);
            let size = self.occupancy.domain_size(self.problem, lecture, limit);
            if best.map_or(true, |(_, b)| size < b) {
                best = Some((lecture, size));
                if size == 0 {
                    break;
                }
            }
        }
        best.map(|(lecture, _)| lecture)
    }

    fn order(&mut self, lecture: usize) -> Vec<Candidate> {
        let mut candidates = self.occupancy.domain(self.problem, lecture);
        if let Some(rng) = self.rng.as_mut() {
            candidates.shuffle(rng);
        }
        self.costs
            .rank(self.problem, &self.occupancy, lecture, candidates)
    }

    /// Undoes placements until one can move to its next candidate.
    fn backtrack(&mut self) -> Result<()> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Err(self.failure());
            };
            frame.next += 1;
            let lecture = frame.lecture;
            let next = frame.candidates.get(frame.next).copied();

            self.occupancy.unplace(self.problem, lecture);
            self.backtracks += 1;
            if self.backtracks > self.max_backtracks {
                warn!(backtracks = self.backtracks, "backtrack cap reached");
                return Err(self.failure());
            }
            match next {
                Some(candidate) => {
                    self.occupancy.place(self.problem, lecture, candidate);
                    return Ok(());
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn failure(&mut self) -> EngineError {
        match self.dead_end.take() {
            Some(dead_end) => {
                let lecture = &self.problem.lectures[dead_end.lecture].lecture;
                EngineError::PlacementFailure {
                    section: lecture.section_id.clone(),
                    subject: lecture.subject_id.clone(),
                    faculty: dead_end.faculty,
                    room: dead_end.room,
                    conflicting_sections: dead_end.conflicting_sections,
                }
            }
            None => EngineError::PlacementFailure {
                section: String::new(),
                subject: String::new(),
                faculty: None,
                room: None,
                conflicting_sections: Vec::new(),
            },
        }
    }

    /// `Timeout` naming the last dead end, or `next` if none was hit.
    fn timeout(&mut self, deadline: &Deadline, cancel: &CancelToken, next: usize) -> EngineError {
        let placed = self.occupancy.placed();
        let total = self.problem.lectures.len();
        let (stuck, faculty, room) = match self.dead_end.take() {
            Some(d) => (d.lecture, d.faculty, d.room),
            None => (next, None, None),
        };
        let lecture = &self.problem.lectures[stuck].lecture;
        warn!(
            placed,
            total,
            cancelled = cancel.is_cancelled(),
            section = %lecture.section_id,
            subject = %lecture.subject_id,
            "search stopped before completion"
        );
        EngineError::Timeout {
            elapsed_ms: deadline.elapsed_ms(),
            placed,
            total,
            section: Some(lecture.section_id.clone()),
            subject: Some(lecture.subject_id.clone()),
            faculty,
            room,
        }
    }
}

/// Names what blocks a lecture that has no feasible candidate.
///
/// If the faculty member is busy in every slot where the section is free,
/// the faculty is to blame. Otherwise the fitting rooms are booked in the
/// remaining slots; a single fitting room is named.
fn diagnose(problem: &TimetableProblem, occupancy: &Occupancy, lecture: usize) -> DeadEnd {
    let var = &problem.lectures[lecture];
    let free: Vec<usize> = problem
        .teaching_slots()
        .filter(|&s| occupancy.section_holder(s, var.section).is_none())
        .collect();

    let mut holders = BTreeSet::new();
    let mut faculty = None;
    let mut room = None;

    let faculty_blocked = !free.is_empty()
        && free
            .iter()
            .all(|&s| occupancy.faculty_holder(s, var.faculty).is_some());
    if faculty_blocked {
        faculty = Some(problem.faculty[var.faculty].clone());
        holders.extend(
            free.iter()
                .filter_map(|&s| occupancy.faculty_holder(s, var.faculty)),
        );
    } else {
        let fitting: Vec<usize> = problem.fitting_rooms(lecture).collect();
        if let [only] = fitting.as_slice() {
            room = Some(problem.rooms[*only].id.clone());
        }
        for &s in free
            .iter()
            .filter(|&&s| occupancy.faculty_holder(s, var.faculty).is_none())
        {
            holders.extend(fitting.iter().filter_map(|&r| occupancy.room_holder(s, r)));
        }
    }

    let conflicting_sections = section_ids(
        problem,
        holders.into_iter().map(|h| problem.lectures[h].section),
        var.section,
    );

    debug!(
        section = %var.lecture.section_id,
        subject = %var.lecture.subject_id,
        faculty = ?faculty,
        room = ?room,
        "dead end"
    );
    DeadEnd {
        lecture,
        faculty,
        room,
        conflicting_sections,
    }
}

fn build_entries(problem: &TimetableProblem, occupancy: &Occupancy) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = problem
        .lectures
        .iter()
        .enumerate()
        .filter_map(|(i, var)| {
            let Candidate { slot, room } = occupancy.assignment(i)?;
            let slot = &problem.slots[slot];
            Some(ScheduleEntry {
                id: var.lecture.entry_id(),
                section_id: var.lecture.section_id.clone(),
                subject_id: var.lecture.subject_id.clone(),
                faculty_id: var.lecture.faculty_id.clone(),
                room_id: problem.rooms[room].id.clone(),
                timeslot_id: slot.id.clone(),
                day: slot.day,
                lifecycle: Lifecycle::Draft,
            })
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}
