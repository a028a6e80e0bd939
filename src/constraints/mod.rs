//! Constraint model: hard feasibility and soft cost.
//!
//! Hard rules live in [`Occupancy::is_feasible`] and are never traded
//! against cost. Soft preferences are [`CostRule`]s combined by a
//! [`CostEngine`] into one scalar that only orders feasible candidates.
//!
//! # Usage
//!
//! ```
//! use u_timetable::config::CostWeights;
//! use u_timetable::constraints::{rules, CostEngine};
//!
//! let engine = CostEngine::from_weights(&CostWeights::default());
//! assert_eq!(engine.rule_count(), 5);
//!
//! let custom = CostEngine::new()
//!     .with_rule(rules::EarlySlot)
//!     .with_weighted_rule(rules::FacultyLoad, 2.0);
//! assert_eq!(custom.rule_count(), 2);
//! ```
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling"

mod engine;
mod occupancy;
mod problem;
pub mod rules;

pub use engine::CostEngine;
pub use occupancy::{Blocker, Occupancy};
pub use problem::{
    Candidate, LectureVar, SectionInfo, SlotInfo, SubjectInfo, TimetableProblem,
};

use std::fmt::Debug;

/// Score returned by a cost rule. Lower is better.
pub type CostScore = f64;

/// What a cost rule sees when scoring one candidate.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub problem: &'a TimetableProblem,
    pub occupancy: &'a Occupancy,
    /// Index of the lecture being placed.
    pub lecture: usize,
    pub candidate: Candidate,
}

impl<'a> CostContext<'a> {
    /// Creates a context.
    pub fn new(
        problem: &'a TimetableProblem,
        occupancy: &'a Occupancy,
        lecture: usize,
        candidate: Candidate,
    ) -> Self {
        Self {
            problem,
            occupancy,
            lecture,
            candidate,
        }
    }

    /// The lecture variable being placed.
    pub fn var(&self) -> &'a LectureVar {
        &self.problem.lectures[self.lecture]
    }

    /// The candidate slot.
    pub fn slot(&self) -> &'a SlotInfo {
        &self.problem.slots[self.candidate.slot]
    }
}

/// A soft preference over candidate placements.
///
/// # Score Convention
/// **Lower score = better placement.** Scores are raw; the engine applies
/// the configured weight.
pub trait CostRule: Send + Sync + Debug {
    /// Rule name (e.g., "PreferredRoom").
    fn name(&self) -> &'static str;

    /// Scores a candidate given what is already placed.
    fn evaluate(&self, ctx: &CostContext<'_>) -> CostScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
