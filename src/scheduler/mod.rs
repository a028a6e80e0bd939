//! Timetable generation and KPI evaluation.
//!
//! # Algorithm
//!
//! [`Solver`] is a deterministic backtracking search with a dynamic
//! most-constrained-variable order and cost-ordered candidates. It either
//! places every lecture or returns a typed failure naming the pair it could
//! not place.
//!
//! # KPI
//!
//! [`ScheduleKpi`] measures the soft objectives of a finished schedule:
//! preferred-room hits, heavy-subject clustering, faculty load spread and
//! how early lectures sit in the day.
//!
//! # References
//!
//! - Russell & Norvig (2021), "Artificial Intelligence: A Modern Approach", Ch. 6
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod budget;
mod kpi;
mod solver;

pub use budget::{CancelToken, Deadline};
pub use kpi::ScheduleKpi;
pub use solver::{SearchStats, SolveOutcome, Solver};
