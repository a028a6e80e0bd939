//! Timetabling domain models.
//!
//! Provides the reference data the solver reads and the schedule types it
//! produces.
//!
//! # Domain Mappings
//!
//! | Type | Institution term | Role in search |
//! |------|------------------|----------------|
//! | Allocation | Course allocation | Who teaches what to whom |
//! | Lecture | Class meeting | Placement variable |
//! | Room / Faculty / Section | Room / Teacher / Cohort | Must not be double-booked |
//! | TimeSlot | Period | Domain axis |
//! | ScheduleBatch | Timetable | Complete placement |

mod allocation;
mod catalog;
mod room;
mod schedule;
mod subject;
mod timeslot;

pub use allocation::{Allocation, Faculty, Lecture, Section};
pub use catalog::Catalog;
pub use room::Room;
pub use schedule::{
    weekly_coverage, Lifecycle, ScheduleBatch, ScheduleEntry, Violation, ViolationType,
};
pub use subject::{Subject, MAX_DIFFICULTY, MIN_DIFFICULTY};
pub use timeslot::{ClockTime, TimeSlot, Weekday};
