//! Timetable generation and publishing engine.
//!
//! Turns an institution's rooms, weekly slot grid, subjects, sections and
//! faculty allocations into a conflict-free weekly timetable, keeps it as a
//! Draft for review, and publishes it as the authoritative version.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Catalog`, `Room`, `TimeSlot`, `Subject`,
//!   `Section`, `Allocation`, `ScheduleEntry`, `ScheduleBatch`
//! - **`validation`**: Catalog integrity checks and schedule re-validation
//! - **`constraints`**: Hard feasibility (`Occupancy`) and soft cost rules
//! - **`scheduler`**: Backtracking `Solver` and `ScheduleKpi`
//! - **`store`**: Per-term Draft/Published slots and the writer lock
//! - **`publish`**: Validate-then-commit publishing
//! - **`query`**: Filtered, denormalized timetable rows
//! - **`source`**: `CatalogSource` trait and `InMemoryCatalog`
//! - **`engine`**: `TimetableEngine`, the entry point tying it together
//! - **`config`**: `EngineConfig` loaded from TOML
//! - **`error`**: `EngineError` and `FailureKind`
//!
//! # Guarantees
//!
//! A timetable that reaches the Draft or Published slot never double-books a
//! faculty member, room or section, never uses a break slot, and gives every
//! allocated (section, subject) exactly `credits` lectures per week. Failed
//! operations never modify either slot.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Russell & Norvig (2021), "Artificial Intelligence: A Modern Approach", Ch. 6

pub mod config;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod models;
pub mod publish;
pub mod query;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod validation;

pub use config::EngineConfig;
pub use engine::{GenerateReport, TimetableEngine};
pub use error::{EngineError, FailureKind, Result};
pub use publish::PublishReport;
pub use query::{QueryFilter, ScheduleRow};
