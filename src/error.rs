//! Error types for generation and publishing.
//!
//! Every failure names the entities an administrator has to look at. A
//! failed operation never changes stored schedules.

use std::fmt;

use thiserror::Error;

use crate::models::Violation;
use crate::validation::ValidationError;

/// Errors produced by the timetable engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The catalog or allocation table is malformed.
    #[error("invalid catalog input: {}", join(errors))]
    Validation { errors: Vec<ValidationError> },

    /// A (section, subject) pair has no candidate placement at all.
    #[error("section '{section}' subject '{subject}' cannot be placed anywhere: {reason}")]
    Infeasible {
        section: String,
        subject: String,
        reason: String,
    },

    /// Demand exceeds the available slot and room capacity.
    #[error("resource shortage in {scope}: {demand} lectures requested, {capacity} placements available")]
    ResourceShortage {
        /// What ran short ("term" or "section 'A'").
        scope: String,
        demand: u64,
        capacity: u64,
    },

    /// Search exhausted its options for a specific pair.
    #[error("could not place section '{section}' subject '{subject}'{}", blame(faculty.as_deref(), room.as_deref(), conflicting_sections))]
    PlacementFailure {
        section: String,
        subject: String,
        /// Faculty member whose timetable blocked every slot, if one did.
        faculty: Option<String>,
        /// Room whose bookings blocked every slot, if one did.
        room: Option<String>,
        /// Other sections holding the blocking faculty or room.
        conflicting_sections: Vec<String>,
    },

    /// The wall-clock budget ran out or the run was cancelled.
    ///
    /// `section` and `subject` name the lecture the search was stuck on: the
    /// most recent dead end, or the next lecture to place if there was none.
    /// `faculty` and `room` carry that dead end's blame, if any.
    #[error("generation timed out after {elapsed_ms} ms with {placed} of {total} lectures placed{}", stalled(section.as_deref(), subject.as_deref(), faculty.as_deref(), room.as_deref()))]
    Timeout {
        elapsed_ms: u64,
        placed: usize,
        total: usize,
        section: Option<String>,
        subject: Option<String>,
        faculty: Option<String>,
        room: Option<String>,
    },

    /// Another generation or publish holds the term's writer lock.
    #[error("{operation} rejected: term '{term}' is locked by another writer")]
    ConcurrencyConflict { term: String, operation: String },

    /// The draft failed publish validation.
    #[error("publish rejected with {} violation(s): {}", violations.len(), join(violations))]
    PublishRejected { violations: Vec<Violation> },

    /// The catalog source has no data for the term.
    #[error("no catalog available for term '{term}'")]
    CatalogUnavailable { term: String },
}

/// Discriminant of [`EngineError`], for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ValidationError,
    Infeasible,
    ResourceShortage,
    PlacementFailure,
    Timeout,
    ConcurrencyConflict,
    PublishRejected,
    CatalogUnavailable,
}

impl EngineError {
    /// The failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            EngineError::Validation { .. } => FailureKind::ValidationError,
            EngineError::Infeasible { .. } => FailureKind::Infeasible,
            EngineError::ResourceShortage { .. } => FailureKind::ResourceShortage,
            EngineError::PlacementFailure { .. } => FailureKind::PlacementFailure,
            EngineError::Timeout { .. } => FailureKind::Timeout,
            EngineError::ConcurrencyConflict { .. } => FailureKind::ConcurrencyConflict,
            EngineError::PublishRejected { .. } => FailureKind::PublishRejected,
            EngineError::CatalogUnavailable { .. } => FailureKind::CatalogUnavailable,
        }
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn blame(faculty: Option<&str>, room: Option<&str>, sections: &[String]) -> String {
    let mut out = String::new();
    if let Some(f) = faculty {
        out.push_str(&format!(": faculty '{f}' is busy in every free slot"));
    } else if let Some(r) = room {
        out.push_str(&format!(": room '{r}' is booked in every free slot"));
    }
    if !sections.is_empty() {
        out.push_str(&format!(" (held by sections {})", sections.join(", ")));
    }
    out
}

fn stalled(
    section: Option<&str>,
    subject: Option<&str>,
    faculty: Option<&str>,
    room: Option<&str>,
) -> String {
    let (Some(section), Some(subject)) = (section, subject) else {
        return String::new();
    };
    let mut out = format!("; stuck on section '{section}' subject '{subject}'");
    if let Some(f) = faculty {
        out.push_str(&format!(" (faculty '{f}' busy)"));
    } else if let Some(r) = room {
        out.push_str(&format!(" (room '{r}' booked)"));
    }
    out
}
