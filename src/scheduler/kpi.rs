//! Timetable quality metrics (KPIs).
//!
//! Summarizes how well a finished schedule meets the soft preferences. The
//! numbers are diagnostic only; hard-rule checks live in
//! [`validate_schedule`](crate::validation::validate_schedule).
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Preferred-room rate | Fraction of lectures with room preferences placed in one of them |
//! | Heavy clusters | Heavy lectures beyond the first per (section, day) |
//! | Faculty load spread | Mean over faculty of (busiest day − lightest day) |
//! | Mean period | Average position of a lecture within its day (0 = first) |

use std::collections::HashMap;

use super::solver::SearchStats;
use crate::constraints::TimetableProblem;
use crate::models::{Catalog, ScheduleEntry, Weekday};

/// Schedule quality indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Number of entries measured.
    pub entry_count: usize,
    /// Fraction of preference-bearing lectures in a preferred room (0.0..1.0).
    pub preferred_room_rate: f64,
    /// Heavy lectures beyond the first on any (section, day).
    pub heavy_clusters: u32,
    /// Mean difference between a faculty member's busiest and lightest day.
    pub faculty_load_spread: f64,
    /// Mean period index of all entries.
    pub mean_period: f64,
    /// Backtracks spent by the search that produced the schedule.
    pub backtracks: u64,
    /// Search time (ms).
    pub search_ms: u64,
}

impl ScheduleKpi {
    /// Computes KPIs for `entries` placed against `catalog`.
    ///
    /// Entries that reference unknown slots or subjects are counted but do
    /// not contribute to slot- or subject-based metrics.
    pub fn calculate(catalog: &Catalog, entries: &[ScheduleEntry], heavy_difficulty: u8) -> Self {
        let problem = TimetableProblem::from_catalog(catalog, heavy_difficulty);
        let period: HashMap<&str, u32> = problem
            .slots
            .iter()
            .map(|s| (s.id.as_str(), s.period))
            .collect();
        let teaching_days: Vec<Weekday> = {
            let mut days: Vec<Weekday> = problem
                .slots
                .iter()
                .filter(|s| !s.is_break)
                .map(|s| s.day)
                .collect();
            days.dedup();
            days
        };

        let mut with_prefs = 0usize;
        let mut in_preferred = 0usize;
        let mut heavy_per_day: HashMap<(&str, Weekday), u32> = HashMap::new();
        let mut faculty_per_day: HashMap<&str, HashMap<Weekday, u32>> = HashMap::new();
        let mut period_sum = 0u64;
        let mut period_count = 0usize;

        for entry in entries {
            if let Some(&p) = period.get(entry.timeslot_id.as_str()) {
                period_sum += u64::from(p);
                period_count += 1;
            }
            *faculty_per_day
                .entry(entry.faculty_id.as_str())
                .or_default()
                .entry(entry.day)
                .or_insert(0) += 1;

            let Some(subject) = catalog.subject(&entry.subject_id) else {
                continue;
            };
            if subject.has_room_preference() {
                with_prefs += 1;
                if subject.room_preference(&entry.room_id).is_some() {
                    in_preferred += 1;
                }
            }
            if subject.difficulty >= heavy_difficulty {
                *heavy_per_day
                    .entry((entry.section_id.as_str(), entry.day))
                    .or_insert(0) += 1;
            }
        }

        let preferred_room_rate = if with_prefs == 0 {
            1.0
        } else {
            in_preferred as f64 / with_prefs as f64
        };

        let heavy_clusters: u32 = heavy_per_day.values().map(|&n| n.saturating_sub(1)).sum();

        let faculty_load_spread = if faculty_per_day.is_empty() {
            0.0
        } else {
            let total: u32 = faculty_per_day
                .values()
                .map(|by_day| {
                    let loads = teaching_days
                        .iter()
                        .map(|d| by_day.get(d).copied().unwrap_or(0));
                    let max = loads.clone().max().unwrap_or(0);
                    let min = loads.min().unwrap_or(0);
                    max - min
                })
                .sum();
            f64::from(total) / faculty_per_day.len() as f64
        };

        let mean_period = if period_count == 0 {
            0.0
        } else {
            period_sum as f64 / period_count as f64
        };

        Self {
            entry_count: entries.len(),
            preferred_room_rate,
            heavy_clusters,
            faculty_load_spread,
            mean_period,
            backtracks: 0,
            search_ms: 0,
        }
    }

    /// Attaches the search counters of the run that produced the schedule.
    pub fn with_search(mut self, stats: SearchStats) -> Self {
        self.backtracks = stats.backtracks;
        self.search_ms = stats.elapsed_ms;
        self
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_preferred_rate: f64, max_heavy_clusters: u32) -> bool {
        self.preferred_room_rate >= min_preferred_rate && self.heavy_clusters <= max_heavy_clusters
    }
}
