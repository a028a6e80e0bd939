//! Built-in cost rules.
//!
//! All rules return lower scores for better placements and 0 when they have
//! nothing to say.

use super::{CostContext, CostRule, CostScore};

/// Preferred room.
///
/// 0 for the subject's first preference, 1 for the second, and so on. A
/// room outside the list scores the list length. Subjects without
/// preferences always score 0.
#[derive(Debug, Clone, Copy)]
pub struct PreferredRoom;

impl CostRule for PreferredRoom {
    fn name(&self) -> &'static str {
        "PreferredRoom"
    }

    fn evaluate(&self, ctx: &CostContext<'_>) -> CostScore {
        let prefs = &ctx.problem.subjects[ctx.var().subject].preferred_rooms;
        if prefs.is_empty() {
            return 0.0;
        }
        prefs
            .iter()
            .position(|&r| r == ctx.candidate.room)
            .unwrap_or(prefs.len()) as f64
    }

    fn description(&self) -> &'static str {
        "Prefer the subject's preferred rooms"
    }
}

/// Difficulty spread.
///
/// For heavy subjects only: heavy lectures the section already has that
/// day, plus heavy lectures in the directly adjacent periods.
#[derive(Debug, Clone, Copy)]
pub struct DifficultySpread;

impl CostRule for DifficultySpread {
    fn name(&self) -> &'static str {
        "DifficultySpread"
    }

    fn evaluate(&self, ctx: &CostContext<'_>) -> CostScore {
        let var = ctx.var();
        let problem = ctx.problem;
        if !problem.subjects[var.subject].is_heavy {
            return 0.0;
        }
        let day = ctx.slot().day.index();
        let same_day = ctx.occupancy.section_heavy_count(var.section, day);
        let adjacent = problem
            .neighbors(ctx.candidate.slot)
            .iter()
            .filter_map(|&s| ctx.occupancy.section_holder(s, var.section))
            .filter(|&holder| problem.subjects[problem.lectures[holder].subject].is_heavy)
            .count();
        f64::from(same_day) + adjacent as f64
    }

    fn description(&self) -> &'static str {
        "Spread heavy subjects across a section's week"
    }
}

/// Faculty load.
///
/// Lectures the faculty member already teaches on the candidate day.
#[derive(Debug, Clone, Copy)]
pub struct FacultyLoad;

impl CostRule for FacultyLoad {
    fn name(&self) -> &'static str {
        "FacultyLoad"
    }

    fn evaluate(&self, ctx: &CostContext<'_>) -> CostScore {
        let day = ctx.slot().day.index();
        f64::from(ctx.occupancy.faculty_day_load(ctx.var().faculty, day))
    }

    fn description(&self) -> &'static str {
        "Balance a faculty member's load across days"
    }
}

/// Early slot.
///
/// The slot's period within its day, so earlier slots win ties.
#[derive(Debug, Clone, Copy)]
pub struct EarlySlot;

impl CostRule for EarlySlot {
    fn name(&self) -> &'static str {
        "EarlySlot"
    }

    fn evaluate(&self, ctx: &CostContext<'_>) -> CostScore {
        f64::from(ctx.slot().period)
    }

    fn description(&self) -> &'static str {
        "Prefer earlier periods"
    }
}

/// Subject repeat.
///
/// Meetings of the same subject the section already has that day.
#[derive(Debug, Clone, Copy)]
pub struct SubjectRepeat;

impl CostRule for SubjectRepeat {
    fn name(&self) -> &'static str {
        "SubjectRepeat"
    }

    fn evaluate(&self, ctx: &CostContext<'_>) -> CostScore {
        let var = ctx.var();
        let day = ctx.slot().day.index();
        f64::from(ctx.occupancy.subject_day_count(var.section, var.subject, day))
    }

    fn description(&self) -> &'static str {
        "Avoid repeating a subject on one day"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Candidate, Occupancy, TimetableProblem};
    use crate::models::{Allocation, Catalog, ClockTime, Room, Section, Subject, TimeSlot, Weekday};

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    // Slots: 0 MON-1, 1 MON-2, 2 MON-3, 3 TUE-1
    // Lectures: 0 A:ALG:0, 1 A:ALG:1, 2 A:DSA:0, 3 A:PE:0
    fn problem() -> TimetableProblem {
        let c = Catalog::new()
            .with_room(Room::new("LAB", 60))
            .with_room(Room::new("HALL", 60))
            .with_room(Room::new("R3", 60))
            .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:00"), t("10:00")))
            .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, t("10:00"), t("11:00")))
            .with_timeslot(TimeSlot::new("MON-3", Weekday::Monday, t("11:00"), t("12:00")))
            .with_timeslot(TimeSlot::new("TUE-1", Weekday::Tuesday, t("09:00"), t("10:00")))
            .with_subject(
                Subject::new("ALG", 2)
                    .with_difficulty(3)
                    .with_preferred_room("LAB")
                    .with_preferred_room("HALL"),
            )
            .with_subject(Subject::new("DSA", 1).with_difficulty(3))
            .with_subject(Subject::new("PE", 1).with_difficulty(1))
            .with_section(Section::new("A"))
            .with_allocation(Allocation::new("ALG", "F1", "A"))
            .with_allocation(Allocation::new("DSA", "F2", "A"))
            .with_allocation(Allocation::new("PE", "F1", "A"));
        TimetableProblem::from_catalog(&c, 3)
    }

    fn score(rule: &dyn CostRule, p: &TimetableProblem, occ: &Occupancy, l: usize, slot: usize, room: usize) -> f64 {
        rule.evaluate(&CostContext::new(p, occ, l, Candidate { slot, room }))
    }

    #[test]
    fn test_preferred_room_rank() {
        let p = problem();
        let occ = Occupancy::new(&p);
        assert_eq!(score(&PreferredRoom, &p, &occ, 0, 0, 0), 0.0);
        assert_eq!(score(&PreferredRoom, &p, &occ, 0, 0, 1), 1.0);
        assert_eq!(score(&PreferredRoom, &p, &occ, 0, 0, 2), 2.0);
        // DSA has no preferences
        assert_eq!(score(&PreferredRoom, &p, &occ, 2, 0, 2), 0.0);
    }

    #[test]
    fn test_difficulty_spread_counts_day_and_neighbours() {
        let p = problem();
        let mut occ = Occupancy::new(&p);
        occ.place(&p, 0, Candidate { slot: 0, room: 0 });
        // DSA at MON-2: one heavy that day + one heavy adjacent
        assert_eq!(score(&DifficultySpread, &p, &occ, 2, 1, 1), 2.0);
        // DSA at MON-3: one heavy that day, not adjacent
        assert_eq!(score(&DifficultySpread, &p, &occ, 2, 2, 1), 1.0);
        // DSA on Tuesday
        assert_eq!(score(&DifficultySpread, &p, &occ, 2, 3, 1), 0.0);
        // PE is light
        assert_eq!(score(&DifficultySpread, &p, &occ, 3, 1, 1), 0.0);
    }

    #[test]
    fn test_faculty_load_counts_same_day() {
        let p = problem();
        let mut occ = Occupancy::new(&p);
        occ.place(&p, 0, Candidate { slot: 0, room: 0 });
        assert_eq!(score(&FacultyLoad, &p, &occ, 3, 1, 1), 1.0);
        assert_eq!(score(&FacultyLoad, &p, &occ, 3, 3, 1), 0.0);
        // DSA is taught by F2
        assert_eq!(score(&FacultyLoad, &p, &occ, 2, 1, 1), 0.0);
    }

    #[test]
    fn test_early_slot_is_period() {
        let p = problem();
        let occ = Occupancy::new(&p);
        assert_eq!(score(&EarlySlot, &p, &occ, 0, 2, 0), 2.0);
        assert_eq!(score(&EarlySlot, &p, &occ, 0, 3, 0), 0.0);
    }

    #[test]
    fn test_early_slot_skips_lunch() {
        let c = Catalog::new()
            .with_room(Room::new("R1", 60))
            .with_timeslot(TimeSlot::new("MON-1", Weekday::Monday, t("09:00"), t("10:00")))
            .with_timeslot(TimeSlot::break_slot("MON-L", Weekday::Monday, t("10:00"), t("11:00")))
            .with_timeslot(TimeSlot::new("MON-2", Weekday::Monday, t("11:00"), t("12:00")))
            .with_subject(Subject::new("PE", 1))
            .with_section(Section::new("A"))
            .with_allocation(Allocation::new("PE", "F1", "A"));
        let p = TimetableProblem::from_catalog(&c, 3);
        let occ = Occupancy::new(&p);
        // MON-2 is the second lesson of the day
        assert_eq!(score(&EarlySlot, &p, &occ, 0, 2, 0), 1.0);
    }

    #[test]
    fn test_subject_repeat() {
        let p = problem();
        let mut occ = Occupancy::new(&p);
        occ.place(&p, 0, Candidate { slot: 0, room: 0 });
        assert_eq!(score(&SubjectRepeat, &p, &occ, 1, 2, 0), 1.0);
        assert_eq!(score(&SubjectRepeat, &p, &occ, 1, 3, 0), 0.0);
    }
}
