//! Weighted combination of cost rules.

use std::sync::Arc;

use super::{rules, Candidate, CostContext, CostRule, CostScore, Occupancy, TimetableProblem};
use crate::config::CostWeights;

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn CostRule>,
    weight: f64,
}

/// Scores and orders candidate placements.
///
/// The score is the weighted sum of every rule. Ordering is a stable sort,
/// so candidates with equal cost keep the order they were given in.
#[derive(Clone, Default)]
pub struct CostEngine {
    rules: Vec<WeightedRule>,
}

impl CostEngine {
    /// Creates an engine with no rules (every candidate costs 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard rule set from configured weights.
    ///
    /// Rules with weight 0 are left out.
    pub fn from_weights(weights: &CostWeights) -> Self {
        let mut engine = Self::new();
        if weights.preferred_room > 0.0 {
            engine = engine.with_weighted_rule(rules::PreferredRoom, weights.preferred_room);
        }
        if weights.difficulty_spread > 0.0 {
            engine = engine.with_weighted_rule(rules::DifficultySpread, weights.difficulty_spread);
        }
        if weights.faculty_load > 0.0 {
            engine = engine.with_weighted_rule(rules::FacultyLoad, weights.faculty_load);
        }
        if weights.early_slot > 0.0 {
            engine = engine.with_weighted_rule(rules::EarlySlot, weights.early_slot);
        }
        if weights.subject_repeat > 0.0 {
            engine = engine.with_weighted_rule(rules::SubjectRepeat, weights.subject_repeat);
        }
        engine
    }

    /// Adds a rule with weight 1.0.
    pub fn with_rule<R: CostRule + 'static>(self, rule: R) -> Self {
        self.with_weighted_rule(rule, 1.0)
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: CostRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Number of rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Weighted scores from each rule, in insertion order.
    pub fn evaluate(&self, ctx: &CostContext<'_>) -> Vec<CostScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(ctx) * wr.weight)
            .collect()
    }

    /// Total weighted cost of one candidate.
    pub fn score(&self, ctx: &CostContext<'_>) -> CostScore {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(ctx) * wr.weight)
            .sum()
    }

    /// Orders candidates for `lecture` by ascending cost.
    pub fn rank(
        &self,
        problem: &TimetableProblem,
        occupancy: &Occupancy,
        lecture: usize,
        candidates: Vec<Candidate>,
    ) -> Vec<Candidate> {
        if self.rules.is_empty() || candidates.len() < 2 {
            return candidates;
        }
        let mut scored: Vec<(CostScore, Candidate)> = candidates
            .into_iter()
            .map(|c| {
                let ctx = CostContext::new(problem, occupancy, lecture, c);
                (self.score(&ctx), c)
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

impl std::fmt::Debug for CostEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
