//! Constraint evaluation.
//!
//! Counts role, preference and personality distributions of a team and
//! compares each against a [`RuleConfig`]. Evaluation is read-only, so
//! many teams can be checked concurrently without locking.
//!
//! # Empty teams
//! An empty team is counted like any other: zero Leaders, zero Thinkers
//! and zero distinct roles. With positive minimums it therefore reports
//! `NotEnoughLeaders`, `NotEnoughThinkers` and `LowRoleDiversity` together.

use rayon::prelude::*;

use crate::models::{Personality, RuleConfig, Team, ViolationKind, ViolationReport};

/// Evaluates teams against a rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamEvaluator {
    rules: RuleConfig,
}

impl TeamEvaluator {
    /// Creates an evaluator for the given rules.
    pub fn new(rules: RuleConfig) -> Self {
        Self { rules }
    }

    /// The rules this evaluator checks.
    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Builds the violation report for one team.
    pub fn evaluate(&self, team: &Team) -> ViolationReport {
        let rules = &self.rules;
        let mut report = ViolationReport::new();

        let leaders = team.count_personality(Personality::Leader);
        let thinkers = team.count_personality(Personality::Thinker);

        if leaders > rules.max_leaders {
            report.raise(
                ViolationKind::TooManyLeaders,
                format!("Too many leaders ({leaders})"),
            );
        }
        if leaders < rules.min_leaders {
            report.raise(
                ViolationKind::NotEnoughLeaders,
                format!("Not enough leaders ({leaders})"),
            );
        }
        if thinkers > rules.max_thinkers {
            report.raise(
                ViolationKind::TooManyThinkers,
                format!("Too many thinkers ({thinkers})"),
            );
        }
        if thinkers < rules.min_thinkers {
            report.raise(
                ViolationKind::NotEnoughThinkers,
                format!("Not enough thinkers ({thinkers})"),
            );
        }

        for (game, count) in team.game_counts() {
            if count > rules.preference_cap {
                report.raise(
                    ViolationKind::PreferenceOverflow,
                    format!("Game overflow: {game} ({count})"),
                );
            }
        }

        let roles = team.distinct_roles();
        if roles < rules.min_roles {
            report.raise(
                ViolationKind::LowRoleDiversity,
                format!("Role diversity too low ({roles})"),
            );
        }

        report
    }

    /// Whether the team satisfies every rule.
    pub fn is_valid(&self, team: &Team) -> bool {
        !self.evaluate(team).has_issues()
    }

    /// Evaluates many teams in parallel.
    ///
    /// Returns `(team index, report)` pairs in input order.
    pub fn evaluate_many(&self, teams: &[Team]) -> Vec<(usize, ViolationReport)> {
        teams
            .par_iter()
            .enumerate()
            .map(|(idx, team)| (idx, self.evaluate(team)))
            .collect()
    }

    /// Whether every team is valid.
    pub fn all_valid(&self, teams: &[Team]) -> bool {
        teams.par_iter().all(|t| self.is_valid(t))
    }

    /// Number of valid teams.
    pub fn count_valid(&self, teams: &[Team]) -> usize {
        teams.par_iter().filter(|t| self.is_valid(t)).count()
    }

    /// Valid teams with exactly `team_size` members, in input order.
    pub fn valid_teams(&self, teams: &[Team], team_size: usize) -> Vec<Team> {
        teams
            .iter()
            .filter(|t| t.len() == team_size && self.is_valid(t))
            .cloned()
            .collect()
    }
}
