//! Formation quality metrics (KPIs).
//!
//! Computes standard indicators from a finished set of teams.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Skill Range | max − min of per-team skill averages |
//! | Mean Team Skill | mean of per-team skill averages |
//! | Valid Teams | teams passing the evaluator at the exact size |
//! | Valid Rate | valid teams / teams |
//! | Unplaced | roster players not in any valid team |

use crate::evaluation::TeamEvaluator;
use crate::models::Team;

/// Spread of per-team skill averages (max − min).
///
/// Empty teams have no meaningful average and are ignored. Fewer than two
/// non-empty teams have a range of `0.0`.
pub fn skill_range(teams: &[Team]) -> f64 {
    range_of(teams.iter().filter(|t| !t.is_empty()).map(Team::average_skill))
}

/// Spread of a set of averages (`0.0` when empty).
pub(crate) fn range_of(averages: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = averages.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), a| {
        (lo.min(a), hi.max(a))
    });
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

/// Formation performance indicators.
#[derive(Debug, Clone)]
pub struct FormationKpi {
    /// Number of teams.
    pub team_count: usize,
    /// Teams that pass the evaluator with exactly the requested size.
    pub valid_team_count: usize,
    /// Fraction of valid teams (0.0..1.0).
    pub valid_rate: f64,
    /// Spread of per-team skill averages.
    pub skill_range: f64,
    /// Mean of per-team skill averages.
    pub mean_team_skill: f64,
    /// Lowest per-team skill average.
    pub min_team_skill: f64,
    /// Highest per-team skill average.
    pub max_team_skill: f64,
    /// Roster players outside every valid team.
    pub unplaced_players: usize,
}

impl FormationKpi {
    /// Computes KPIs for a set of teams.
    ///
    /// # Arguments
    /// * `teams` - The formed teams.
    /// * `evaluator` - Rule evaluator deciding validity.
    /// * `team_size` - Requested team size.
    /// * `roster_size` - Total number of players offered.
    pub fn calculate(
        teams: &[Team],
        evaluator: &TeamEvaluator,
        team_size: usize,
        roster_size: usize,
    ) -> Self {
        let valid = evaluator.valid_teams(teams, team_size);
        let placed: usize = valid.iter().map(Team::len).sum();

        let averages: Vec<f64> = teams
            .iter()
            .filter(|t| !t.is_empty())
            .map(Team::average_skill)
            .collect();

        let (min_team_skill, max_team_skill, mean_team_skill) = if averages.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let min = averages.iter().copied().fold(f64::INFINITY, f64::min);
            let max = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = averages.iter().sum::<f64>() / averages.len() as f64;
            (min, max, mean)
        };

        let valid_rate = if teams.is_empty() {
            0.0
        } else {
            valid.len() as f64 / teams.len() as f64
        };

        Self {
            team_count: teams.len(),
            valid_team_count: valid.len(),
            valid_rate,
            skill_range: max_team_skill - min_team_skill,
            mean_team_skill,
            min_team_skill,
            max_team_skill,
            unplaced_players: roster_size.saturating_sub(placed),
        }
    }
}
