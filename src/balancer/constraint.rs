//! Constraint-directed swap balancer.
//!
//! # Algorithm
//!
//! Minimizes the imbalance score
//!
//! ```text
//! score = Σ_teams Σ_flags severity(flag)
//!       + max(0, range − tolerance) × SKILL_PENALTY × team_count
//! ```
//!
//! where `range` is the spread of per-team skill averages. Each iteration
//! enumerates every exchange of one member of team A with one member of
//! team B, over all unordered team pairs, scores it on the current
//! (immutable) teams, and applies only the single best strictly improving
//! exchange. An exchange that would make a currently valid team invalid is
//! never applied.
//!
//! Stops when all teams are valid, no exchange improves the score, or the
//! iteration budget `5 × team_size × |ViolationKind|` is spent.
//!
//! # Complexity
//! O(T² × S² × (S + T)) per iteration for T teams of size S: every
//! candidate re-evaluates the two touched teams and the skill range.
//! Acceptable only at small scale (tens of teams).

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, trace, warn};
use rayon::prelude::*;

use super::kpi::range_of;
use crate::arena::swap_members;
use crate::evaluation::TeamEvaluator;
use crate::models::{Personality, Player, Team, ViolationKind};

/// A scored member exchange between two teams.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapCandidate {
    /// First team index.
    pub team_a: usize,
    /// Member index within the first team.
    pub member_a: usize,
    /// Second team index.
    pub team_b: usize,
    /// Member index within the second team.
    pub member_b: usize,
    /// Imbalance score after the exchange.
    pub score: f64,
}

impl SwapCandidate {
    fn key(&self) -> (usize, usize, usize, usize) {
        (self.team_a, self.member_a, self.team_b, self.member_b)
    }

    /// Lower score wins; ties go to the lexicographically first exchange.
    fn better(self, other: Self) -> Self {
        match self.score.partial_cmp(&other.score) {
            Some(std::cmp::Ordering::Less) => self,
            Some(std::cmp::Ordering::Greater) => other,
            _ => {
                if self.key() <= other.key() {
                    self
                } else {
                    other
                }
            }
        }
    }
}

/// Why a balancing pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every team passes the evaluator.
    AllValid,
    /// No exchange lowers the score.
    NoImprovement,
    /// The iteration budget ran out.
    BudgetExhausted,
    /// Roster supply cannot satisfy the rules for this many teams.
    Unsolvable,
    /// Fewer than two teams; nothing to exchange.
    TooFewTeams,
}

/// Result of a balancing pass.
#[derive(Debug, Clone)]
pub struct BalanceOutcome {
    /// Iterations executed.
    pub iterations: usize,
    /// Exchanges applied.
    pub swaps_applied: usize,
    /// Score before the pass.
    pub initial_score: f64,
    /// Score after the pass.
    pub final_score: f64,
    /// Termination cause.
    pub stop_reason: StopReason,
}

/// Swap-based local search over rule violations and skill spread.
///
/// # Example
///
/// ```
/// use u_teams::balancer::ConstraintBalancer;
/// use u_teams::evaluation::TeamEvaluator;
/// use u_teams::models::RuleConfig;
///
/// let balancer = ConstraintBalancer::new(TeamEvaluator::new(RuleConfig::default()), 4);
/// assert_eq!(balancer.iteration_budget(), 5 * 4 * 6);
///
/// let mut teams: Vec<u_teams::models::Team> = Vec::new();
/// let outcome = balancer.balance(&mut teams);
/// assert_eq!(outcome.swaps_applied, 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintBalancer {
    evaluator: TeamEvaluator,
    team_size: usize,
    skill_tolerance: f64,
    skill_penalty: f64,
    max_iterations: Option<usize>,
}

impl ConstraintBalancer {
    /// Skill-range spread tolerated without penalty.
    pub const SKILL_TOLERANCE: f64 = 1.0;
    /// Penalty per unit of excess spread, per team.
    pub const SKILL_PENALTY: f64 = 10.0;

    /// Creates a balancer for teams of `team_size`.
    pub fn new(evaluator: TeamEvaluator, team_size: usize) -> Self {
        Self {
            evaluator,
            team_size,
            skill_tolerance: Self::SKILL_TOLERANCE,
            skill_penalty: Self::SKILL_PENALTY,
            max_iterations: None,
        }
    }

    /// Overrides the iteration budget.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Sets the penalty-free skill spread.
    pub fn with_skill_tolerance(mut self, tolerance: f64) -> Self {
        self.skill_tolerance = tolerance.max(0.0);
        self
    }

    /// Iteration budget: `5 × team_size × number of violation kinds`,
    /// unless overridden.
    pub fn iteration_budget(&self) -> usize {
        self.max_iterations
            .unwrap_or(5 * self.team_size * ViolationKind::ALL.len())
    }

    /// Weighted violation total of one team.
    pub fn team_penalty(&self, team: &Team) -> i32 {
        self.evaluator.evaluate(team).total_severity()
    }

    /// Imbalance score of a full set of teams.
    pub fn imbalance_score(&self, teams: &[Team]) -> f64 {
        let penalties: i32 = teams.par_iter().map(|t| self.team_penalty(t)).sum();
        f64::from(penalties) + self.skill_term(nonempty_averages(teams).into_iter(), teams.len())
    }

    fn skill_term(&self, averages: impl Iterator<Item = f64>, team_count: usize) -> f64 {
        let gap = range_of(averages);
        if gap > self.skill_tolerance {
            (gap - self.skill_tolerance) * self.skill_penalty * team_count as f64
        } else {
            0.0
        }
    }

    /// Whether roster supply rules out any fully valid assignment: fewer
    /// Leaders than teams need, or fewer distinct roles than one team
    /// needs.
    pub fn is_provably_unsolvable(&self, teams: &[Team]) -> bool {
        let rules = self.evaluator.rules();
        let players = teams.iter().flat_map(|t| t.members.iter());

        let leaders = players
            .clone()
            .filter(|p| p.personality == Personality::Leader)
            .count();
        let roles: BTreeSet<_> = players.map(|p| p.role).collect();

        leaders < teams.len() * rules.min_leaders || roles.len() < rules.min_roles
    }

    /// Runs the local search in place.
    pub fn balance(&self, teams: &mut [Team]) -> BalanceOutcome {
        let initial_score = self.imbalance_score(teams);
        let mut outcome = BalanceOutcome {
            iterations: 0,
            swaps_applied: 0,
            initial_score,
            final_score: initial_score,
            stop_reason: StopReason::BudgetExhausted,
        };

        if teams.len() < 2 {
            outcome.stop_reason = StopReason::TooFewTeams;
            return outcome;
        }
        if self.is_provably_unsolvable(teams) {
            warn!(
                "Balancer: roster cannot satisfy the rules for {} teams; skipping",
                teams.len()
            );
            outcome.stop_reason = StopReason::Unsolvable;
            return outcome;
        }

        let budget = self.iteration_budget();
        let mut penalties: Vec<i32> = teams.iter().map(|t| self.team_penalty(t)).collect();
        let mut current = initial_score;

        for _ in 0..budget {
            if penalties.iter().all(|&p| p == 0) {
                outcome.stop_reason = StopReason::AllValid;
                break;
            }
            outcome.iterations += 1;

            let Some(best) = self.best_swap(teams, &penalties, current) else {
                outcome.stop_reason = StopReason::NoImprovement;
                break;
            };

            let (a, b) = (best.team_a, best.team_b);
            let (left, right) = teams.split_at_mut(b);
            swap_members(&mut left[a], best.member_a, &mut right[0], best.member_b);

            penalties[a] = self.team_penalty(&teams[a]);
            penalties[b] = self.team_penalty(&teams[b]);
            current = best.score;
            outcome.swaps_applied += 1;

            trace!(
                "Balancer swap {}[{}] <-> {}[{}], score {:.3}",
                teams[a].name,
                best.member_a,
                teams[b].name,
                best.member_b,
                current
            );
        }

        if outcome.stop_reason == StopReason::BudgetExhausted
            && penalties.iter().all(|&p| p == 0)
        {
            outcome.stop_reason = StopReason::AllValid;
        }

        outcome.final_score = current;
        debug!(
            "Balancer finished: {} iterations, {} swaps, score {:.3} -> {:.3} ({:?})",
            outcome.iterations,
            outcome.swaps_applied,
            outcome.initial_score,
            outcome.final_score,
            outcome.stop_reason
        );
        outcome
    }

    /// Finds the best strictly improving exchange, scoring every candidate
    /// against the unmodified teams. Team pairs are scored in parallel.
    ///
    /// Candidates that would turn a currently valid team invalid are
    /// discarded.
    pub fn best_swap(&self, teams: &[Team], penalties: &[i32], current: f64) -> Option<SwapCandidate> {
        let averages: Vec<Option<f64>> = teams
            .iter()
            .map(|t| (!t.is_empty()).then(|| t.average_skill()))
            .collect();
        let base_penalty: i32 = penalties.iter().sum();

        let pairs: Vec<(usize, usize)> = (0..teams.len())
            .flat_map(|a| ((a + 1)..teams.len()).map(move |b| (a, b)))
            .collect();

        pairs
            .par_iter()
            .filter_map(|&(a, b)| {
                let mut best: Option<SwapCandidate> = None;
                for ma in 0..teams[a].len() {
                    for mb in 0..teams[b].len() {
                        let Some(candidate) =
                            self.score_swap(teams, &averages, penalties, base_penalty, (a, ma), (b, mb))
                        else {
                            continue;
                        };
                        if candidate.score < current {
                            best = Some(match best {
                                Some(prev) => prev.better(candidate),
                                None => candidate,
                            });
                        }
                    }
                }
                best
            })
            .reduce_with(SwapCandidate::better)
    }

    /// Scores one exchange without mutating any team. Returns `None` when
    /// the exchange would invalidate a currently valid team.
    fn score_swap(
        &self,
        teams: &[Team],
        averages: &[Option<f64>],
        penalties: &[i32],
        base_penalty: i32,
        (a, ma): (usize, usize),
        (b, mb): (usize, usize),
    ) -> Option<SwapCandidate> {
        let pa = &teams[a].members[ma];
        let pb = &teams[b].members[mb];
        if pa.id == pb.id {
            return None;
        }

        let new_a = with_replacement(&teams[a], ma, pb);
        let new_b = with_replacement(&teams[b], mb, pa);
        let pen_a = self.team_penalty(&new_a);
        let pen_b = self.team_penalty(&new_b);

        if (penalties[a] == 0 && pen_a != 0) || (penalties[b] == 0 && pen_b != 0) {
            return None;
        }

        let penalty = base_penalty - penalties[a] - penalties[b] + pen_a + pen_b;
        let new_averages = averages.iter().enumerate().filter_map(|(i, avg)| {
            if i == a {
                Some(new_a.average_skill())
            } else if i == b {
                Some(new_b.average_skill())
            } else {
                *avg
            }
        });
        let score = f64::from(penalty) + self.skill_term(new_averages, teams.len());

        Some(SwapCandidate {
            team_a: a,
            member_a: ma,
            team_b: b,
            member_b: mb,
            score,
        })
    }

    /// Restricted pass for a single team: exchanges its members with
    /// players from `bench` until the team is valid, no exchange lowers
    /// its violation total, or the budget is spent.
    ///
    /// Players swapped out of the team go back to the bench. Returns
    /// whether the team ends valid.
    pub fn repair_with_bench(&self, team: &mut Team, bench: &mut [Arc<Player>]) -> bool {
        let mut penalty = self.team_penalty(team);

        for _ in 0..self.iteration_budget() {
            if penalty == 0 {
                return true;
            }

            let mut best: Option<(usize, usize, i32)> = None;
            for mi in 0..team.len() {
                for (bi, incoming) in bench.iter().enumerate() {
                    let trial = with_replacement(team, mi, incoming);
                    let p = self.team_penalty(&trial);
                    if p < best.map_or(penalty, |(_, _, bp)| bp) {
                        best = Some((mi, bi, p));
                    }
                }
            }

            let Some((mi, bi, p)) = best else {
                break;
            };
            std::mem::swap(&mut team.members[mi], &mut bench[bi]);
            penalty = p;
        }

        penalty == 0
    }
}

fn with_replacement(team: &Team, idx: usize, incoming: &Arc<Player>) -> Team {
    let mut members = team.members.clone();
    members[idx] = Arc::clone(incoming);
    Team {
        name: team.name.clone(),
        members,
    }
}

fn nonempty_averages(teams: &[Team]) -> Vec<f64> {
    teams
        .iter()
        .filter(|t| !t.is_empty())
        .map(Team::average_skill)
        .collect()
}
