//! Randomized skill tightening.
//!
//! # Algorithm
//!
//! Narrows the spread of per-team skill averages with personality-preserving
//! member exchanges. A fixed pool of workers runs in rounds; in each round
//! every worker performs one batch of random attempts:
//!
//! 1. Pick two distinct teams and one member of each, uniformly.
//! 2. Skip unless both members share a personality, so rule compliance of
//!    both teams is untouched.
//! 3. Compute both team averages before and after the exchange.
//! 4. Apply it only if the pair's gap strictly shrinks **and** both new
//!    averages stay inside the interval spanned by the old ones.
//!
//! The containment condition means no exchange can push a team outside the
//! current global `[min, max]` of averages, so the global range never
//! grows, even while workers race inside one round.
//!
//! The driver continues while some worker applied an exchange and the range
//! still exceeds the target, up to a round ceiling.
//!
//! # Concurrency
//!
//! Teams sit in a [`TeamArena`]; every exchange runs under the arena's
//! ordered pair lock. Worker panics are caught and count as a batch with no
//! improvement.
//!
//! # Validity guard
//!
//! Matching personalities keeps Leader and Thinker counts intact, but an
//! exchange can still break role diversity or a preference cap. With a
//! guard evaluator set, an exchange that turns a valid team invalid is
//! reverted under the same lock.

use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use super::kpi::skill_range;
use crate::arena::{swap_members, TeamArena};
use crate::error::FormationError;
use crate::evaluation::TeamEvaluator;
use crate::models::Team;

const EPSILON: f64 = 1e-9;

/// Skill tightener parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TightenerConfig {
    /// Concurrent workers per round.
    pub workers: usize,
    /// Random attempts per worker per round.
    pub batch_attempts: usize,
    /// Round ceiling (never below [`TightenerConfig::MIN_ROUNDS`]).
    pub max_rounds: usize,
    /// Stop once the skill range is at or below this value.
    pub target_range: f64,
    /// RNG seed. `None` seeds from the thread RNG.
    pub seed: Option<u64>,
}

impl TightenerConfig {
    /// Floor applied to `max_rounds`.
    pub const MIN_ROUNDS: usize = 200;

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the attempts per batch.
    pub fn with_batch_attempts(mut self, attempts: usize) -> Self {
        self.batch_attempts = attempts;
        self
    }

    /// Sets the round ceiling.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Sets the target skill range.
    pub fn with_target_range(mut self, range: f64) -> Self {
        self.target_range = range;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Effective round ceiling.
    pub fn round_ceiling(&self) -> usize {
        self.max_rounds.max(Self::MIN_ROUNDS)
    }
}

impl Default for TightenerConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            batch_attempts: 20,
            max_rounds: 2000,
            target_range: 0.5,
            seed: None,
        }
    }
}

/// Why tightening stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TightenStop {
    /// Range reached the target.
    WithinTarget,
    /// A full round applied no exchange.
    Converged,
    /// Round ceiling reached.
    RoundLimit,
    /// Fewer than two non-empty teams.
    TooFewTeams,
}

/// Result of a tightening run.
#[derive(Debug, Clone)]
pub struct TightenOutcome {
    /// Rounds executed.
    pub rounds: usize,
    /// Exchanges applied across all workers.
    pub swaps_applied: usize,
    /// Batches lost to a worker panic.
    pub failed_batches: usize,
    /// Range before the first round.
    pub initial_range: f64,
    /// Range after the last round.
    pub final_range: f64,
    /// Range after each round, starting with the initial range.
    pub range_history: Vec<f64>,
    /// Termination cause.
    pub stop: TightenStop,
}

/// Multi-worker random swap search over skill averages.
///
/// Owns its worker pool; the pool shuts down when the tightener is dropped.
pub struct SkillTightener {
    config: TightenerConfig,
    guard: Option<TeamEvaluator>,
    pool: ThreadPool,
    #[cfg(test)]
    failing_worker: Option<usize>,
}

impl SkillTightener {
    /// Starts a tightener with its own worker pool.
    pub fn new(config: TightenerConfig) -> Result<Self, FormationError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("skill-tightener-{i}"))
            .build()?;
        Ok(Self {
            config,
            guard: None,
            pool,
            #[cfg(test)]
            failing_worker: None,
        })
    }

    /// Reverts exchanges that would make a valid team fail `evaluator`.
    pub fn with_guard(mut self, evaluator: TeamEvaluator) -> Self {
        self.guard = Some(evaluator);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &TightenerConfig {
        &self.config
    }

    /// Tightens `teams` in place. Team order is preserved.
    pub fn tighten(&self, teams: &mut Vec<Team>) -> TightenOutcome {
        let arena = TeamArena::new(std::mem::take(teams));
        let outcome = self.tighten_arena(&arena);
        *teams = arena.into_teams();
        outcome
    }

    /// Tightens teams already held in an arena.
    pub fn tighten_arena(&self, arena: &TeamArena) -> TightenOutcome {
        let initial_range = skill_range(&arena.snapshot());
        let mut outcome = TightenOutcome {
            rounds: 0,
            swaps_applied: 0,
            failed_batches: 0,
            initial_range,
            final_range: initial_range,
            range_history: vec![initial_range],
            stop: TightenStop::RoundLimit,
        };

        let populated = (0..arena.len()).filter(|&i| !arena.lock(i).is_empty()).count();
        if populated < 2 {
            outcome.stop = TightenStop::TooFewTeams;
            return outcome;
        }

        let workers = self.config.workers.max(1);
        let mut range = initial_range;

        for round in 0..self.config.round_ceiling() {
            if range <= self.config.target_range {
                outcome.stop = TightenStop::WithinTarget;
                break;
            }

            let results: Vec<Option<usize>> = self.pool.install(|| {
                (0..workers)
                    .into_par_iter()
                    .map(|worker| {
                        let mut rng = self.worker_rng(round, worker);
                        catch_unwind(AssertUnwindSafe(|| {
                            #[cfg(test)]
                            if self.failing_worker == Some(worker) {
                                panic!("worker {worker} failed");
                            }
                            run_batch(arena, &mut rng, self.config.batch_attempts, self.guard.as_ref())
                        }))
                        .map_err(|_| warn!("Tightener worker {worker} panicked in round {round}"))
                        .ok()
                    })
                    .collect()
            });

            let improved = results.iter().any(|r| matches!(r, Some(n) if *n > 0));
            outcome.failed_batches += results.iter().filter(|r| r.is_none()).count();
            outcome.swaps_applied += results.iter().flatten().sum::<usize>();
            outcome.rounds += 1;

            range = skill_range(&arena.snapshot());
            outcome.range_history.push(range);

            if !improved {
                outcome.stop = TightenStop::Converged;
                break;
            }
        }

        if outcome.stop == TightenStop::RoundLimit && range <= self.config.target_range {
            outcome.stop = TightenStop::WithinTarget;
        }
        outcome.final_range = range;

        debug!(
            "Tightener finished: {} rounds, {} swaps, range {:.3} -> {:.3} ({:?})",
            outcome.rounds, outcome.swaps_applied, outcome.initial_range, outcome.final_range, outcome.stop
        );
        outcome
    }

    fn worker_rng(&self, round: usize, worker: usize) -> SmallRng {
        match self.config.seed {
            Some(seed) => {
                let stream = ((round as u64) << 16) | worker as u64;
                SmallRng::seed_from_u64(seed.wrapping_add(stream))
            }
            None => SmallRng::from_rng(&mut rand::rng()),
        }
    }
}

impl std::fmt::Debug for SkillTightener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillTightener")
            .field("config", &self.config)
            .field("guarded", &self.guard.is_some())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

/// One worker batch. Returns the number of applied exchanges.
fn run_batch(
    arena: &TeamArena,
    rng: &mut SmallRng,
    attempts: usize,
    guard: Option<&TeamEvaluator>,
) -> usize {
    let n = arena.len();
    if n < 2 {
        return 0;
    }

    let mut applied = 0;
    for _ in 0..attempts {
        let a = rng.random_range(0..n);
        let mut b = rng.random_range(0..n - 1);
        if b >= a {
            b += 1;
        }
        if arena
            .with_pair(a, b, |ta, tb| try_exchange(ta, tb, rng, guard))
            .unwrap_or(false)
        {
            applied += 1;
        }
    }
    applied
}

/// Attempts one random same-personality exchange between two locked teams.
fn try_exchange(
    a: &mut Team,
    b: &mut Team,
    rng: &mut SmallRng,
    guard: Option<&TeamEvaluator>,
) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let ma = rng.random_range(0..a.len());
    let mb = rng.random_range(0..b.len());

    let (pa, pb) = (&a.members[ma], &b.members[mb]);
    if pa.personality != pb.personality || pa.skill == pb.skill {
        return false;
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (sa, sb) = (f64::from(a.skill_total()), f64::from(b.skill_total()));
    let delta = f64::from(pb.skill) - f64::from(pa.skill);

    let (avg_a, avg_b) = (sa / na, sb / nb);
    let (new_a, new_b) = ((sa + delta) / na, (sb - delta) / nb);

    let (lo, hi) = (avg_a.min(avg_b), avg_a.max(avg_b));
    let inside = |v: f64| v >= lo - EPSILON && v <= hi + EPSILON;
    let shrinks = (new_a - new_b).abs() + EPSILON < (avg_a - avg_b).abs();

    if !(shrinks && inside(new_a) && inside(new_b)) {
        return false;
    }

    let Some(evaluator) = guard else {
        return swap_members(a, ma, b, mb);
    };
    let (valid_a, valid_b) = (evaluator.is_valid(a), evaluator.is_valid(b));
    if !swap_members(a, ma, b, mb) {
        return false;
    }
    if (valid_a && !evaluator.is_valid(a)) || (valid_b && !evaluator.is_valid(b)) {
        swap_members(a, ma, b, mb);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Game, Personality, Player, Role};
    use std::sync::Arc;

    fn team(name: &str, members: &[(u8, Personality)]) -> Team {
        Team::new(name).with_members(
            members
                .iter()
                .enumerate()
                .map(|(i, &(skill, personality))| {
                    Arc::new(Player::new(
                        format!("{name}-{i}"),
                        skill,
                        personality,
                        Role::ALL[i % Role::ALL.len()],
                        Game::ALL[i % Game::ALL.len()],
                    ))
                })
                .collect(),
        )
    }

    fn skewed() -> Vec<Team> {
        use Personality::*;
        vec![
            team("A", &[(10, Leader), (9, Thinker), (10, Balanced)]),
            team("B", &[(1, Leader), (2, Thinker), (1, Balanced)]),
            team("C", &[(8, Leader), (3, Thinker), (5, Balanced)]),
            team("D", &[(4, Leader), (7, Thinker), (6, Balanced)]),
        ]
    }

    fn seeded() -> SkillTightener {
        SkillTightener::new(TightenerConfig::default().with_workers(4).with_seed(42)).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let c = TightenerConfig::default();
        assert_eq!(c.workers, 8);
        assert_eq!(c.batch_attempts, 20);
        assert_eq!(c.round_ceiling(), 2000);
        assert_eq!(c.clone().with_max_rounds(10).round_ceiling(), 200);
        assert!((c.target_range - 0.5).abs() < 1e-10);

        let json = serde_json::to_string(&c.with_seed(7)).unwrap();
        let back: TightenerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, Some(7));
    }

    #[test]
    fn test_reduces_range() {
        let mut teams = skewed();
        let outcome = seeded().tighten(&mut teams);

        assert!(outcome.swaps_applied > 0);
        assert!(outcome.final_range < outcome.initial_range);
        assert!((skill_range(&teams) - outcome.final_range).abs() < 1e-10);
        assert_eq!(teams.len(), 4);
        assert_eq!(teams[0].name, "A");
    }

    #[test]
    fn test_range_never_grows() {
        let mut teams = skewed();
        let outcome = seeded().tighten(&mut teams);

        for w in outcome.range_history.windows(2) {
            assert!(w[1] <= w[0] + 1e-9, "range grew: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn test_preserves_personality_counts() {
        let mut teams = skewed();
        let before: Vec<_> = teams
            .iter()
            .map(|t| Personality::ALL.map(|p| t.count_personality(p)))
            .collect();

        seeded().tighten(&mut teams);

        let after: Vec<_> = teams
            .iter()
            .map(|t| Personality::ALL.map(|p| t.count_personality(p)))
            .collect();
        assert_eq!(before, after);

        let mut ids: Vec<_> = teams
            .iter()
            .flat_map(|t| t.members.iter().map(|p| p.id.clone()))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn test_no_shared_personality() {
        use Personality::*;
        let mut teams = vec![team("A", &[(10, Leader)]), team("B", &[(1, Thinker)])];
        let outcome = seeded().tighten(&mut teams);

        assert_eq!(outcome.stop, TightenStop::Converged);
        assert_eq!(outcome.swaps_applied, 0);
        assert!((outcome.final_range - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_single_team_is_noop() {
        let mut teams = vec![skewed().remove(0)];
        let outcome = seeded().tighten(&mut teams);
        assert_eq!(outcome.stop, TightenStop::TooFewTeams);
        assert_eq!(outcome.rounds, 0);
        assert_eq!(teams[0].member_ids(), "A-0|A-1|A-2");
    }

    #[test]
    fn test_within_target() {
        let mut teams = skewed();
        let tightener =
            SkillTightener::new(TightenerConfig::default().with_target_range(100.0)).unwrap();
        let outcome = tightener.tighten(&mut teams);
        assert_eq!(outcome.stop, TightenStop::WithinTarget);
        assert_eq!(outcome.rounds, 0);
    }

    #[test]
    fn test_failed_worker_counts_as_no_improvement() {
        let mut tightener = seeded();
        tightener.failing_worker = Some(0);
        let mut teams = skewed();
        let outcome = tightener.tighten(&mut teams);

        assert!(outcome.rounds > 0);
        assert_eq!(outcome.failed_batches, outcome.rounds);
        assert!(outcome.swaps_applied > 0);
        assert!(outcome.final_range < outcome.initial_range);
    }

    #[test]
    fn test_all_workers_failing_stops() {
        let mut tightener =
            SkillTightener::new(TightenerConfig::default().with_workers(1).with_seed(3)).unwrap();
        tightener.failing_worker = Some(0);
        let mut teams = skewed();
        let before: Vec<_> = teams.iter().map(Team::member_ids).collect();
        let outcome = tightener.tighten(&mut teams);

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.failed_batches, 1);
        assert_eq!(outcome.stop, TightenStop::Converged);
        let after: Vec<_> = teams.iter().map(Team::member_ids).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_try_exchange_containment() {
        use Personality::*;
        let mut rng = SmallRng::seed_from_u64(42);
        // Exchanging 10 for 1 would flip the pair: 10 vs 1 -> 1 vs 10.
        let mut a = team("A", &[(10, Balanced)]);
        let mut b = team("B", &[(1, Balanced)]);
        assert!(!try_exchange(&mut a, &mut b, &mut rng, None));
        assert_eq!(a.members[0].skill, 10);
    }

    #[test]
    fn test_guard_keeps_valid_teams_valid() {
        use crate::models::RuleConfig;
        use Personality::*;

        let p = |id: &str, skill: u8, personality, role, game| {
            Arc::new(Player::new(id, skill, personality, role, game))
        };
        // Swapping the Balanced players would narrow the gap but leave
        // team A with two Strategists and only two distinct roles.
        let mut teams = vec![
            Team::new("A").with_members(vec![
                p("AL", 9, Leader, Role::Strategist, Game::Valorant),
                p("AT", 9, Thinker, Role::Supporter, Game::Csgo),
                p("AB", 9, Balanced, Role::Coordinator, Game::Fifa),
            ]),
            Team::new("B").with_members(vec![
                p("BL", 3, Leader, Role::Defender, Game::Chess),
                p("BT", 9, Thinker, Role::Attacker, Game::Dota2),
                p("BB", 3, Balanced, Role::Strategist, Game::Basketball),
            ]),
        ];
        let evaluator = TeamEvaluator::new(RuleConfig::default());
        let tightener = seeded().with_guard(evaluator);
        tightener.tighten(&mut teams);

        assert!(evaluator.all_valid(&teams));
    }
}
