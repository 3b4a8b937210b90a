//! Personality-seeded team builder with a bounded repair loop.
//!
//! # Algorithm
//!
//! Seeding, for `T = ceil(N / size)` teams:
//! 1. Partition players by personality; sort each partition by skill
//!    descending.
//! 2. Seed one Leader per team along a snake cursor.
//! 3. Top every team up to the Thinker minimum, then round-robin further
//!    Thinkers up to the maximum, within capacity.
//! 4. Round-robin Balanced players within capacity.
//! 5. Place leftovers into the least-full team, snake order breaking ties.
//! 6. One skill-tightening pass.
//!
//! Repair, for at most `repair_rounds` rounds:
//! 1. Pool the members of every still-invalid seeded team and rank them
//!    with [`RuleEngine::repair_priority`]. Later rounds reshuffle the pool,
//!    keeping Leaders ahead of Thinkers ahead of Balanced players.
//! 2. For each pooled Leader, build up to `candidate_attempts` candidates:
//!    the Leader, up to two Thinkers, Balanced players that fit the
//!    preference cap (new roles first), then any player within the
//!    personality caps, then anyone.
//! 3. Accept a valid candidate. Otherwise exchange its members against the
//!    rest of the pool ([`ConstraintBalancer::repair_with_bench`]) and
//!    accept if that makes it valid.
//! 4. Committing re-checks that every member is still pooled, then moves
//!    the members out of their seeded teams.
//!
//! The loop stops when a round accepts nothing, the pool is smaller than a
//! team or holds no Leader. Non-empty seeded teams and accepted teams then
//! get one global balancing and tightening pass.
//!
//! Partial success is never an error: callers filter valid teams with the
//! evaluator.

use std::sync::Arc;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::balancer::{ConstraintBalancer, SkillTightener};
use crate::evaluation::TeamEvaluator;
use crate::models::{Personality, Player, RuleConfig, Team};
use crate::priority::rules::PersonalityWeight;
use crate::priority::{PoolContext, RuleEngine};
use crate::validation::team_count;

/// Thinkers a repair candidate takes before filling with other players.
const CANDIDATE_THINKERS: usize = 2;

/// Builder parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Repair round budget.
    pub repair_rounds: usize,
    /// Candidate builds per pooled Leader per round.
    pub candidate_attempts: usize,
    /// RNG seed for repair reshuffles. `None` seeds from the thread RNG.
    pub seed: Option<u64>,
}

impl BuilderConfig {
    /// Sets the repair round budget.
    pub fn with_repair_rounds(mut self, rounds: usize) -> Self {
        self.repair_rounds = rounds;
        self
    }

    /// Sets the candidate builds per Leader.
    pub fn with_candidate_attempts(mut self, attempts: usize) -> Self {
        self.candidate_attempts = attempts;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            repair_rounds: 50,
            candidate_attempts: 3,
            seed: None,
        }
    }
}

/// Back-and-forth traversal over team indices: 0, 1, …, T-1, T-1, …, 0, 0, 1, …
#[derive(Debug, Clone)]
struct SnakeCursor {
    len: usize,
    index: usize,
    forward: bool,
}

impl SnakeCursor {
    fn new(len: usize) -> Self {
        Self {
            len,
            index: 0,
            forward: true,
        }
    }

    fn next_index(&mut self) -> usize {
        let current = self.index;
        if self.forward {
            if self.index + 1 >= self.len {
                self.forward = false;
            } else {
                self.index += 1;
            }
        } else if self.index == 0 {
            self.forward = true;
        } else {
            self.index -= 1;
        }
        current
    }
}

/// Builds teams from a roster.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_teams::balancer::{SkillTightener, TightenerConfig};
/// use u_teams::builder::{BuilderConfig, TeamBuilder};
/// use u_teams::evaluation::TeamEvaluator;
/// use u_teams::models::{Game, Personality, Player, Role, RuleConfig};
///
/// let players: Vec<Arc<Player>> = vec![
///     Player::new("1", 7, Personality::Leader, Role::Defender, Game::Valorant),
///     Player::new("2", 8, Personality::Thinker, Role::Supporter, Game::Csgo),
///     Player::new("3", 7, Personality::Balanced, Role::Strategist, Game::Valorant),
/// ]
/// .into_iter()
/// .map(Arc::new)
/// .collect();
///
/// let tightener = SkillTightener::new(TightenerConfig::default().with_seed(1)).unwrap();
/// let builder = TeamBuilder::new(RuleConfig::default(), BuilderConfig::default(), tightener);
/// let teams = builder.build(&players, 3);
///
/// assert_eq!(teams.len(), 1);
/// assert!(TeamEvaluator::default().is_valid(&teams[0]));
/// ```
#[derive(Debug)]
pub struct TeamBuilder {
    evaluator: TeamEvaluator,
    config: BuilderConfig,
    tightener: SkillTightener,
    priority: RuleEngine,
}

impl TeamBuilder {
    /// Creates a builder. The tightener's worker pool lives as long as the
    /// builder; its exchanges are guarded so they never invalidate a team.
    pub fn new(rules: RuleConfig, config: BuilderConfig, tightener: SkillTightener) -> Self {
        Self {
            evaluator: TeamEvaluator::new(rules),
            config,
            tightener: tightener.with_guard(TeamEvaluator::new(rules)),
            priority: RuleEngine::repair_priority(),
        }
    }

    /// The evaluator used for acceptance.
    pub fn evaluator(&self) -> &TeamEvaluator {
        &self.evaluator
    }

    /// Seeds, repairs and balances teams of `team_size` from `players`.
    pub fn build(&self, players: &[Arc<Player>], team_size: usize) -> Vec<Team> {
        let mut teams = self.seed_teams(players, team_size);
        if teams.is_empty() {
            return teams;
        }
        self.tightener.tighten(&mut teams);

        let seeded_valid = self.evaluator.count_valid(&teams);
        info!(
            "Seeded {} teams of size {} from {} players ({} valid)",
            teams.len(),
            team_size,
            players.len(),
            seeded_valid
        );

        let mut teams = self.repair(teams, team_size);

        let balancer = ConstraintBalancer::new(self.evaluator, team_size);
        balancer.balance(&mut teams);
        self.tightener.tighten(&mut teams);

        for (i, team) in teams.iter_mut().enumerate() {
            team.name = format!("Team {}", i + 1);
        }

        info!(
            "Built {} teams ({} valid)",
            teams.len(),
            self.evaluator.count_valid(&teams)
        );
        teams
    }

    /// Deterministic seeding (steps 1-5, no tightening).
    pub fn seed_teams(&self, players: &[Arc<Player>], team_size: usize) -> Vec<Team> {
        let count = team_count(players.len(), team_size);
        if count == 0 {
            return Vec::new();
        }
        let rules = self.evaluator.rules();
        let mut teams: Vec<Team> = (1..=count).map(|i| Team::new(format!("Team {i}"))).collect();

        let partition = |personality: Personality| {
            let mut group: Vec<Arc<Player>> = players
                .iter()
                .filter(|p| p.personality == personality)
                .cloned()
                .collect();
            group.sort_by(|a, b| b.skill.cmp(&a.skill).then_with(|| a.id.cmp(&b.id)));
            group
        };
        let mut leaders = partition(Personality::Leader).into_iter();
        let mut thinkers = partition(Personality::Thinker).into_iter().peekable();
        let mut balanced = partition(Personality::Balanced).into_iter().peekable();

        let mut cursor = SnakeCursor::new(count);
        for _ in 0..count {
            let Some(leader) = leaders.next() else { break };
            teams[cursor.next_index()].add_member(leader);
        }

        for team in teams.iter_mut() {
            while team.count_personality(Personality::Thinker) < rules.min_thinkers
                && team.len() < team_size
            {
                let Some(t) = thinkers.next() else { break };
                team.add_member(t);
            }
        }
        round_robin(&mut teams, &mut thinkers, |t| {
            t.len() < team_size && t.count_personality(Personality::Thinker) < rules.max_thinkers
        });
        round_robin(&mut teams, &mut balanced, |t| t.len() < team_size);

        let mut leftovers: Vec<Arc<Player>> = leaders.chain(thinkers).chain(balanced).collect();
        leftovers.sort_by(|a, b| b.skill.cmp(&a.skill).then_with(|| a.id.cmp(&b.id)));
        for player in leftovers {
            let fewest = teams.iter().map(Team::len).min().unwrap_or(0);
            let idx = loop {
                let i = cursor.next_index();
                if teams[i].len() == fewest {
                    break i;
                }
            };
            teams[idx].add_member(player);
        }

        teams
    }

    fn repair(&self, mut teams: Vec<Team>, team_size: usize) -> Vec<Team> {
        let balancer = ConstraintBalancer::new(self.evaluator, team_size);
        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let mut accepted: Vec<Team> = Vec::new();

        for round in 0..self.config.repair_rounds {
            let pool: Vec<Arc<Player>> = teams
                .iter()
                .filter(|t| !t.is_empty() && !self.evaluator.is_valid(t))
                .flat_map(|t| t.members.iter().cloned())
                .collect();
            if pool.len() < team_size || !has_leader(&pool) {
                debug!("Repair stopped before round {round}: pool of {}", pool.len());
                break;
            }

            let mut available = self.priority.sort(&pool, &PoolContext::from_players(&pool));
            if round > 0 {
                available.shuffle(&mut rng);
                available.sort_by(|a, b| {
                    PersonalityWeight::weight(b.personality)
                        .total_cmp(&PersonalityWeight::weight(a.personality))
                });
            }

            let leaders: Vec<Arc<Player>> = available
                .iter()
                .filter(|p| p.personality == Personality::Leader)
                .cloned()
                .collect();

            let before = accepted.len();
            for leader in &leaders {
                if available.len() < team_size || !has_leader(&available) {
                    break;
                }
                if !available.iter().any(|p| p.id == leader.id) {
                    continue;
                }
                if let Some(candidate) =
                    self.try_leader(leader, &available, team_size, &balancer, &mut rng)
                {
                    if commit(&candidate, &mut available) {
                        for member in &candidate.members {
                            for team in teams.iter_mut() {
                                if team.remove_member(&member.id).is_some() {
                                    break;
                                }
                            }
                        }
                        accepted.push(candidate);
                    }
                }
            }

            let gained = accepted.len() - before;
            debug!(
                "Repair round {round}: pool {}, accepted {gained}",
                pool.len()
            );
            if gained == 0 {
                break;
            }
        }

        if !accepted.is_empty() {
            info!("Repair assembled {} additional teams", accepted.len());
        }
        teams.retain(|t| !t.is_empty());
        teams.extend(accepted);
        teams
    }

    /// Builds candidates around one Leader. Returns the first valid one.
    fn try_leader(
        &self,
        leader: &Arc<Player>,
        available: &[Arc<Player>],
        team_size: usize,
        balancer: &ConstraintBalancer,
        rng: &mut SmallRng,
    ) -> Option<Team> {
        for attempt in 0..self.config.candidate_attempts.max(1) {
            let mut order = available.to_vec();
            if attempt > 0 {
                order.shuffle(rng);
            }

            let mut candidate = self.build_candidate(leader, &order, team_size);
            if candidate.len() < team_size {
                return None;
            }
            if self.evaluator.is_valid(&candidate) {
                return Some(candidate);
            }

            let mut bench: Vec<Arc<Player>> = available
                .iter()
                .filter(|p| !candidate.contains(&p.id))
                .cloned()
                .collect();
            if balancer.repair_with_bench(&mut candidate, &mut bench) {
                return Some(candidate);
            }
        }
        None
    }

    /// Greedy candidate around `leader`, drawing from `order` front to back.
    fn build_candidate(&self, leader: &Arc<Player>, order: &[Arc<Player>], team_size: usize) -> Team {
        let rules = self.evaluator.rules();
        let thinker_cap = rules
            .max_thinkers
            .min(CANDIDATE_THINKERS.max(rules.min_thinkers));
        let fits_game =
            |t: &Team, p: &Player| t.game_counts().get(&p.game).copied().unwrap_or(0) < rules.preference_cap;

        let mut team = Team::new("Candidate");
        team.add_member(Arc::clone(leader));

        fill(&mut team, order, team_size, |t, p| {
            p.personality == Personality::Thinker
                && t.count_personality(Personality::Thinker) < thinker_cap
        });
        fill(&mut team, order, team_size, |t, p| {
            p.personality == Personality::Balanced
                && fits_game(t, p)
                && !t.members.iter().any(|m| m.role == p.role)
        });
        fill(&mut team, order, team_size, |t, p| {
            p.personality == Personality::Balanced && fits_game(t, p)
        });
        fill(&mut team, order, team_size, |t, p| {
            t.count_personality(p.personality) < rules.max_for(p.personality) && fits_game(t, p)
        });
        fill(&mut team, order, team_size, |_, _| true);
        team
    }
}

fn has_leader(players: &[Arc<Player>]) -> bool {
    players.iter().any(|p| p.personality == Personality::Leader)
}

/// Adds players from `order`, front to back, while `accept` holds and the
/// team has room.
fn fill(team: &mut Team, order: &[Arc<Player>], team_size: usize, accept: impl Fn(&Team, &Player) -> bool) {
    for player in order {
        if team.len() >= team_size {
            return;
        }
        if !team.contains(&player.id) && accept(&*team, player) {
            team.add_member(Arc::clone(player));
        }
    }
}

/// One player per team per pass, in team order, until `supply` runs out or
/// no team accepts.
fn round_robin<I>(teams: &mut [Team], supply: &mut std::iter::Peekable<I>, has_room: impl Fn(&Team) -> bool)
where
    I: Iterator<Item = Arc<Player>>,
{
    loop {
        let mut placed = false;
        for team in teams.iter_mut() {
            if supply.peek().is_none() {
                return;
            }
            if has_room(&*team) {
                if let Some(p) = supply.next() {
                    team.add_member(p);
                    placed = true;
                }
            }
        }
        if !placed {
            return;
        }
    }
}

/// Removes the candidate's members from `available` if all are still there.
fn commit(candidate: &Team, available: &mut Vec<Arc<Player>>) -> bool {
    let all_present = candidate
        .members
        .iter()
        .all(|m| available.iter().any(|p| p.id == m.id));
    if !all_present {
        return false;
    }
    available.retain(|p| !candidate.contains(&p.id));
    true
}
