//! Weighted rule engine for pool ordering.
//!
//! Sums weighted rule scores per player and sorts ascending, so the player
//! with the lowest total is retried first. Equal totals fall back to player
//! ID, which keeps the order independent of the input order.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, PoolContext, PriorityRule};
use crate::models::Player;

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn PriorityRule>,
    weight: f64,
}

/// Weighted sum of priority rules with an ID tie-break.
///
/// # Example
/// ```
/// use u_teams::priority::{rules, PoolContext, RuleEngine};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::PersonalityWeight)
///     .with_weighted_rule(rules::SkillLevel, 0.5);
/// assert!(engine.sort(&[], &PoolContext::default()).is_empty());
/// ```
#[derive(Clone, Default)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
}

impl RuleEngine {
    /// Creates an empty engine. With no rules, players sort by ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordering used by the repair loop: role scarcity, personality
    /// weight and skill, equally weighted.
    pub fn repair_priority() -> Self {
        Self::new()
            .with_weighted_rule(rules::RoleScarcity, 1.0)
            .with_weighted_rule(rules::PersonalityWeight, 1.0)
            .with_weighted_rule(rules::SkillLevel, 1.0)
    }

    /// Adds a rule with weight 1.0.
    pub fn with_rule<R: PriorityRule + 'static>(self, rule: R) -> Self {
        self.with_weighted_rule(rule, 1.0)
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: PriorityRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Combined score of one player (lower = placed earlier).
    pub fn score(&self, player: &Player, context: &PoolContext) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(player, context) * wr.weight)
            .sum()
    }

    /// Indices into `players`, highest priority first.
    pub fn sort_indices(&self, players: &[Arc<Player>], context: &PoolContext) -> Vec<usize> {
        let scores: Vec<f64> = players.iter().map(|p| self.score(p, context)).collect();
        let mut indices: Vec<usize> = (0..players.len()).collect();
        indices.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(Ordering::Equal)
                .then_with(|| players[a].id.cmp(&players[b].id))
        });
        indices
    }

    /// Returns the players reordered by priority.
    pub fn sort(&self, players: &[Arc<Player>], context: &PoolContext) -> Vec<Arc<Player>> {
        self.sort_indices(players, context)
            .into_iter()
            .map(|i| Arc::clone(&players[i]))
            .collect()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Game, Personality, Role};

    fn make_player(id: &str, skill: u8, personality: Personality, role: Role) -> Arc<Player> {
        Arc::new(Player::new(id, skill, personality, role, Game::Fifa))
    }

    #[test]
    fn test_personality_ordering() {
        let players = vec![
            make_player("bal", 9, Personality::Balanced, Role::Defender),
            make_player("lead", 3, Personality::Leader, Role::Defender),
            make_player("think", 5, Personality::Thinker, Role::Defender),
        ];
        let ctx = PoolContext::from_players(&players);
        let engine = RuleEngine::new().with_rule(rules::PersonalityWeight);

        let indices = engine.sort_indices(&players, &ctx);
        assert_eq!(players[indices[0]].id, "lead");
        assert_eq!(players[indices[1]].id, "think");
        assert_eq!(players[indices[2]].id, "bal");
    }

    #[test]
    fn test_scarcity_ranks_rare_role_first() {
        // Two Defenders and one Coordinator; scarcity favours the Coordinator
        let players = vec![
            make_player("D1", 6, Personality::Balanced, Role::Defender),
            make_player("D2", 6, Personality::Balanced, Role::Defender),
            make_player("C1", 6, Personality::Balanced, Role::Coordinator),
        ];
        let ctx = PoolContext::from_players(&players);
        let indices = RuleEngine::repair_priority().sort_indices(&players, &ctx);
        assert_eq!(indices[0], 2);
    }

    #[test]
    fn test_repair_priority_leader_first() {
        let players = vec![
            make_player("B", 10, Personality::Balanced, Role::Coordinator),
            make_player("L", 1, Personality::Leader, Role::Defender),
            make_player("T", 10, Personality::Thinker, Role::Attacker),
        ];
        let ctx = PoolContext::from_players(&players);
        let sorted = RuleEngine::repair_priority().sort(&players, &ctx);
        let ids: Vec<_> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["L", "T", "B"]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let players = vec![
            make_player("B", 5, Personality::Balanced, Role::Defender),
            make_player("A", 5, Personality::Balanced, Role::Defender),
        ];
        let ctx = PoolContext::from_players(&players);
        let indices = RuleEngine::repair_priority().sort_indices(&players, &ctx);
        assert_eq!(players[indices[0]].id, "A");
    }

    #[test]
    fn test_weighted_score() {
        let p = make_player("X", 7, Personality::Thinker, Role::Defender);
        let ctx = PoolContext::from_players(std::slice::from_ref(&p));
        let engine = RuleEngine::new()
            .with_rule(rules::SkillLevel)
            .with_weighted_rule(rules::PersonalityWeight, 0.5);

        // -7 + 0.5 * -20
        assert!((engine.score(&p, &ctx) + 17.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_pool() {
        let ctx = PoolContext::default();
        assert!(RuleEngine::repair_priority().sort_indices(&[], &ctx).is_empty());
    }
}
