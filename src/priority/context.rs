//! Pool context for priority rule evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Player, Role};

/// Snapshot of the residual pool passed to priority rules.
#[derive(Debug, Clone, Default)]
pub struct PoolContext {
    /// Number of pooled players.
    pub pool_size: usize,
    /// Pooled players per preferred role.
    pub role_counts: HashMap<Role, usize>,
}

impl PoolContext {
    /// Builds the context from the pooled players.
    pub fn from_players(players: &[Arc<Player>]) -> Self {
        let mut ctx = Self {
            pool_size: players.len(),
            ..Default::default()
        };
        for p in players {
            *ctx.role_counts.entry(p.role).or_insert(0) += 1;
        }
        ctx
    }

    /// Fraction of the pool sharing a role (`0.0` for an empty pool).
    pub fn role_share(&self, role: Role) -> f64 {
        if self.pool_size == 0 {
            return 0.0;
        }
        self.role_counts.get(&role).copied().unwrap_or(0) as f64 / self.pool_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Game, Personality};

    #[test]
    fn test_context_counts() {
        let players: Vec<_> = vec![
            Player::new("1", 5, Personality::Leader, Role::Defender, Game::Fifa),
            Player::new("2", 5, Personality::Balanced, Role::Defender, Game::Fifa),
            Player::new("3", 5, Personality::Balanced, Role::Attacker, Game::Fifa),
            Player::new("4", 5, Personality::Thinker, Role::Defender, Game::Fifa),
        ]
        .into_iter()
        .map(Arc::new)
        .collect();

        let ctx = PoolContext::from_players(&players);
        assert_eq!(ctx.pool_size, 4);
        assert!((ctx.role_share(Role::Defender) - 0.75).abs() < 1e-10);
        assert!((ctx.role_share(Role::Coordinator)).abs() < 1e-10);
        assert_eq!(ctx.role_counts.get(&Role::Attacker), Some(&1));
    }

    #[test]
    fn test_empty_context() {
        let ctx = PoolContext::from_players(&[]);
        assert_eq!(ctx.role_share(Role::Defender), 0.0);
    }
}
