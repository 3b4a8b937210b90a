//! Built-in priority rules.
//!
//! All rules return lower scores for players that should be placed first.

use super::{PoolContext, PriorityRule, RuleScore};
use crate::models::{Personality, Player};

/// Role scarcity.
///
/// Players whose preferred role is rare in the pool come first: without
/// them the remaining candidates cannot reach the role-diversity minimum.
/// Score is `-10 × (1 − share)`, so a unique role scores close to `-10`.
#[derive(Debug, Clone, Copy)]
pub struct RoleScarcity;

impl PriorityRule for RoleScarcity {
    fn name(&self) -> &'static str {
        "SCARCITY"
    }

    fn evaluate(&self, player: &Player, context: &PoolContext) -> RuleScore {
        -10.0 * (1.0 - context.role_share(player.role))
    }

    fn description(&self) -> &'static str {
        "Rarest Role First"
    }
}

/// Personality weight: Leader > Thinker > Balanced.
#[derive(Debug, Clone, Copy)]
pub struct PersonalityWeight;

impl PersonalityWeight {
    /// Weight of a personality (higher = placed earlier).
    pub fn weight(personality: Personality) -> f64 {
        match personality {
            Personality::Leader => 30.0,
            Personality::Thinker => 20.0,
            Personality::Balanced => 10.0,
        }
    }
}

impl PriorityRule for PersonalityWeight {
    fn name(&self) -> &'static str {
        "PERSONALITY"
    }

    fn evaluate(&self, player: &Player, _context: &PoolContext) -> RuleScore {
        -Self::weight(player.personality)
    }

    fn description(&self) -> &'static str {
        "Scarcest Personality First"
    }
}

/// Highest skill first (linear).
#[derive(Debug, Clone, Copy)]
pub struct SkillLevel;

impl PriorityRule for SkillLevel {
    fn name(&self) -> &'static str {
        "SKILL"
    }

    fn evaluate(&self, player: &Player, _context: &PoolContext) -> RuleScore {
        -f64::from(player.skill)
    }

    fn description(&self) -> &'static str {
        "Highest Skill First"
    }
}
