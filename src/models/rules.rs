//! Team composition rules.
//!
//! Immutable thresholds that every valid team must satisfy. Balanced
//! players are uncapped in both directions.

use serde::{Deserialize, Serialize};

use super::Personality;
use crate::error::FormationError;

/// Composition thresholds for a valid team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Maximum members sharing one game preference.
    pub preference_cap: usize,
    /// Minimum number of distinct preferred roles.
    pub min_roles: usize,
    /// Minimum Leaders per team.
    pub min_leaders: usize,
    /// Maximum Leaders per team.
    pub max_leaders: usize,
    /// Minimum Thinkers per team.
    pub min_thinkers: usize,
    /// Maximum Thinkers per team.
    pub max_thinkers: usize,
}

impl Default for RuleConfig {
    /// One Leader, one or two Thinkers, three distinct roles and at most
    /// two members per game.
    fn default() -> Self {
        Self {
            preference_cap: 2,
            min_roles: 3,
            min_leaders: 1,
            max_leaders: 1,
            min_thinkers: 1,
            max_thinkers: 2,
        }
    }
}

impl RuleConfig {
    /// Creates a validated rule set.
    ///
    /// # Errors
    /// [`FormationError::InvalidRules`] if a minimum exceeds its maximum or
    /// the preference cap / role minimum is zero.
    pub fn new(
        preference_cap: usize,
        min_roles: usize,
        min_leaders: usize,
        max_leaders: usize,
        min_thinkers: usize,
        max_thinkers: usize,
    ) -> Result<Self, FormationError> {
        let rules = Self {
            preference_cap,
            min_roles,
            min_leaders,
            max_leaders,
            min_thinkers,
            max_thinkers,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Checks internal consistency. Deserialized configs should be passed
    /// through this before use.
    pub fn validate(&self) -> Result<(), FormationError> {
        if self.min_leaders > self.max_leaders {
            return Err(FormationError::InvalidRules(format!(
                "min_leaders ({}) exceeds max_leaders ({})",
                self.min_leaders, self.max_leaders
            )));
        }
        if self.min_thinkers > self.max_thinkers {
            return Err(FormationError::InvalidRules(format!(
                "min_thinkers ({}) exceeds max_thinkers ({})",
                self.min_thinkers, self.max_thinkers
            )));
        }
        if self.preference_cap < 1 || self.min_roles < 1 {
            return Err(FormationError::InvalidRules(
                "preference_cap and min_roles must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum allowed members of a personality (`usize::MAX` for Balanced).
    pub fn max_for(&self, personality: Personality) -> usize {
        match personality {
            Personality::Leader => self.max_leaders,
            Personality::Thinker => self.max_thinkers,
            Personality::Balanced => usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let r = RuleConfig::default();
        assert_eq!(r.preference_cap, 2);
        assert_eq!(r.min_roles, 3);
        assert_eq!(r.max_for(Personality::Leader), 1);
        assert_eq!(r.max_for(Personality::Thinker), 2);
        assert_eq!(r.max_for(Personality::Balanced), usize::MAX);
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        assert!(RuleConfig::new(2, 3, 2, 1, 1, 2).is_err());
        assert!(RuleConfig::new(2, 3, 1, 1, 3, 2).is_err());
        assert!(RuleConfig::new(0, 3, 1, 1, 1, 2).is_err());
        assert!(RuleConfig::new(2, 0, 1, 1, 1, 2).is_err());
        assert!(RuleConfig::new(3, 2, 1, 2, 0, 3).is_ok());
    }

    #[test]
    fn test_rules_serde_roundtrip() {
        let r = RuleConfig::new(3, 2, 1, 2, 0, 3).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        let back: RuleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        assert!(back.validate().is_ok());
    }
}
