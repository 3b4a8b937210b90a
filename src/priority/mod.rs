//! Priority rules and rule engine for the repair pool.
//!
//! When invalid teams are dissolved into a residual pool, the most
//! constraint-critical players are retried first. Priority combines role
//! scarcity, personality weight and skill as a weighted sum.
//!
//! # Usage
//!
//! ```
//! use u_teams::priority::{PoolContext, RuleEngine};
//!
//! let engine = RuleEngine::repair_priority();
//! let context = PoolContext::from_players(&[]);
//! assert!(engine.sort_indices(&[], &context).is_empty());
//! ```

mod context;
mod engine;
pub mod rules;

pub use context::PoolContext;
pub use engine::RuleEngine;

use crate::models::Player;
use std::fmt::Debug;

/// Score returned by a priority rule.
///
/// Lower scores = higher priority (retried first).
pub type RuleScore = f64;

/// A rule that evaluates how urgently a pooled player should be placed.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for players that should be placed first.
pub trait PriorityRule: Send + Sync + Debug {
    /// Rule name (e.g., "SCARCITY").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a player given the current pool.
    fn evaluate(&self, player: &Player, context: &PoolContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
