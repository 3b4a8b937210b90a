//! Local-search passes over formed teams.
//!
//! # Passes
//!
//! - [`ConstraintBalancer`]: deterministic best-swap search minimizing
//!   weighted rule violations plus an excess skill-spread penalty.
//! - [`SkillTightener`]: randomized, multi-worker same-personality swaps
//!   narrowing the spread of team skill averages.
//!
//! Both mutate teams only through member exchanges, so team sizes and the
//! set of placed players never change.
//!
//! # Reference
//! Lourenço, Martin & Stützle (2003), "Iterated Local Search",
//! *Handbook of Metaheuristics*, pp. 320-353.

mod constraint;
mod kpi;
mod skill;

pub use constraint::{BalanceOutcome, ConstraintBalancer, StopReason, SwapCandidate};
pub use kpi::{skill_range, FormationKpi};
pub use skill::{SkillTightener, TightenOutcome, TightenStop, TightenerConfig};
