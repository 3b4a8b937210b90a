//! Constraint-aware team formation.
//!
//! Splits a roster of rated players into fixed-size teams that satisfy
//! composition rules (Leader and Thinker counts, role diversity, per-game
//! caps) while keeping team skill averages close.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Player`, `Team`, `RuleConfig`,
//!   `ViolationReport`, survey classification
//! - **`validation`**: Roster integrity, team-size feasibility, supply advisories
//! - **`evaluation`**: Per-team rule checks, batch evaluation in parallel
//! - **`priority`**: Rule engine ordering the repair pool
//! - **`arena`**: Per-team locked storage with an ordered pair-lock swap
//! - **`balancer`**: Constraint balancer, skill tightener, formation KPIs
//! - **`builder`**: Personality-seeded building with a bounded repair loop
//! - **`service`**: `TeamService::create_teams` entry point
//!
//! # Pipeline
//!
//! ```text
//! players ─▶ validate ─▶ seed ─▶ tighten ─▶ repair ─▶ balance ─▶ tighten ─▶ teams
//! ```
//!
//! Every stage is best-effort: an infeasible roster yields fewer valid
//! teams, never an error. Only malformed requests fail.
//!
//! # References
//!
//! - Lourenço, Martin & Stützle (2003), "Iterated Local Search"
//! - Hoos & Stützle (2004), "Stochastic Local Search: Foundations and Applications"

pub mod arena;
pub mod balancer;
pub mod builder;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod priority;
pub mod service;
pub mod validation;

pub use error::FormationError;
pub use service::{Formation, ServiceConfig, TeamService};
