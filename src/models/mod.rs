//! Team formation domain models.
//!
//! Provides the core data types for representing formation problems and
//! their results: rated players, teams of shared player references, the
//! composition rules, and derived violation reports.
//!
//! # Domain Mappings
//!
//! | u-teams | Esports club | Classroom | Hackathon |
//! |---------|--------------|-----------|-----------|
//! | Player | Member | Student | Participant |
//! | Personality | Survey type | Work style | Profile |
//! | Role | In-game role | Project role | Discipline |
//! | Game | Title | Topic | Track |

mod player;
mod report;
mod rules;
mod team;

pub use player::{Game, ParseEnumError, Personality, Player, Role, SurveyScore};
pub use report::{ViolationKind, ViolationReport};
pub use rules::RuleConfig;
pub use team::Team;
