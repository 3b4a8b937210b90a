//! Formation entry point.
//!
//! [`TeamService::create_teams`] validates a request, reports supply
//! advisories, and runs the builder (seeding, repair, balancing and
//! tightening). A fresh worker pool is started per run and shut down when
//! the run returns.

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::balancer::{skill_range, FormationKpi, SkillTightener, TightenerConfig};
use crate::builder::{BuilderConfig, TeamBuilder};
use crate::error::FormationError;
use crate::evaluation::TeamEvaluator;
use crate::models::{Player, RuleConfig, Team};
use crate::validation::{check_dataset, check_team_size, validate_roster, ValidationError};

/// Settings for a formation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Composition rules.
    pub rules: RuleConfig,
    /// Builder parameters.
    pub builder: BuilderConfig,
    /// Skill tightener parameters.
    pub tightener: TightenerConfig,
}

/// Result of one formation run.
#[derive(Debug, Clone)]
pub struct Formation {
    /// Every formed team, valid or not.
    pub teams: Vec<Team>,
    /// Supply advisories raised before formation.
    pub advisories: Vec<ValidationError>,
    /// Requested team size.
    pub team_size: usize,
    /// Number of players offered.
    pub roster_size: usize,
    evaluator: TeamEvaluator,
}

impl Formation {
    /// Teams that pass every rule with exactly the requested size.
    pub fn valid_teams(&self) -> Vec<Team> {
        self.evaluator.valid_teams(&self.teams, self.team_size)
    }

    /// Quality indicators of this formation.
    pub fn kpi(&self) -> FormationKpi {
        FormationKpi::calculate(&self.teams, &self.evaluator, self.team_size, self.roster_size)
    }

    /// One line per team, followed by its violations if any.
    pub fn summary(&self) -> String {
        let mut lines = Vec::with_capacity(self.teams.len());
        for team in &self.teams {
            lines.push(team.to_string());
            let report = self.evaluator.evaluate(team);
            for message in report.messages() {
                lines.push(format!("  ! {message}"));
            }
        }
        lines.join("\n")
    }
}

/// Team formation service.
///
/// # Example
///
/// ```
/// use u_teams::models::{Game, Personality, Player, Role};
/// use u_teams::service::TeamService;
///
/// let players = vec![
///     Player::new("1", 7, Personality::Leader, Role::Defender, Game::Valorant),
///     Player::new("2", 8, Personality::Thinker, Role::Supporter, Game::Csgo),
///     Player::new("3", 7, Personality::Balanced, Role::Strategist, Game::Valorant),
/// ];
///
/// let formation = TeamService::new().create_teams(&players, 3).unwrap();
/// assert_eq!(formation.valid_teams().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TeamService {
    config: ServiceConfig,
}

impl TeamService {
    /// Creates a service with default rules and parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service from a full configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Sets the composition rules.
    pub fn with_rules(mut self, rules: RuleConfig) -> Self {
        self.config.rules = rules;
        self
    }

    /// Sets the builder parameters.
    pub fn with_builder_config(mut self, builder: BuilderConfig) -> Self {
        self.config.builder = builder;
        self
    }

    /// Sets the tightener parameters.
    pub fn with_tightener_config(mut self, tightener: TightenerConfig) -> Self {
        self.config.tightener = tightener;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Forms teams of `team_size` from `players`.
    ///
    /// # Errors
    /// - [`FormationError::InvalidRules`] if the rules are inconsistent
    /// - [`FormationError::InvalidRoster`] for duplicate or empty IDs and
    ///   out-of-range skills
    /// - [`FormationError::EmptyRoster`], [`FormationError::TeamSizeTooSmall`]
    ///   or [`FormationError::TeamSizeTooLarge`] for an unusable size
    /// - [`FormationError::WorkerPool`] if the tightener pool cannot start
    ///
    /// An infeasible dataset is not an error: the run proceeds and the
    /// result simply holds fewer valid teams.
    pub fn create_teams(&self, players: &[Player], team_size: usize) -> Result<Formation, FormationError> {
        let rules = self.config.rules;
        rules.validate()?;
        validate_roster(players).map_err(FormationError::InvalidRoster)?;
        check_team_size(players, team_size, &rules)?;

        let advisories = check_dataset(players, team_size, &rules);
        for advisory in &advisories {
            warn!("Dataset advisory: {}", advisory.message);
        }

        let tightener = SkillTightener::new(self.config.tightener.clone())?;
        let builder = TeamBuilder::new(rules, self.config.builder.clone(), tightener);

        let roster: Vec<Arc<Player>> = players.iter().cloned().map(Arc::new).collect();
        let teams = builder.build(&roster, team_size);

        let formation = Formation {
            teams,
            advisories,
            team_size,
            roster_size: players.len(),
            evaluator: *builder.evaluator(),
        };
        info!(
            "Formation complete: {} teams, {} valid, skill range {:.2}",
            formation.teams.len(),
            formation.valid_teams().len(),
            skill_range(&formation.teams)
        );
        Ok(formation)
    }
}
