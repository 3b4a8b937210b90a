//! Input validation for formation requests.
//!
//! Checks structural integrity of the roster and the feasibility of a
//! requested team size before any formation work starts. Detects:
//! - Duplicate or empty player IDs
//! - Skill levels outside the accepted bounds
//! - Team sizes below the minimum or above what the roster supports
//!
//! Supply shortfalls that make some teams impossible to fill validly are
//! reported as advisories ([`check_dataset`]); they never block a run.

use crate::error::FormationError;
use crate::models::{Game, Personality, Player, RuleConfig};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{info, warn};

/// Smallest team size the role-diversity rule can be meaningful for.
pub const MIN_TEAM_SIZE: usize = 3;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error or advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two players share the same ID.
    DuplicateId,
    /// A player has an empty ID.
    EmptyId,
    /// A skill level lies outside `Player::MIN_SKILL..=Player::MAX_SKILL`.
    SkillOutOfRange,
    /// Survey answers are malformed.
    InvalidSurvey,
    /// More Leaders than all teams together may hold.
    LeaderSurplus,
    /// Fewer Leaders than all teams together require.
    LeaderShortage,
    /// More Thinkers than all teams together may hold.
    ThinkerSurplus,
    /// Fewer Thinkers than all teams together require.
    ThinkerShortage,
    /// The roster has fewer distinct roles than one team requires.
    LowRoleSupply,
    /// More players share a game than all teams together may hold.
    PreferenceSurplus,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether this is a non-fatal supply advisory.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self.kind,
            ValidationErrorKind::LeaderSurplus
                | ValidationErrorKind::LeaderShortage
                | ValidationErrorKind::ThinkerSurplus
                | ValidationErrorKind::ThinkerShortage
                | ValidationErrorKind::LowRoleSupply
                | ValidationErrorKind::PreferenceSurplus
        )
    }
}

/// Validates the roster.
///
/// Checks:
/// 1. No empty player IDs
/// 2. No duplicate player IDs
/// 3. Every skill level within bounds
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_roster(players: &[Player]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for p in players {
        if p.id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                format!("Player '{}' has an empty ID", p.name),
            ));
        } else if !ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate player ID: {}", p.id),
            ));
        }

        if !p.has_valid_skill() {
            errors.push(ValidationError::new(
                ValidationErrorKind::SkillOutOfRange,
                format!(
                    "Player '{}' has skill {} outside {}..={}",
                    p.id,
                    p.skill,
                    Player::MIN_SKILL,
                    Player::MAX_SKILL
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Number of teams a roster splits into: `ceil(players / team_size)`.
pub fn team_count(player_count: usize, team_size: usize) -> usize {
    if team_size == 0 {
        return 0;
    }
    player_count.div_ceil(team_size)
}

/// Largest team size the roster can support.
///
/// Zero when the roster lacks the per-team minimum of Leaders or Thinkers
/// or the minimum number of distinct roles. Otherwise one team can hold
/// at most `preference_cap` players of each game, so the bound is the sum
/// over games of `min(count, cap)`, capped at the roster size.
pub fn max_team_size(players: &[Player], rules: &RuleConfig) -> usize {
    let leaders = count_personality(players, Personality::Leader);
    let thinkers = count_personality(players, Personality::Thinker);
    let roles: BTreeSet<_> = players.iter().map(|p| p.role).collect();

    if leaders < rules.min_leaders.max(1)
        || thinkers < rules.min_thinkers
        || roles.len() < rules.min_roles
    {
        return 0;
    }

    let by_game: usize = game_counts(players)
        .values()
        .map(|&count| count.min(rules.preference_cap))
        .sum();

    by_game.min(players.len())
}

/// Rejects team sizes that cannot produce a single valid team.
///
/// # Errors
/// - [`FormationError::EmptyRoster`] for an empty roster
/// - [`FormationError::TeamSizeTooSmall`] below [`MIN_TEAM_SIZE`]
/// - [`FormationError::TeamSizeTooLarge`] above [`max_team_size`]
pub fn check_team_size(
    players: &[Player],
    team_size: usize,
    rules: &RuleConfig,
) -> Result<(), FormationError> {
    if players.is_empty() {
        return Err(FormationError::EmptyRoster);
    }
    if team_size < MIN_TEAM_SIZE {
        return Err(FormationError::TeamSizeTooSmall {
            size: team_size,
            min: MIN_TEAM_SIZE,
        });
    }
    let max = max_team_size(players, rules);
    if team_size > max {
        return Err(FormationError::TeamSizeTooLarge {
            size: team_size,
            max,
        });
    }
    Ok(())
}

/// Compares roster supply against the demand of `ceil(N / team_size)`
/// teams and returns every shortfall or surplus as an advisory.
///
/// Advisories are logged at `warn`; formation proceeds regardless.
pub fn check_dataset(players: &[Player], team_size: usize, rules: &RuleConfig) -> Vec<ValidationError> {
    let teams = team_count(players.len(), team_size);
    info!(
        "Checking dataset: {} players, team size {}, {} teams",
        players.len(),
        team_size,
        teams
    );

    let mut advisories = Vec::new();

    let leaders = count_personality(players, Personality::Leader);
    let thinkers = count_personality(players, Personality::Thinker);

    if leaders > teams * rules.max_leaders {
        advisories.push(ValidationError::new(
            ValidationErrorKind::LeaderSurplus,
            format!(
                "Too many LEADERS ({leaders}). Max per team: {}",
                rules.max_leaders
            ),
        ));
    }
    if leaders < teams * rules.min_leaders {
        advisories.push(ValidationError::new(
            ValidationErrorKind::LeaderShortage,
            format!(
                "Not enough LEADERS ({leaders}) for {teams} teams. Min per team: {}",
                rules.min_leaders
            ),
        ));
    }
    if thinkers > teams * rules.max_thinkers {
        advisories.push(ValidationError::new(
            ValidationErrorKind::ThinkerSurplus,
            format!(
                "Too many THINKERS ({thinkers}). Max per team: {}",
                rules.max_thinkers
            ),
        ));
    }
    if thinkers < teams * rules.min_thinkers {
        advisories.push(ValidationError::new(
            ValidationErrorKind::ThinkerShortage,
            format!(
                "Not enough THINKERS ({thinkers}) for {teams} teams. Min per team: {}",
                rules.min_thinkers
            ),
        ));
    }

    let unique_roles = players.iter().map(|p| p.role).collect::<BTreeSet<_>>().len();
    if unique_roles < rules.min_roles {
        advisories.push(ValidationError::new(
            ValidationErrorKind::LowRoleSupply,
            format!(
                "Not enough unique roles. Required: {}, found: {unique_roles}",
                rules.min_roles
            ),
        ));
    }

    for (game, count) in game_counts(players) {
        if count > teams * rules.preference_cap {
            advisories.push(ValidationError::new(
                ValidationErrorKind::PreferenceSurplus,
                format!(
                    "Too many players for game '{game}' ({count}). Max per team: {}",
                    rules.preference_cap
                ),
            ));
        }
    }

    if advisories.is_empty() {
        info!("Dataset check completed: no warnings");
    } else {
        warn!("Dataset check found {} warning(s)", advisories.len());
        for a in &advisories {
            warn!("{}", a.message);
        }
    }

    advisories
}

fn count_personality(players: &[Player], personality: Personality) -> usize {
    players.iter().filter(|p| p.personality == personality).count()
}

fn game_counts(players: &[Player]) -> BTreeMap<Game, usize> {
    let mut counts = BTreeMap::new();
    for p in players {
        *counts.entry(p.game).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Personality as P, Role};

    fn player(id: &str, skill: u8, personality: P, role: Role, game: Game) -> Player {
        Player::new(id, skill, personality, role, game)
    }

    fn sample_roster() -> Vec<Player> {
        vec![
            player("1", 7, P::Leader, Role::Strategist, Game::Valorant),
            player("2", 8, P::Thinker, Role::Supporter, Game::Csgo),
            player("3", 7, P::Balanced, Role::Coordinator, Game::Valorant),
            player("4", 6, P::Leader, Role::Defender, Game::Fifa),
            player("5", 5, P::Thinker, Role::Attacker, Game::Chess),
            player("6", 9, P::Balanced, Role::Defender, Game::Dota2),
        ]
    }

    #[test]
    fn test_valid_roster() {
        assert!(validate_roster(&sample_roster()).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let mut roster = sample_roster();
        roster.push(player("1", 5, P::Balanced, Role::Defender, Game::Fifa));
        let errors = validate_roster(&roster).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
    }

    #[test]
    fn test_multiple_errors_reported() {
        let roster = vec![
            player("", 5, P::Leader, Role::Defender, Game::Fifa),
            player("x", 0, P::Leader, Role::Defender, Game::Fifa),
            player("x", 12, P::Leader, Role::Defender, Game::Fifa),
        ];
        let errors = validate_roster(&roster).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::EmptyId));
        assert!(kinds.contains(&ValidationErrorKind::DuplicateId));
        assert_eq!(
            kinds.iter().filter(|k| **k == ValidationErrorKind::SkillOutOfRange).count(),
            2
        );
    }

    #[test]
    fn test_team_count() {
        assert_eq!(team_count(10, 3), 4);
        assert_eq!(team_count(9, 3), 3);
        assert_eq!(team_count(0, 3), 0);
        assert_eq!(team_count(5, 0), 0);
    }

    #[test]
    fn test_max_team_size() {
        let rules = RuleConfig::default();
        // Valorant 2, Csgo 1, Fifa 1, Chess 1, Dota2 1 -> 6
        assert_eq!(max_team_size(&sample_roster(), &rules), 6);

        let no_leaders: Vec<_> = sample_roster()
            .into_iter()
            .filter(|p| p.personality != P::Leader)
            .collect();
        assert_eq!(max_team_size(&no_leaders, &rules), 0);
    }

    #[test]
    fn test_max_team_size_preference_cap() {
        let rules = RuleConfig::default();
        let roster = vec![
            player("1", 7, P::Leader, Role::Strategist, Game::Csgo),
            player("2", 8, P::Thinker, Role::Supporter, Game::Csgo),
            player("3", 7, P::Balanced, Role::Coordinator, Game::Csgo),
            player("4", 7, P::Balanced, Role::Defender, Game::Csgo),
        ];
        assert_eq!(max_team_size(&roster, &rules), 2);
    }

    #[test]
    fn test_check_team_size() {
        let rules = RuleConfig::default();
        let roster = sample_roster();

        assert!(check_team_size(&roster, 3, &rules).is_ok());
        assert!(matches!(
            check_team_size(&roster, 2, &rules),
            Err(FormationError::TeamSizeTooSmall { size: 2, min: 3 })
        ));
        assert!(matches!(
            check_team_size(&roster, 7, &rules),
            Err(FormationError::TeamSizeTooLarge { size: 7, max: 6 })
        ));
        assert!(matches!(
            check_team_size(&[], 3, &rules),
            Err(FormationError::EmptyRoster)
        ));
    }

    #[test]
    fn test_role_advisory() {
        let rules = RuleConfig::default();
        let roster = vec![
            player("A", 6, P::Leader, Role::Defender, Game::Csgo),
            player("B", 6, P::Thinker, Role::Defender, Game::Csgo),
        ];
        let advisories = check_dataset(&roster, 3, &rules);
        assert!(advisories
            .iter()
            .any(|a| a.kind == ValidationErrorKind::LowRoleSupply
                && a.message.contains("Not enough unique roles")));
        assert!(advisories.iter().all(ValidationError::is_advisory));
    }

    #[test]
    fn test_supply_advisories() {
        let rules = RuleConfig::default();
        // 6 players, size 3 -> 2 teams; 3 leaders > 2, 0 thinkers < 2, 5 Csgo > 4
        let roster = vec![
            player("1", 5, P::Leader, Role::Defender, Game::Csgo),
            player("2", 5, P::Leader, Role::Attacker, Game::Csgo),
            player("3", 5, P::Leader, Role::Supporter, Game::Csgo),
            player("4", 5, P::Balanced, Role::Defender, Game::Csgo),
            player("5", 5, P::Balanced, Role::Defender, Game::Csgo),
            player("6", 5, P::Balanced, Role::Defender, Game::Fifa),
        ];
        let kinds: Vec<_> = check_dataset(&roster, 3, &rules)
            .into_iter()
            .map(|a| a.kind)
            .collect();
        assert!(kinds.contains(&ValidationErrorKind::LeaderSurplus));
        assert!(kinds.contains(&ValidationErrorKind::ThinkerShortage));
        assert!(kinds.contains(&ValidationErrorKind::PreferenceSurplus));
        assert!(!kinds.contains(&ValidationErrorKind::LowRoleSupply));
    }

    #[test]
    fn test_clean_dataset_has_no_advisories() {
        let rules = RuleConfig::default();
        assert!(check_dataset(&sample_roster(), 3, &rules).is_empty());
    }
}
