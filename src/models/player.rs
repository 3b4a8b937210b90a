//! Player model.
//!
//! A player is a rated individual to be placed into exactly one team.
//! Players are immutable for the duration of a formation run; teams hold
//! shared references (`Arc<Player>`) rather than copies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::{ValidationError, ValidationErrorKind};

/// A rated individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Skill level, `MIN_SKILL..=MAX_SKILL`.
    pub skill: u8,
    /// Personality category derived from the survey score.
    pub personality: Personality,
    /// Preferred in-team role.
    pub role: Role,
    /// Preferred activity (game).
    pub game: Game,
}

impl Player {
    /// Lowest accepted skill level.
    pub const MIN_SKILL: u8 = 1;
    /// Highest accepted skill level.
    pub const MAX_SKILL: u8 = 10;

    /// Creates a player with the attributes the formation engine reads.
    pub fn new(
        id: impl Into<String>,
        skill: u8,
        personality: Personality,
        role: Role,
        game: Game,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: String::new(),
            skill,
            personality,
            role,
            game,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the contact address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Whether the skill level lies within the accepted bounds.
    #[inline]
    pub fn has_valid_skill(&self) -> bool {
        (Self::MIN_SKILL..=Self::MAX_SKILL).contains(&self.skill)
    }

    /// Name if set, otherwise the id.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Three-valued personality classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Personality {
    /// Takes the lead; teams need a bounded number.
    Leader,
    /// Analytical; teams need a bounded number.
    Thinker,
    /// Uncapped filler category.
    Balanced,
}

impl Personality {
    /// All categories, in seeding order.
    pub const ALL: [Personality; 3] = [Personality::Leader, Personality::Thinker, Personality::Balanced];

    /// Classifies a total survey score.
    ///
    /// `>= 90` is a Leader, `>= 70` is Balanced, anything lower a Thinker.
    pub fn from_score(total_score: u32) -> Self {
        if total_score >= 90 {
            Personality::Leader
        } else if total_score >= 70 {
            Personality::Balanced
        } else {
            Personality::Thinker
        }
    }
}

/// Preferred role within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Strategist,
    Attacker,
    Defender,
    Supporter,
    Coordinator,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Strategist,
        Role::Attacker,
        Role::Defender,
        Role::Supporter,
        Role::Coordinator,
    ];
}

/// Preferred activity. The per-preference cap limits how many members of
/// one team may share a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Game {
    Basketball,
    Chess,
    Csgo,
    Dota2,
    Fifa,
    Valorant,
}

impl Game {
    pub const ALL: [Game; 6] = [
        Game::Basketball,
        Game::Chess,
        Game::Csgo,
        Game::Dota2,
        Game::Fifa,
        Game::Valorant,
    ];
}

/// Failure to parse an enumeration from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    /// Enumeration being parsed ("personality", "role", "game").
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

macro_rules! enum_text {
    ($ty:ty, $kind:literal, { $($variant:path => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($variant => $text),+
                };
                f.write_str(text)
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = normalize(s);
                $(
                    if key == normalize($text) {
                        return Ok($variant);
                    }
                )+
                Err(ParseEnumError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

enum_text!(Personality, "personality", {
    Personality::Leader => "Leader",
    Personality::Thinker => "Thinker",
    Personality::Balanced => "Balanced",
});

enum_text!(Role, "role", {
    Role::Strategist => "STRATEGIST",
    Role::Attacker => "ATTACKER",
    Role::Defender => "DEFENDER",
    Role::Supporter => "SUPPORTER",
    Role::Coordinator => "COORDINATOR",
});

enum_text!(Game, "game", {
    Game::Basketball => "BASKETBALL",
    Game::Chess => "CHESS",
    Game::Csgo => "CSGO",
    Game::Dota2 => "DOTA2",
    Game::Fifa => "FIFA",
    Game::Valorant => "VALORANT",
});

/// Outcome of a personality survey.
///
/// Five statements are rated `1..=5`; the total score is the sum times
/// four, giving a `20..=100` scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyScore {
    /// Scaled total score.
    pub total: u32,
    /// Derived personality category.
    pub personality: Personality,
}

impl SurveyScore {
    /// Number of survey statements.
    pub const QUESTION_COUNT: usize = 5;
    /// Lowest accepted answer.
    pub const MIN_ANSWER: u8 = 1;
    /// Highest accepted answer.
    pub const MAX_ANSWER: u8 = 5;

    /// Scores a full set of survey answers.
    ///
    /// # Errors
    /// Returns a [`ValidationErrorKind::InvalidSurvey`] error when the
    /// answer count is wrong or any answer is out of range.
    pub fn classify(answers: &[u8]) -> Result<Self, ValidationError> {
        if answers.len() != Self::QUESTION_COUNT {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidSurvey,
                format!(
                    "Expected {} survey answers, got {}",
                    Self::QUESTION_COUNT,
                    answers.len()
                ),
            ));
        }

        if let Some(bad) = answers
            .iter()
            .find(|a| !(Self::MIN_ANSWER..=Self::MAX_ANSWER).contains(*a))
        {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidSurvey,
                format!(
                    "Survey answer {bad} outside {}..={}",
                    Self::MIN_ANSWER,
                    Self::MAX_ANSWER
                ),
            ));
        }

        let total = answers.iter().map(|&a| u32::from(a)).sum::<u32>() * 4;
        Ok(Self {
            total,
            personality: Personality::from_score(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_builder() {
        let p = Player::new("P001", 7, Personality::Leader, Role::Strategist, Game::Valorant)
            .with_name("Alice")
            .with_email("alice@example.com");

        assert_eq!(p.id, "P001");
        assert_eq!(p.label(), "Alice");
        assert_eq!(p.email, "alice@example.com");
        assert!(p.has_valid_skill());
    }

    #[test]
    fn test_player_label_falls_back_to_id() {
        let p = Player::new("P002", 5, Personality::Balanced, Role::Defender, Game::Chess);
        assert_eq!(p.label(), "P002");
    }

    #[test]
    fn test_skill_bounds() {
        let low = Player::new("a", 0, Personality::Thinker, Role::Attacker, Game::Fifa);
        let high = Player::new("b", 11, Personality::Thinker, Role::Attacker, Game::Fifa);
        assert!(!low.has_valid_skill());
        assert!(!high.has_valid_skill());
    }

    #[test]
    fn test_personality_thresholds() {
        assert_eq!(Personality::from_score(100), Personality::Leader);
        assert_eq!(Personality::from_score(90), Personality::Leader);
        assert_eq!(Personality::from_score(89), Personality::Balanced);
        assert_eq!(Personality::from_score(70), Personality::Balanced);
        assert_eq!(Personality::from_score(69), Personality::Thinker);
    }

    #[test]
    fn test_survey_classify() {
        let s = SurveyScore::classify(&[5, 5, 5, 4, 4]).unwrap();
        assert_eq!(s.total, 92);
        assert_eq!(s.personality, Personality::Leader);

        let s = SurveyScore::classify(&[3, 3, 3, 3, 3]).unwrap();
        assert_eq!(s.total, 60);
        assert_eq!(s.personality, Personality::Thinker);
    }

    #[test]
    fn test_survey_rejects_bad_input() {
        let err = SurveyScore::classify(&[5, 5, 5]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidSurvey);

        let err = SurveyScore::classify(&[5, 5, 6, 1, 1]).unwrap_err();
        assert!(err.message.contains('6'));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("strategist".parse::<Role>().unwrap(), Role::Strategist);
        assert_eq!(" Dota 2 ".parse::<Game>().unwrap(), Game::Dota2);
        assert_eq!("LEADER".parse::<Personality>().unwrap(), Personality::Leader);

        let err = "goalkeeper".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
    }

    #[test]
    fn test_enum_display() {
        assert_eq!(Role::Coordinator.to_string(), "COORDINATOR");
        assert_eq!(Game::Csgo.to_string(), "CSGO");
        assert_eq!(Personality::Balanced.to_string(), "Balanced");
    }
}
