//! Team model.
//!
//! A team is a named, unordered collection of shared player references.
//! Members are never copied: two teams holding the same `Arc<Player>`
//! would break the one-team-per-player invariant, which the builder and
//! the swap primitives maintain.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Game, Personality, Player, Role};

/// A team under formation.
#[derive(Debug, Clone, Default)]
pub struct Team {
    /// Team name (e.g. "Team 3").
    pub name: String,
    /// Current members.
    pub members: Vec<Arc<Player>>,
}

impl Team {
    /// Creates an empty team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Sets the members.
    pub fn with_members(mut self, members: Vec<Arc<Player>>) -> Self {
        self.members = members;
        self
    }

    /// Adds a member.
    pub fn add_member(&mut self, player: Arc<Player>) {
        self.members.push(player);
    }

    /// Removes the member with the given id.
    pub fn remove_member(&mut self, player_id: &str) -> Option<Arc<Player>> {
        let idx = self.members.iter().position(|p| p.id == player_id)?;
        Some(self.members.swap_remove(idx))
    }

    /// Whether a player with the given id is a member.
    pub fn contains(&self, player_id: &str) -> bool {
        self.members.iter().any(|p| p.id == player_id)
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the team has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of member skill levels.
    pub fn skill_total(&self) -> u32 {
        self.members.iter().map(|p| u32::from(p.skill)).sum()
    }

    /// Mean member skill. An empty team averages `0.0`.
    pub fn average_skill(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.skill_total() as f64 / self.members.len() as f64
    }

    /// Number of members with the given personality.
    pub fn count_personality(&self, personality: Personality) -> usize {
        self.members
            .iter()
            .filter(|p| p.personality == personality)
            .count()
    }

    /// Role histogram.
    pub fn role_counts(&self) -> BTreeMap<Role, usize> {
        let mut counts = BTreeMap::new();
        for p in &self.members {
            *counts.entry(p.role).or_insert(0) += 1;
        }
        counts
    }

    /// Game preference histogram.
    pub fn game_counts(&self) -> BTreeMap<Game, usize> {
        let mut counts = BTreeMap::new();
        for p in &self.members {
            *counts.entry(p.game).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct preferred roles.
    pub fn distinct_roles(&self) -> usize {
        self.role_counts().len()
    }

    /// Member ids joined with `|`.
    pub fn member_ids(&self) -> String {
        self.members
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Multi-line statistics block for front-ends.
    pub fn stats_summary(&self) -> String {
        format!(
            "--- Stats for {} ---\nMembers: {}\nAvg Skill: {:.2}\nLeaders: {}\nThinkers: {}\nBalanced: {}\nRoles -> {}\nGames -> {}\nMembers -> {}",
            self.name,
            self.len(),
            self.average_skill(),
            self.count_personality(Personality::Leader),
            self.count_personality(Personality::Thinker),
            self.count_personality(Personality::Balanced),
            histogram(&self.role_counts()),
            histogram(&self.game_counts()),
            self.members
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

fn histogram<K: fmt::Display>(counts: &BTreeMap<K, usize>) -> String {
    counts
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} members, avg skill {:.2}) [{}]",
            self.name,
            self.len(),
            self.average_skill(),
            self.members
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_team() -> Team {
        Team::new("Team 1").with_members(vec![
            Arc::new(Player::new("1", 7, Personality::Leader, Role::Strategist, Game::Valorant).with_name("A")),
            Arc::new(Player::new("2", 8, Personality::Thinker, Role::Supporter, Game::Csgo).with_name("B")),
            Arc::new(Player::new("3", 6, Personality::Balanced, Role::Strategist, Game::Valorant).with_name("C")),
        ])
    }

    #[test]
    fn test_team_aggregates() {
        let t = sample_team();
        assert_eq!(t.len(), 3);
        assert_eq!(t.skill_total(), 21);
        assert!((t.average_skill() - 7.0).abs() < 1e-10);
        assert_eq!(t.count_personality(Personality::Leader), 1);
        assert_eq!(t.count_personality(Personality::Balanced), 1);
        assert_eq!(t.distinct_roles(), 2);
        assert_eq!(t.game_counts()[&Game::Valorant], 2);
    }

    #[test]
    fn test_empty_team() {
        let t = Team::new("Empty");
        assert!(t.is_empty());
        assert_eq!(t.average_skill(), 0.0);
        assert_eq!(t.distinct_roles(), 0);
    }

    #[test]
    fn test_remove_member() {
        let mut t = sample_team();
        let removed = t.remove_member("2").unwrap();
        assert_eq!(removed.id, "2");
        assert!(!t.contains("2"));
        assert_eq!(t.len(), 2);
        assert!(t.remove_member("99").is_none());
    }

    #[test]
    fn test_summaries() {
        let t = sample_team();
        let line = t.to_string();
        assert!(line.starts_with("Team 1 (3 members"));
        assert!(line.contains("A, B, C"));

        let stats = t.stats_summary();
        assert!(stats.contains("Leaders: 1"));
        assert!(stats.contains("VALORANT: 2"));
        assert_eq!(t.member_ids(), "1|2|3");
    }
}
