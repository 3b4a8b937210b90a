//! Violation report model.
//!
//! A report is purely derived from a team and a rule set: recomputed on
//! demand, never cached. Flags are independent and may co-occur. Only the
//! evaluator raises flags; callers read them through [`ViolationReport::has`]
//! and [`ViolationReport::kinds`].

use serde::{Deserialize, Serialize};

/// Classification of rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationKind {
    /// More Leaders than allowed.
    TooManyLeaders,
    /// Fewer Leaders than required.
    NotEnoughLeaders,
    /// More Thinkers than allowed.
    TooManyThinkers,
    /// Fewer Thinkers than required.
    NotEnoughThinkers,
    /// Some game preference exceeds the per-preference cap.
    PreferenceOverflow,
    /// Fewer distinct roles than required.
    LowRoleDiversity,
}

impl ViolationKind {
    /// All kinds.
    pub const ALL: [ViolationKind; 6] = [
        ViolationKind::TooManyLeaders,
        ViolationKind::NotEnoughLeaders,
        ViolationKind::TooManyThinkers,
        ViolationKind::NotEnoughThinkers,
        ViolationKind::PreferenceOverflow,
        ViolationKind::LowRoleDiversity,
    ];

    /// Severity (0-100, higher = harder to repair by later swaps).
    ///
    /// A missing Leader is the heaviest, then low role diversity, then the
    /// count overflows and shortages.
    pub fn severity(self) -> i32 {
        match self {
            ViolationKind::NotEnoughLeaders => 100,
            ViolationKind::LowRoleDiversity => 80,
            ViolationKind::TooManyLeaders => 60,
            ViolationKind::NotEnoughThinkers => 50,
            ViolationKind::TooManyThinkers => 40,
            ViolationKind::PreferenceOverflow => 30,
        }
    }
}

/// Structured rule-violation report for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    too_many_leaders: bool,
    not_enough_leaders: bool,
    too_many_thinkers: bool,
    not_enough_thinkers: bool,
    preference_overflow: bool,
    low_role_diversity: bool,
    messages: Vec<String>,
}

impl ViolationReport {
    /// Creates a clean report.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn raise(&mut self, kind: ViolationKind, message: impl Into<String>) {
        *self.flag_mut(kind) = true;
        self.messages.push(message.into());
    }

    /// Human-readable descriptions, one per detected problem.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether the given flag is set.
    pub fn has(&self, kind: ViolationKind) -> bool {
        match kind {
            ViolationKind::TooManyLeaders => self.too_many_leaders,
            ViolationKind::NotEnoughLeaders => self.not_enough_leaders,
            ViolationKind::TooManyThinkers => self.too_many_thinkers,
            ViolationKind::NotEnoughThinkers => self.not_enough_thinkers,
            ViolationKind::PreferenceOverflow => self.preference_overflow,
            ViolationKind::LowRoleDiversity => self.low_role_diversity,
        }
    }

    fn flag_mut(&mut self, kind: ViolationKind) -> &mut bool {
        match kind {
            ViolationKind::TooManyLeaders => &mut self.too_many_leaders,
            ViolationKind::NotEnoughLeaders => &mut self.not_enough_leaders,
            ViolationKind::TooManyThinkers => &mut self.too_many_thinkers,
            ViolationKind::NotEnoughThinkers => &mut self.not_enough_thinkers,
            ViolationKind::PreferenceOverflow => &mut self.preference_overflow,
            ViolationKind::LowRoleDiversity => &mut self.low_role_diversity,
        }
    }

    /// Set flags, in [`ViolationKind::ALL`] order.
    pub fn kinds(&self) -> impl Iterator<Item = ViolationKind> + '_ {
        ViolationKind::ALL.into_iter().filter(|&k| self.has(k))
    }

    /// Whether any flag is set.
    pub fn has_issues(&self) -> bool {
        self.kinds().next().is_some()
    }

    /// Number of set flags.
    pub fn flag_count(&self) -> usize {
        self.kinds().count()
    }

    /// Sum of severities of the set flags.
    pub fn total_severity(&self) -> i32 {
        self.kinds().map(ViolationKind::severity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let r = ViolationReport::new();
        assert!(!r.has_issues());
        assert_eq!(r.flag_count(), 0);
        assert_eq!(r.total_severity(), 0);
    }

    #[test]
    fn test_raise_flags() {
        let mut r = ViolationReport::new();
        r.raise(ViolationKind::NotEnoughLeaders, "Not enough leaders (0)");
        r.raise(ViolationKind::PreferenceOverflow, "Game overflow: CSGO (3)");

        assert!(r.has_issues());
        assert!(r.has(ViolationKind::NotEnoughLeaders));
        assert!(r.has(ViolationKind::PreferenceOverflow));
        assert!(!r.has(ViolationKind::LowRoleDiversity));
        assert_eq!(r.flag_count(), 2);
        assert_eq!(r.total_severity(), 130);
        assert_eq!(r.messages(), ["Not enough leaders (0)", "Game overflow: CSGO (3)"]);
    }

    #[test]
    fn test_kinds_order() {
        let mut r = ViolationReport::new();
        r.raise(ViolationKind::LowRoleDiversity, "low");
        r.raise(ViolationKind::TooManyLeaders, "many");
        let kinds: Vec<_> = r.kinds().collect();
        assert_eq!(kinds, vec![ViolationKind::TooManyLeaders, ViolationKind::LowRoleDiversity]);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ViolationKind::NotEnoughLeaders.severity() > ViolationKind::LowRoleDiversity.severity());
        assert!(ViolationKind::LowRoleDiversity.severity() > ViolationKind::TooManyLeaders.severity());
        let mut severities: Vec<_> = ViolationKind::ALL.iter().map(|k| k.severity()).collect();
        severities.sort();
        severities.dedup();
        assert_eq!(severities.len(), ViolationKind::ALL.len());
    }
}
