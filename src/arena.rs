//! Shared team storage for concurrent swap search.
//!
//! Teams live in slots addressed by a stable index, each guarded by its
//! own mutex. Any operation touching two teams locks the lower index
//! first, so two workers racing for overlapping pairs can never deadlock.
//!
//! Critical sections only swap `Arc` pointers, which cannot leave a slot
//! half-updated; a poisoned lock is therefore recovered rather than
//! propagated.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::Team;

/// Index-addressed, per-slot locked team storage.
#[derive(Debug, Default)]
pub struct TeamArena {
    slots: Vec<Mutex<Team>>,
}

impl TeamArena {
    /// Moves teams into the arena. Slot `i` holds `teams[i]`.
    pub fn new(teams: Vec<Team>) -> Self {
        Self {
            slots: teams.into_iter().map(Mutex::new).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena holds no teams.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Locks one slot.
    ///
    /// # Panics
    /// If `idx` is out of range.
    pub fn lock(&self, idx: usize) -> MutexGuard<'_, Team> {
        self.slots[idx].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with both teams locked, lower index first.
    ///
    /// `f` receives the teams in argument order `(a, b)`. Returns `None`
    /// when `a == b` or either index is out of range.
    pub fn with_pair<R>(
        &self,
        a: usize,
        b: usize,
        f: impl FnOnce(&mut Team, &mut Team) -> R,
    ) -> Option<R> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }

        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let mut lo_guard = self.lock(lo);
        let mut hi_guard = self.lock(hi);

        if a < b {
            Some(f(&mut *lo_guard, &mut *hi_guard))
        } else {
            Some(f(&mut *hi_guard, &mut *lo_guard))
        }
    }

    /// Swaps `teams[a].members[ma]` with `teams[b].members[mb]` under the
    /// pair lock. Returns `false` if any index is invalid.
    pub fn swap(&self, a: usize, ma: usize, b: usize, mb: usize) -> bool {
        self.with_pair(a, b, |ta, tb| swap_members(ta, ma, tb, mb))
            .unwrap_or(false)
    }

    /// Clones every team, locking one slot at a time.
    pub fn snapshot(&self) -> Vec<Team> {
        (0..self.slots.len()).map(|i| self.lock(i).clone()).collect()
    }

    /// Current average skill of every team.
    pub fn averages(&self) -> Vec<f64> {
        (0..self.slots.len())
            .map(|i| self.lock(i).average_skill())
            .collect()
    }

    /// Moves the teams back out, in slot order.
    pub fn into_teams(self) -> Vec<Team> {
        self.slots
            .into_iter()
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }
}

/// Exchanges one member between two teams in place.
///
/// Returns `false` (and changes nothing) if either member index is out of
/// range.
pub fn swap_members(a: &mut Team, ma: usize, b: &mut Team, mb: usize) -> bool {
    match (a.members.get_mut(ma), b.members.get_mut(mb)) {
        (Some(pa), Some(pb)) => {
            std::mem::swap(pa, pb);
            true
        }
        _ => false,
    }
}
