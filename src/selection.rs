//! Reusable selection over a keyed collection.
//!
//! DESIGN
//! ======
//! One selection abstraction shared by the template and generation managers
//! instead of per-entity toggle logic. A `Selection<K>` holds ids only, never
//! entity copies; derived flags are computed on demand against the owning
//! collection and are never stored.

use std::collections::HashSet;
use std::hash::Hash;

// =============================================================================
// TYPES
// =============================================================================

/// An ephemeral set of selected ids, scoped to one management session.
#[derive(Debug, Clone)]
pub struct Selection<K> {
    ids: HashSet<K>,
}

/// Flags derived from the current selection against the owning collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionFlags {
    /// Selected items present in the collection.
    pub count: usize,
    pub has_online: bool,
    pub has_offline: bool,
}

impl<K: Eq + Hash + Copy> Selection<K> {
    #[must_use]
    pub fn new() -> Self {
        Self { ids: HashSet::new() }
    }

    /// Toggle one id: present ids are removed, absent ids are added.
    pub fn toggle(&mut self, id: K) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Select-all with toggle semantics over the currently visible list:
    /// if the selection already covers the whole visible list, clear it;
    /// otherwise the selection becomes exactly the visible id set.
    pub fn select_all_visible(&mut self, visible: &[K]) {
        if self.ids.len() == visible.len() && !visible.is_empty() {
            self.ids.clear();
        } else {
            self.ids = visible.iter().copied().collect();
        }
    }

    /// Unconditional clear (manage-mode exit, completed bulk action).
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: &K) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the selected ids, in arbitrary order.
    #[must_use]
    pub fn ids(&self) -> Vec<K> {
        self.ids.iter().copied().collect()
    }

    /// Compute derived flags against the owning collection. Ids no longer
    /// present in the collection are not counted.
    pub fn flags<'a, T: 'a>(
        &self,
        items: impl IntoIterator<Item = &'a T>,
        key: impl Fn(&T) -> K,
        is_online: impl Fn(&T) -> bool,
        is_offline: impl Fn(&T) -> bool,
    ) -> SelectionFlags {
        let mut flags = SelectionFlags::default();
        for item in items {
            if !self.ids.contains(&key(item)) {
                continue;
            }
            flags.count += 1;
            if is_online(item) {
                flags.has_online = true;
            }
            if is_offline(item) {
                flags.has_offline = true;
            }
        }
        flags
    }
}

impl<K: Eq + Hash + Copy> Default for Selection<K> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
