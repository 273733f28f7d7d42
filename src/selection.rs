//! Multi-row selection.
//!
//! Selections survive page navigation: an id checked on page 1 stays
//! checked while the user looks at page 2. "Select all" only ever touches
//! the ids of the slice currently on screen.

use std::collections::HashSet;

use crate::types::DeploymentId;

/// Ids the user has checked, in the order they were checked.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    order: Vec<DeploymentId>,
    members: HashSet<DeploymentId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &DeploymentId) -> bool {
        if self.members.remove(id) {
            self.order.retain(|existing| existing != id);
            false
        } else {
            self.insert(id.clone());
            true
        }
    }

    /// Select every visible id, or clear them all if they already are.
    /// Ids outside `visible` are never touched.
    pub fn toggle_all(&mut self, visible: &[DeploymentId]) {
        if visible.is_empty() {
            return;
        }
        if self.covers(visible) {
            let visible: HashSet<&DeploymentId> = visible.iter().collect();
            self.members.retain(|id| !visible.contains(id));
            self.order.retain(|id| !visible.contains(id));
        } else {
            for id in visible {
                if !self.members.contains(id) {
                    self.insert(id.clone());
                }
            }
        }
    }

    pub fn is_selected(&self, id: &DeploymentId) -> bool {
        self.members.contains(id)
    }

    /// Every visible id is selected and there is at least one.
    pub fn is_all_selected(&self, visible: &[DeploymentId]) -> bool {
        !visible.is_empty() && self.covers(visible)
    }

    /// Some, but not all, visible ids are selected.
    pub fn is_indeterminate(&self, visible: &[DeploymentId]) -> bool {
        let hits = visible.iter().filter(|id| self.members.contains(*id)).count();
        hits > 0 && hits < visible.len()
    }

    /// Drop every selection on every page.
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Forget ids that no longer exist in the fetched record set.
    pub fn retain_existing(&mut self, existing: &HashSet<&DeploymentId>) -> usize {
        let before = self.order.len();
        self.order.retain(|id| existing.contains(id));
        self.members.retain(|id| existing.contains(id));
        before - self.order.len()
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> &[DeploymentId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn covers(&self, visible: &[DeploymentId]) -> bool {
        visible.iter().all(|id| self.members.contains(id))
    }

    fn insert(&mut self, id: DeploymentId) {
        self.members.insert(id.clone());
        self.order.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<DeploymentId> {
        raw.iter().map(|s| DeploymentId::from(*s)).collect()
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionSet::new();
        let id = DeploymentId::from("a");
        assert!(selection.toggle(&id));
        assert!(selection.is_selected(&id));
        assert!(!selection.toggle(&id));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_all_twice_clears_only_visible() {
        let mut selection = SelectionSet::new();
        let page_one = ids(&["a", "b"]);
        let page_two = ids(&["c", "d", "e"]);

        selection.toggle(&page_one[0]);
        selection.toggle_all(&page_two);
        assert!(selection.is_all_selected(&page_two));
        assert_eq!(selection.len(), 4);

        selection.toggle_all(&page_two);
        assert!(!page_two.iter().any(|id| selection.is_selected(id)));
        assert!(selection.is_selected(&page_one[0]));
        assert_eq!(selection.ids(), &ids(&["a"])[..]);
    }

    #[test]
    fn test_toggle_all_on_partial_selects_rest() {
        let mut selection = SelectionSet::new();
        let visible = ids(&["a", "b", "c"]);
        selection.toggle(&visible[1]);
        assert!(selection.is_indeterminate(&visible));

        selection.toggle_all(&visible);
        assert!(selection.is_all_selected(&visible));
        assert!(!selection.is_indeterminate(&visible));
        assert_eq!(selection.ids(), &ids(&["b", "a", "c"])[..]);
    }

    #[test]
    fn test_empty_slice_is_never_all_selected() {
        let mut selection = SelectionSet::new();
        selection.toggle(&DeploymentId::from("x"));
        assert!(!selection.is_all_selected(&[]));
        assert!(!selection.is_indeterminate(&[]));
        selection.toggle_all(&[]);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_clear_drops_all_pages() {
        let mut selection = SelectionSet::new();
        selection.toggle_all(&ids(&["a", "b"]));
        selection.toggle_all(&ids(&["c"]));
        selection.clear();
        assert!(selection.is_empty());
        assert!(!selection.is_selected(&DeploymentId::from("c")));
    }

    #[test]
    fn test_retain_existing_prunes_vanished_ids() {
        let mut selection = SelectionSet::new();
        selection.toggle_all(&ids(&["a", "b", "c"]));
        let alive = ids(&["a", "c"]);
        let alive: HashSet<&DeploymentId> = alive.iter().collect();
        assert_eq!(selection.retain_existing(&alive), 1);
        assert_eq!(selection.ids(), &ids(&["a", "c"])[..]);
    }
}
