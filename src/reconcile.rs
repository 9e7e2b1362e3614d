//! Carries expansion and selection across tree rebuilds.
//!
//! A `PriorIndex` is taken from the tree that is about to be replaced (or from
//! persisted state) and queried while the new tree is constructed, so every
//! node comes out of the builder with its state already applied.

use crate::model::{NodeId, RootNode, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Expansion applied to folders that have no prior state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    #[default]
    Expanded,
    Collapsed,
}

/// Presentation state of one node in a previous tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorState {
    pub expandable: bool,
    pub expanded: bool,
    pub selected: bool,
}

/// Serializable expansion/selection snapshot of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeViewState {
    #[serde(default)]
    pub expanded: BTreeMap<NodeId, bool>,
    #[serde(default)]
    pub selected: Vec<NodeId>,
}

impl TreeViewState {
    pub fn capture(root: &RootNode) -> Self {
        let mut state = Self::default();
        for group in &root.groups {
            Self::capture_node(group, &mut state);
        }
        state
    }

    fn capture_node(node: &TreeNode, state: &mut TreeViewState) {
        if node.is_expandable() {
            state.expanded.insert(node.id().clone(), node.is_expanded());
        }
        if node.is_selected() {
            state.selected.push(node.id().clone());
        }
        for child in node.children() {
            Self::capture_node(child, state);
        }
    }
}

/// Lookup from identity key to the state a node had before the rebuild
#[derive(Debug, Clone, Default)]
pub struct PriorIndex {
    states: HashMap<NodeId, PriorState>,
}

impl PriorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: &RootNode) -> Self {
        let mut index = Self::new();
        for group in &root.groups {
            index.index_node(group);
        }
        index
    }

    fn index_node(&mut self, node: &TreeNode) {
        self.insert(
            node.id().clone(),
            PriorState {
                expandable: node.is_expandable(),
                expanded: node.is_expanded(),
                selected: node.is_selected(),
            },
        );
        for child in node.children() {
            self.index_node(child);
        }
    }

    pub fn from_view_state(state: &TreeViewState) -> Self {
        let mut index = Self::new();
        for (id, expanded) in &state.expanded {
            index.insert(
                id.clone(),
                PriorState {
                    expandable: true,
                    expanded: *expanded,
                    selected: false,
                },
            );
        }
        for id in &state.selected {
            let entry = index.states.entry(id.clone()).or_insert(PriorState {
                expandable: false,
                expanded: false,
                selected: false,
            });
            entry.selected = true;
        }
        index
    }

    /// Same states with every selection flag cleared
    pub fn without_selection(mut self) -> Self {
        for state in self.states.values_mut() {
            state.selected = false;
        }
        self
    }

    /// Entries of `other` replace entries under the same key
    pub fn overlay(&mut self, other: PriorIndex) {
        self.states.extend(other.states);
    }

    pub fn insert(&mut self, id: NodeId, state: PriorState) {
        self.states.insert(id, state);
    }

    pub fn get(&self, id: &NodeId) -> Option<&PriorState> {
        self.states.get(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Selection found while building; applied by the caller to the selection holder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub selected: Vec<NodeId>,
}

impl Reconciliation {
    /// Single selection: the last node marked selected wins
    pub fn selection(&self) -> Option<&NodeId> {
        self.selected.last()
    }
}

pub struct Reconciler<'a> {
    prior: &'a PriorIndex,
    default_expansion: Expansion,
    outcome: Reconciliation,
}

impl<'a> Reconciler<'a> {
    pub fn new(prior: &'a PriorIndex, default_expansion: Expansion) -> Self {
        Self {
            prior,
            default_expansion,
            outcome: Reconciliation::default(),
        }
    }

    /// Expansion for a folder node
    pub fn expanded(&self, id: &NodeId) -> bool {
        match self.prior.get(id) {
            Some(state) if state.expandable => state.expanded,
            _ => self.default_expansion == Expansion::Expanded,
        }
    }

    /// Expansion for a group node; groups start expanded regardless of configuration
    pub fn group_expanded(&self, id: &NodeId) -> bool {
        match self.prior.get(id) {
            Some(state) if state.expandable => state.expanded,
            _ => true,
        }
    }

    /// Whether the node was selected before; records it in the outcome if so
    pub fn selected(&mut self, id: &NodeId) -> bool {
        let selected = self.prior.get(id).map(|state| state.selected).unwrap_or(false);
        if selected {
            self.outcome.selected.push(id.clone());
        }
        selected
    }

    pub fn finish(self) -> Reconciliation {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::member("changes", s)
    }

    #[test]
    fn test_defaults_without_prior() {
        let prior = PriorIndex::new();
        let mut reconciler = Reconciler::new(&prior, Expansion::Expanded);
        assert!(reconciler.expanded(&id("/r/a")));
        assert!(!reconciler.selected(&id("/r/a")));
        assert!(reconciler.finish().selection().is_none());

        let reconciler = Reconciler::new(&prior, Expansion::Collapsed);
        assert!(!reconciler.expanded(&id("/r/a")));
        assert!(reconciler.group_expanded(&NodeId::group("changes")));
    }

    #[test]
    fn test_prior_state_wins() {
        let mut prior = PriorIndex::new();
        prior.insert(
            id("/r/a"),
            PriorState {
                expandable: true,
                expanded: false,
                selected: true,
            },
        );
        let mut reconciler = Reconciler::new(&prior, Expansion::Expanded);
        assert!(!reconciler.expanded(&id("/r/a")));
        assert!(reconciler.selected(&id("/r/a")));
        assert_eq!(reconciler.finish().selection(), Some(&id("/r/a")));
    }

    #[test]
    fn test_prior_leaf_does_not_dictate_expansion() {
        let mut prior = PriorIndex::new();
        prior.insert(
            id("/r/a"),
            PriorState {
                expandable: false,
                expanded: false,
                selected: false,
            },
        );
        let reconciler = Reconciler::new(&prior, Expansion::Expanded);
        assert!(reconciler.expanded(&id("/r/a")));
    }

    #[test]
    fn test_index_from_view_state() {
        let mut state = TreeViewState::default();
        state.expanded.insert(id("/r/src"), false);
        state.selected.push(id("/r/src/main.rs"));

        let index = PriorIndex::from_view_state(&state);
        assert_eq!(index.len(), 2);
        assert!(!index.get(&id("/r/src")).unwrap().expanded);
        assert!(index.get(&id("/r/src/main.rs")).unwrap().selected);
    }

    #[test]
    fn test_overlay_replaces_and_keeps_the_rest() {
        let state = |expanded, selected| PriorState {
            expandable: true,
            expanded,
            selected,
        };
        let mut stashed = PriorIndex::new();
        stashed.insert(id("/r/src"), state(false, true));
        stashed.insert(id("/r/lib"), state(false, false));
        let mut stashed = stashed.without_selection();
        assert!(!stashed.get(&id("/r/src")).unwrap().selected);

        let mut current = PriorIndex::new();
        current.insert(id("/r/src"), state(true, false));
        stashed.overlay(current);
        assert_eq!(stashed.len(), 2);
        assert!(stashed.get(&id("/r/src")).unwrap().expanded);
        assert!(!stashed.get(&id("/r/lib")).unwrap().expanded);
    }
}
