//! Owns the change tree for the currently selected repository.
//!
//! The controller subscribes to the bound provider, rebuilds the root on every
//! notification (carrying expansion and selection across through a
//! `PriorIndex`), switches between tree and flat layout, and persists its
//! presentation state.

use crate::config::TreeConfig;
use crate::model::{Group, NodeId, Resource, TreeNode, ViewMode};
use crate::provider::{Provider, Subscription};
use crate::reconcile::{PriorIndex, Reconciler, TreeViewState};
use crate::tree::{build_root, BuildOptions, ChangeTree};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Presentation state that survives restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub mode: ViewMode,
    #[serde(default)]
    pub tree: TreeViewState,
}

struct Binding<P> {
    provider: P,
    subscription: Subscription,
}

pub struct TreeController<P: Provider> {
    options: TreeConfig,
    view_mode: ViewMode,
    binding: Option<Binding<P>>,
    tree: ChangeTree,
    /// State restored before a rebuild could apply it
    pending: Option<PriorIndex>,
    /// Node states of the layout last left, keyed by that layout
    stashed: HashMap<ViewMode, PriorIndex>,
    generation: u64,
}

impl<P: Provider> TreeController<P> {
    pub fn new(options: TreeConfig) -> Self {
        Self {
            view_mode: options.view_mode,
            options,
            binding: None,
            tree: ChangeTree::new(),
            pending: None,
            stashed: HashMap::new(),
            generation: 0,
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn options(&self) -> &TreeConfig {
        &self.options
    }

    pub fn tree(&self) -> &ChangeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ChangeTree {
        &mut self.tree
    }

    pub fn provider(&self) -> Option<&P> {
        self.binding.as_ref().map(|binding| &binding.provider)
    }

    /// Mutable provider access; pick up its changes with `poll_changes`
    pub fn provider_mut(&mut self) -> Option<&mut P> {
        self.binding.as_mut().map(|binding| &mut binding.provider)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Generation of the live subscription, bumped on every (re)subscribe
    pub fn subscription_generation(&self) -> Option<u64> {
        self.binding
            .as_ref()
            .map(|binding| binding.subscription.generation())
    }

    /// Bind to a repository, or go idle with `None`. Returns the previous provider.
    pub fn select_repository(&mut self, provider: Option<P>) -> Option<P> {
        // The old subscription is disposed before anything else happens
        self.stashed.clear();
        let previous = self.binding.take().map(|binding| {
            log::debug!(
                "Disposing subscription {} to {}",
                binding.subscription.generation(),
                binding.provider.id()
            );
            binding.provider
        });

        match provider {
            Some(provider) => {
                log::info!("Selected repository {} at {}", provider.id(), provider.root_uri());
                let subscription = self.next_subscription(&provider);
                self.binding = Some(Binding {
                    provider,
                    subscription,
                });
                self.rebuild();
            }
            None => {
                log::info!("No repository selected");
                self.tree.clear();
            }
        }
        previous
    }

    fn next_subscription(&mut self, provider: &P) -> Subscription {
        self.generation += 1;
        provider.subscribe().with_generation(self.generation)
    }

    fn resubscribe(&mut self) {
        let Some(mut binding) = self.binding.take() else {
            return;
        };
        drop(binding.subscription);
        binding.subscription = self.next_subscription(&binding.provider);
        self.binding = Some(binding);
    }

    /// Switch layout; rebuilds and reveals what was selected. Returns false if unchanged.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        if mode == self.view_mode {
            return false;
        }
        let selected = self.tree.view_state().selected;
        log::info!("View mode {} -> {}", self.view_mode.as_str(), mode.as_str());
        let outgoing = PriorIndex::from_root(self.tree.root());
        let previous_mode = std::mem::replace(&mut self.view_mode, mode);

        if self.is_bound() {
            // Nodes that only exist in one layout get their state back on return
            let mut prior = self.stashed.remove(&mode).unwrap_or_default();
            prior.overlay(outgoing.clone());
            self.stashed.insert(previous_mode, outgoing.without_selection());
            if self.pending.is_none() {
                self.pending = Some(prior);
            }
            self.resubscribe();
            self.rebuild();
            for id in &selected {
                self.tree.reveal(id);
            }
        }
        true
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.set_view_mode(self.view_mode.toggled());
        self.view_mode
    }

    /// Rebuild if the provider notified since the last poll
    pub fn poll_changes(&mut self) -> bool {
        let changed = match self.binding.as_mut() {
            Some(binding) if binding.subscription.has_changed() => {
                binding.subscription.mark_seen();
                true
            }
            _ => false,
        };
        if changed {
            self.rebuild();
        }
        changed
    }

    /// Wait for the next provider notification, then rebuild.
    /// Returns false when idle or when the provider is gone.
    pub async fn wait_for_change(&mut self) -> bool {
        let alive = match self.binding.as_mut() {
            Some(binding) => binding.subscription.changed().await,
            None => false,
        };
        if alive {
            self.rebuild();
        }
        alive
    }

    /// Rebuild from the current provider snapshot
    pub fn rebuild(&mut self) {
        let Some(binding) = self.binding.as_ref() else {
            self.tree.clear();
            return;
        };
        let start_time = Instant::now();
        let prior = match self.pending.take() {
            Some(prior) => prior,
            None => PriorIndex::from_root(self.tree.root()),
        };
        let options = BuildOptions {
            view_mode: self.view_mode,
            nesting_threshold: self.options.nesting_threshold,
        };
        let mut reconciler = Reconciler::new(&prior, self.options.default_expansion);
        let root = build_root(
            binding.provider.root_uri(),
            binding.provider.groups(),
            &options,
            &mut reconciler,
        );
        let outcome = reconciler.finish();
        self.tree.set_root(root, outcome.selection());
        log::debug!(
            "Rebuilt tree for {} ({} prior states) in {:?}",
            binding.provider.id(),
            prior.len(),
            start_time.elapsed()
        );
    }

    /// Group in the current snapshot that owns `node`
    pub fn owning_group(&self, node: &TreeNode) -> Option<&Group> {
        let binding = self.binding.as_ref()?;
        let group = binding
            .provider
            .groups()
            .iter()
            .find(|group| group.id == node.group_id());
        debug_assert!(group.is_some(), "node {} has no owning group", node.id());
        if group.is_none() {
            log::error!("Node {} refers to missing group {}", node.id(), node.group_id());
        }
        group
    }

    /// Resource behind a leaf node
    pub fn resource_for(&self, id: &NodeId) -> Option<(&Group, &Resource)> {
        let node = self.tree.find_node(id)?;
        let leaf = node.as_leaf()?;
        let group = self.owning_group(node)?;
        let resource = group
            .resources
            .iter()
            .find(|resource| resource.source_uri == leaf.source_uri)?;
        Some((group, resource))
    }

    pub fn store_state(&self) -> PersistedState {
        PersistedState {
            mode: self.view_mode,
            tree: self.tree.view_state(),
        }
    }

    /// Apply persisted state; takes effect on the next rebuild if idle
    pub fn restore_state(&mut self, state: PersistedState) {
        self.view_mode = state.mode;
        self.pending = Some(PriorIndex::from_view_state(&state.tree));
        if self.is_bound() {
            self.resubscribe();
            self.rebuild();
        }
    }
}
