//! Keyboard policy and render model for the change tree.

use crate::controller::{PersistedState, TreeController};
use crate::diff::ResourceOpener;
use crate::error::Result;
use crate::labels::LabelProvider;
use crate::model::{ChangeStatus, NodeId, NodeKind, TreeNode, ViewMode};
use crate::navigator::{ChangeCursor, CursorMove};
use crate::provider::Provider;

/// A visible row of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleItem {
    pub id: NodeId,
    pub name: String,
    /// Location relative to the repository root, empty for groups
    pub long_name: String,
    pub icon: &'static str,
    pub depth: usize,
    pub kind: NodeKind,
    pub is_selected: bool,
    pub is_expanded: bool,
    pub status: Option<ChangeStatus>,
    pub letter: Option<char>,
    pub color: Option<String>,
    /// Number of leaves below a group or folder
    pub count: usize,
}

/// View model for rendering the tree
#[derive(Debug, Clone)]
pub struct TreeViewModel {
    pub items: Vec<VisibleItem>,
    pub cursor_position: usize,
    pub view_mode: ViewMode,
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf(_) => 1,
        _ => node.children().iter().map(count_leaves).sum(),
    }
}

pub struct ScmTreeView<P: Provider, O: ResourceOpener> {
    controller: TreeController<P>,
    cursor: ChangeCursor<O>,
}

impl<P: Provider, O: ResourceOpener> ScmTreeView<P, O> {
    pub fn new(controller: TreeController<P>, opener: O) -> Self {
        Self {
            controller,
            cursor: ChangeCursor::new(opener),
        }
    }

    pub fn controller(&self) -> &TreeController<P> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut TreeController<P> {
        &mut self.controller
    }

    pub fn cursor(&self) -> &ChangeCursor<O> {
        &self.cursor
    }

    pub fn view_mode(&self) -> ViewMode {
        self.controller.view_mode()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        self.controller.set_view_mode(mode)
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.controller.toggle_view_mode()
    }

    pub fn store_state(&self) -> PersistedState {
        self.controller.store_state()
    }

    pub fn restore_state(&mut self, state: PersistedState) {
        self.controller.restore_state(state);
    }

    /// Pick up provider notifications; closes the editor if its node vanished
    pub fn poll_changes(&mut self) -> bool {
        let changed = self.controller.poll_changes();
        if changed {
            self.drop_stale_editor();
        }
        changed
    }

    /// Ask the provider to re-read its source, then rebuild
    pub fn refresh(&mut self) -> Result<()> {
        if let Some(provider) = self.controller.provider_mut() {
            provider.refresh()?;
        }
        if !self.controller.poll_changes() {
            self.controller.rebuild();
        }
        self.drop_stale_editor();
        Ok(())
    }

    fn drop_stale_editor(&mut self) {
        let stale = self
            .cursor
            .editor()
            .map(|editor| self.controller.tree().find_node(&editor.node).is_none())
            .unwrap_or(false);
        if stale {
            log::debug!("Closing editor for a node that is gone");
            self.cursor.close();
        }
    }

    fn selected_kind(&self) -> Option<NodeKind> {
        self.controller.tree().selected_node().map(TreeNode::kind)
    }

    fn select(&mut self, id: Option<NodeId>) -> CursorMove {
        match id {
            Some(id) if self.controller.tree().selection() != Some(&id) => {
                self.controller.tree_mut().select_node(&id);
                CursorMove::Tree
            }
            _ => CursorMove::Unchanged,
        }
    }

    pub fn handle_up(&mut self) -> CursorMove {
        let tree = self.controller.tree();
        if tree.selection().is_none() {
            return self.handle_home();
        }
        let target = tree
            .previous_visible(tree.selection(), |_| true)
            .map(|node| node.id().clone());
        self.select(target)
    }

    pub fn handle_down(&mut self) -> CursorMove {
        let tree = self.controller.tree();
        let target = tree
            .next_visible(tree.selection(), |_| true)
            .map(|node| node.id().clone());
        self.select(target)
    }

    pub fn handle_home(&mut self) -> CursorMove {
        let target = self
            .controller
            .tree()
            .next_visible(None, |_| true)
            .map(|node| node.id().clone());
        self.select(target)
    }

    pub fn handle_end(&mut self) -> CursorMove {
        let target = self
            .controller
            .tree()
            .previous_visible(None, |_| true)
            .map(|node| node.id().clone());
        self.select(target)
    }

    /// Leaf selected: previous change. Otherwise collapse, or move to the parent.
    pub async fn handle_left(&mut self) -> CursorMove {
        match self.selected_kind() {
            Some(NodeKind::Leaf) => self.cursor.previous(&mut self.controller).await,
            Some(_) => self.collapse_or_parent(),
            None => CursorMove::Unchanged,
        }
    }

    /// Leaf selected: next change. Otherwise expand, or move to the first child.
    pub async fn handle_right(&mut self) -> CursorMove {
        match self.selected_kind() {
            Some(NodeKind::Leaf) => self.cursor.next(&mut self.controller).await,
            Some(_) => self.expand_or_child(),
            None => self.handle_home(),
        }
    }

    /// Open a leaf, toggle anything else
    pub async fn handle_enter(&mut self) -> CursorMove {
        match self.selected_kind() {
            Some(NodeKind::Leaf) => self.cursor.open_selected(&mut self.controller).await,
            Some(_) => {
                let Some(id) = self.controller.tree().selection().cloned() else {
                    return CursorMove::Unchanged;
                };
                if self.controller.tree_mut().toggle_node(&id) {
                    CursorMove::Tree
                } else {
                    CursorMove::Unchanged
                }
            }
            None => CursorMove::Unchanged,
        }
    }

    /// Next change regardless of what kind of node is selected
    pub async fn next_change(&mut self) -> CursorMove {
        self.cursor.next(&mut self.controller).await
    }

    pub async fn previous_change(&mut self) -> CursorMove {
        self.cursor.previous(&mut self.controller).await
    }

    fn collapse_or_parent(&mut self) -> CursorMove {
        let Some(id) = self.controller.tree().selection().cloned() else {
            return CursorMove::Unchanged;
        };
        let expanded = self
            .controller
            .tree()
            .find_node(&id)
            .map(TreeNode::is_expanded)
            .unwrap_or(false);
        if expanded {
            self.controller.tree_mut().collapse_node(&id);
            return CursorMove::Tree;
        }
        let parent = self
            .controller
            .tree()
            .parent_of(&id)
            .map(|node| node.id().clone());
        self.select(parent)
    }

    fn expand_or_child(&mut self) -> CursorMove {
        let Some(id) = self.controller.tree().selection().cloned() else {
            return CursorMove::Unchanged;
        };
        let Some(node) = self.controller.tree().find_node(&id) else {
            return CursorMove::Unchanged;
        };
        if !node.is_expanded() {
            self.controller.tree_mut().expand_node(&id);
            return CursorMove::Tree;
        }
        let child = node.children().first().map(|child| child.id().clone());
        self.select(child)
    }

    /// Flatten the visible tree into render rows
    pub fn build_view_model(&self, labels: &dyn LabelProvider) -> TreeViewModel {
        let start = std::time::Instant::now();
        let tree = self.controller.tree();
        let items: Vec<VisibleItem> = tree
            .visible_nodes()
            .iter()
            .map(|visible| {
                let node = visible.node;
                let leaf = node.as_leaf();
                let decorations = leaf.and_then(|leaf| leaf.decorations.as_ref());
                VisibleItem {
                    id: node.id().clone(),
                    name: visible.display_name(),
                    long_name: node
                        .source_uri()
                        .map(|uri| labels.get_long_name(uri))
                        .unwrap_or_default(),
                    icon: match node {
                        TreeNode::Group(_) => "",
                        TreeNode::Folder(folder) => labels.get_icon(&folder.source_uri, true),
                        TreeNode::Leaf(leaf) => labels.get_icon(&leaf.source_uri, false),
                    },
                    depth: visible.depth,
                    kind: node.kind(),
                    is_selected: node.is_selected(),
                    is_expanded: node.is_expanded(),
                    status: leaf.map(|leaf| leaf.status),
                    // Undecorated resources fall back to their status glyph
                    letter: decorations
                        .and_then(|d| d.letter)
                        .or_else(|| leaf.map(|leaf| leaf.status.letter())),
                    color: decorations
                        .and_then(|d| d.color.clone())
                        .or_else(|| leaf.map(|leaf| leaf.status.color().to_string())),
                    count: count_leaves(node),
                }
            })
            .collect();
        let cursor_position = items.iter().position(|item| item.is_selected).unwrap_or(0);
        log::debug!("View model: {} rows in {:?}", items.len(), start.elapsed());
        TreeViewModel {
            items,
            cursor_position,
            view_mode: self.view_mode(),
        }
    }
}
