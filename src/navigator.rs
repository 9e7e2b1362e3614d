//! Linear navigation across every change in the tree.
//!
//! The cursor walks diff chunks inside the open file first and moves on to
//! the next (or previous) visible file once the chunks run out, so repeated
//! presses step through all changes of all files in display order.

use crate::controller::TreeController;
use crate::diff::{DiffNavigator, ResourceOpener};
use crate::model::{NodeId, TreeNode};
use crate::provider::Provider;

/// What a navigation request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorMove {
    /// Moved between chunks of the open file
    Chunk,
    /// Selected and opened another file
    File(NodeId),
    /// Default tree handling (expand, collapse, parent, child) applied
    Tree,
    Unchanged,
}

impl CursorMove {
    pub fn is_change(&self) -> bool {
        !matches!(self, CursorMove::Unchanged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// The file currently open along with its chunk navigator
#[derive(Debug)]
pub struct OpenEditor<E> {
    pub node: NodeId,
    pub source_uri: String,
    pub navigator: E,
}

pub struct ChangeCursor<O: ResourceOpener> {
    opener: O,
    editor: Option<OpenEditor<O::Editor>>,
}

impl<O: ResourceOpener> ChangeCursor<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            editor: None,
        }
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn editor(&self) -> Option<&OpenEditor<O::Editor>> {
        self.editor.as_ref()
    }

    pub fn close(&mut self) {
        self.editor = None;
    }

    /// Navigator of the open editor, but only while its node is the selection
    fn active_navigator<P: Provider>(
        &mut self,
        controller: &TreeController<P>,
    ) -> Option<&mut O::Editor> {
        let selected = controller.tree().selection()?;
        match self.editor.as_mut() {
            Some(editor) if &editor.node == selected => Some(&mut editor.navigator),
            _ => None,
        }
    }

    /// Next chunk in the open file, else the next visible file
    pub async fn next<P: Provider>(&mut self, controller: &mut TreeController<P>) -> CursorMove {
        if let Some(navigator) = self.active_navigator(controller) {
            if navigator.can_navigate() && navigator.has_next() {
                navigator.next();
                return CursorMove::Chunk;
            }
        }
        let target = controller
            .tree()
            .next_visible(controller.tree().selection(), TreeNode::is_leaf)
            .map(|node| node.id().clone());
        match target {
            Some(target) => self.open(controller, target, Direction::Forward).await,
            None => {
                log::debug!("No further changes after the current position");
                CursorMove::Unchanged
            }
        }
    }

    /// Previous chunk in the open file, else the previous visible file
    pub async fn previous<P: Provider>(
        &mut self,
        controller: &mut TreeController<P>,
    ) -> CursorMove {
        if let Some(navigator) = self.active_navigator(controller) {
            if navigator.can_navigate() && navigator.has_previous() {
                navigator.previous();
                return CursorMove::Chunk;
            }
        }
        let target = controller
            .tree()
            .previous_visible(controller.tree().selection(), TreeNode::is_leaf)
            .map(|node| node.id().clone());
        match target {
            Some(target) => self.open(controller, target, Direction::Backward).await,
            None => {
                log::debug!("No earlier changes before the current position");
                CursorMove::Unchanged
            }
        }
    }

    /// Open the selected leaf, positioned before its first chunk
    pub async fn open_selected<P: Provider>(
        &mut self,
        controller: &mut TreeController<P>,
    ) -> CursorMove {
        let Some(target) = controller
            .tree()
            .selected_node()
            .filter(|node| node.is_leaf())
            .map(|node| node.id().clone())
        else {
            return CursorMove::Unchanged;
        };
        self.open(controller, target, Direction::Forward).await
    }

    async fn open<P: Provider>(
        &mut self,
        controller: &mut TreeController<P>,
        target: NodeId,
        direction: Direction,
    ) -> CursorMove {
        let Some((group, resource)) = controller.resource_for(&target) else {
            log::warn!("No resource behind {}", target);
            return CursorMove::Unchanged;
        };
        let source_uri = resource.source_uri.clone();

        let opened = self.opener.open(resource, &group.id).await;
        match opened {
            Ok(mut navigator) => {
                // A fresh editor is unpositioned; moving backward starts from its end
                if direction == Direction::Backward {
                    navigator.seek_end();
                }
                controller.tree_mut().select_node(&target);
                log::debug!("Opened {} moving {:?}", source_uri, direction);
                self.editor = Some(OpenEditor {
                    node: target.clone(),
                    source_uri,
                    navigator,
                });
                CursorMove::File(target)
            }
            Err(e) => {
                log::warn!("Could not open {}: {}", source_uri, e);
                CursorMove::Unchanged
            }
        }
    }
}
