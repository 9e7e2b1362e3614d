use crate::model::{
    compare_case_aware, compare_nodes, join_uri, relative_path, relative_segments, FolderNode,
    Group, GroupNode, LeafNode, NodeId, NodeKind, Resource, RootNode, TreeNode, ViewMode,
};
use crate::reconcile::{Reconciler, TreeViewState};
use std::cmp::Ordering;
use std::time::Instant;

/// Layout parameters for a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub view_mode: ViewMode,
    pub nesting_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Flat,
            nesting_threshold: 1,
        }
    }
}

/// A resource with its location split into segments below the repository root
#[derive(Debug)]
struct PathEntry<'a> {
    resource: &'a Resource,
    segments: Vec<String>,
}

fn compare_segments(a: &[String], b: &[String]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        match compare_case_aware(left, right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Build the root node for a provider snapshot
pub fn build_root(
    root_uri: &str,
    groups: &[Group],
    options: &BuildOptions,
    reconciler: &mut Reconciler<'_>,
) -> RootNode {
    let start_time = Instant::now();
    let groups: Vec<TreeNode> = groups
        .iter()
        .filter(|group| group.is_visible())
        .map(|group| build_group(root_uri, group, options, reconciler))
        .collect();
    log::debug!(
        "build_root: {} groups in {:?} mode built in {:?}",
        groups.len(),
        options.view_mode,
        start_time.elapsed()
    );
    RootNode {
        root_uri: root_uri.to_string(),
        groups,
    }
}

/// Build one group node with its children laid out per `options`
pub fn build_group(
    root_uri: &str,
    group: &Group,
    options: &BuildOptions,
    reconciler: &mut Reconciler<'_>,
) -> TreeNode {
    let id = NodeId::group(&group.id);
    let expanded = reconciler.group_expanded(&id);
    let selected = reconciler.selected(&id);
    let children = build_group_children(root_uri, group, options, reconciler);
    TreeNode::Group(GroupNode {
        id,
        group_id: group.id.clone(),
        label: group.label.clone(),
        expanded,
        selected,
        children,
    })
}

/// Child nodes of a group: one leaf per resource in flat mode, nested folders in tree mode
pub fn build_group_children(
    root_uri: &str,
    group: &Group,
    options: &BuildOptions,
    reconciler: &mut Reconciler<'_>,
) -> Vec<TreeNode> {
    let mut builder = FolderBuilder {
        group_id: &group.id,
        nesting_threshold: options.nesting_threshold.max(1),
        reconciler,
    };

    match options.view_mode {
        ViewMode::Flat => {
            let mut leaves: Vec<TreeNode> = group
                .resources
                .iter()
                .map(|resource| builder.leaf(resource))
                .collect();
            leaves.sort_by(compare_nodes);
            leaves
        }
        ViewMode::Tree => {
            let mut entries: Vec<PathEntry> = group
                .resources
                .iter()
                .map(|resource| PathEntry {
                    resource,
                    segments: relative_segments(root_uri, &resource.source_uri),
                })
                .collect();
            entries.sort_by(|a, b| compare_segments(&a.segments, &b.segments));
            builder.build_range(&entries, 0, root_uri)
        }
    }
}

struct FolderBuilder<'g, 'r, 'p> {
    group_id: &'g str,
    nesting_threshold: usize,
    reconciler: &'r mut Reconciler<'p>,
}

impl FolderBuilder<'_, '_, '_> {
    /// Partition a sorted range at segment depth `level`
    fn build_range(&mut self, entries: &[PathEntry], level: usize, parent_uri: &str) -> Vec<TreeNode> {
        let mut result = Vec::new();
        let mut start = 0;

        while start < entries.len() {
            let first = &entries[start];
            // The last segment is the file name, so this entry is a leaf here
            if first.segments.len() <= level + 1 {
                result.push(self.leaf(first.resource));
                start += 1;
                continue;
            }

            let key = &first.segments[level];
            let end = start
                + entries[start..]
                    .iter()
                    .take_while(|entry| entry.segments.get(level) == Some(key))
                    .count();
            let run = &entries[start..end];

            if run.len() < self.nesting_threshold {
                for entry in run {
                    result.push(self.leaf(entry.resource));
                }
            } else {
                let last = &run[run.len() - 1];
                let mut this_level = level + 1;
                // Extend while first and last agree, never swallowing a file name
                while this_level + 1 < first.segments.len()
                    && this_level + 1 < last.segments.len()
                    && first.segments[this_level] == last.segments[this_level]
                {
                    this_level += 1;
                }
                let path = first.segments[level..this_level].join("/");
                result.push(self.folder(run, this_level, path, parent_uri));
            }

            start = end;
        }

        result.sort_by(compare_nodes);
        result
    }

    fn folder(&mut self, run: &[PathEntry], level: usize, path: String, parent_uri: &str) -> TreeNode {
        let source_uri = join_uri(parent_uri, &path);
        let id = NodeId::folder(self.group_id, &source_uri);
        let expanded = self.reconciler.expanded(&id);
        let selected = self.reconciler.selected(&id);
        let children = self.build_range(run, level, &source_uri);
        TreeNode::Folder(FolderNode {
            id,
            group_id: self.group_id.to_string(),
            path,
            source_uri,
            expanded,
            selected,
            children,
        })
    }

    fn leaf(&mut self, resource: &Resource) -> TreeNode {
        let id = NodeId::member(self.group_id, &resource.source_uri);
        let selected = self.reconciler.selected(&id);
        TreeNode::Leaf(LeafNode {
            id,
            group_id: self.group_id.to_string(),
            source_uri: resource.source_uri.clone(),
            status: resource.status,
            decorations: resource.decorations.clone(),
            selected,
        })
    }
}

/// A node in visible order together with its display depth and parent location
#[derive(Debug, Clone, Copy)]
pub struct VisibleNode<'a> {
    pub node: &'a TreeNode,
    pub depth: usize,
    pub parent_uri: &'a str,
}

impl VisibleNode<'_> {
    /// Group label, folder path, or the leaf's path relative to its parent
    pub fn display_name(&self) -> String {
        match self.node {
            TreeNode::Group(group) => group.label.clone(),
            TreeNode::Folder(folder) => folder.path.clone(),
            TreeNode::Leaf(leaf) => relative_path(self.parent_uri, &leaf.source_uri).to_string(),
        }
    }
}

/// The change tree model: node storage, selection, expansion and visible order
#[derive(Debug, Clone, Default)]
pub struct ChangeTree {
    root: RootNode,
    selection: Option<NodeId>,
}

impl ChangeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly built root and apply the reconciled selection
    pub fn set_root(&mut self, root: RootNode, selection: Option<&NodeId>) {
        self.root = root;
        self.selection = None;
        match selection {
            Some(id) => {
                self.select_node(id);
            }
            None => self.clear_selection(),
        }
    }

    pub fn clear(&mut self) {
        self.root = RootNode::default();
        self.selection = None;
    }

    pub fn root(&self) -> &RootNode {
        &self.root
    }

    pub fn root_uri(&self) -> &str {
        &self.root.root_uri
    }

    pub fn is_empty(&self) -> bool {
        self.root.groups.is_empty()
    }

    /// Find a node by identity key
    pub fn find_node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.root
            .groups
            .iter()
            .find_map(|node| Self::find_node_recursive(node, id))
    }

    fn find_node_recursive<'a>(node: &'a TreeNode, id: &NodeId) -> Option<&'a TreeNode> {
        if node.id() == id {
            return Some(node);
        }
        node.children()
            .iter()
            .find_map(|child| Self::find_node_recursive(child, id))
    }

    /// Find a node by identity key (mutable)
    pub fn find_node_mut(&mut self, id: &NodeId) -> Option<&mut TreeNode> {
        self.root
            .groups
            .iter_mut()
            .find_map(|node| Self::find_node_recursive_mut(node, id))
    }

    fn find_node_recursive_mut<'a>(node: &'a mut TreeNode, id: &NodeId) -> Option<&'a mut TreeNode> {
        if node.id() == id {
            return Some(node);
        }
        node.children_mut()?
            .iter_mut()
            .find_map(|child| Self::find_node_recursive_mut(child, id))
    }

    /// Ids of the ancestors of a node, outermost first; `None` if the node is absent
    pub fn ancestors(&self, id: &NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        for group in &self.root.groups {
            if Self::collect_ancestors(group, id, &mut path) {
                return Some(path);
            }
        }
        None
    }

    fn collect_ancestors(node: &TreeNode, id: &NodeId, path: &mut Vec<NodeId>) -> bool {
        if node.id() == id {
            return true;
        }
        path.push(node.id().clone());
        for child in node.children() {
            if Self::collect_ancestors(child, id, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&TreeNode> {
        let parent_id = self.ancestors(id)?.pop()?;
        self.find_node(&parent_id)
    }

    /// Expand an expandable node
    pub fn expand_node(&mut self, id: &NodeId) -> bool {
        self.find_node_mut(id)
            .map(|node| node.set_expanded(true))
            .unwrap_or(false)
    }

    /// Collapse an expandable node
    pub fn collapse_node(&mut self, id: &NodeId) -> bool {
        self.find_node_mut(id)
            .map(|node| node.set_expanded(false))
            .unwrap_or(false)
    }

    pub fn toggle_node(&mut self, id: &NodeId) -> bool {
        match self.find_node_mut(id) {
            Some(node) => {
                let expanded = node.is_expanded();
                node.set_expanded(!expanded)
            }
            None => false,
        }
    }

    /// Expand every ancestor of a node, outermost first
    pub fn reveal(&mut self, id: &NodeId) -> bool {
        let Some(ancestors) = self.ancestors(id) else {
            log::debug!("reveal: {} is no longer in the tree", id);
            return false;
        };
        for ancestor in &ancestors {
            self.expand_node(ancestor);
        }
        true
    }

    /// Select a node, clearing any previous selection
    pub fn select_node(&mut self, id: &NodeId) -> bool {
        if self.find_node(id).is_none() {
            return false;
        }
        self.clear_selection();
        if let Some(node) = self.find_node_mut(id) {
            node.set_selected(true);
        }
        self.selection = Some(id.clone());
        true
    }

    pub fn clear_selection(&mut self) {
        for group in &mut self.root.groups {
            Self::clear_selected_recursive(group);
        }
        self.selection = None;
    }

    fn clear_selected_recursive(node: &mut TreeNode) {
        node.set_selected(false);
        if let Some(children) = node.children_mut() {
            for child in children {
                Self::clear_selected_recursive(child);
            }
        }
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.selection.as_ref().and_then(|id| self.find_node(id))
    }

    /// All visible nodes (flattened view respecting expansion state)
    pub fn visible_nodes(&self) -> Vec<VisibleNode<'_>> {
        let mut visible = Vec::new();
        for group in &self.root.groups {
            Self::collect_visible(group, 0, &self.root.root_uri, &mut visible);
        }
        visible
    }

    fn collect_visible<'a>(
        node: &'a TreeNode,
        depth: usize,
        parent_uri: &'a str,
        visible: &mut Vec<VisibleNode<'a>>,
    ) {
        visible.push(VisibleNode {
            node,
            depth,
            parent_uri,
        });
        if node.is_expanded() {
            let child_parent = node.source_uri().unwrap_or(parent_uri);
            for child in node.children() {
                Self::collect_visible(child, depth + 1, child_parent, visible);
            }
        }
    }

    /// Next visible node after `from` that satisfies `accept`.
    /// Without a usable starting point the first accepted node is returned.
    pub fn next_visible<F>(&self, from: Option<&NodeId>, accept: F) -> Option<&TreeNode>
    where
        F: Fn(&TreeNode) -> bool,
    {
        let visible = self.visible_nodes();
        let start = from
            .and_then(|id| visible.iter().position(|item| item.node.id() == id))
            .map(|index| index + 1)
            .unwrap_or(0);
        visible[start.min(visible.len())..]
            .iter()
            .map(|item| item.node)
            .find(|node| accept(node))
    }

    /// Previous visible node before `from` that satisfies `accept`.
    /// Without a usable starting point the last accepted node is returned.
    pub fn previous_visible<F>(&self, from: Option<&NodeId>, accept: F) -> Option<&TreeNode>
    where
        F: Fn(&TreeNode) -> bool,
    {
        let visible = self.visible_nodes();
        let end = from
            .and_then(|id| visible.iter().position(|item| item.node.id() == id))
            .unwrap_or(visible.len());
        visible[..end]
            .iter()
            .rev()
            .map(|item| item.node)
            .find(|node| accept(node))
    }

    /// Snapshot of expansion and selection for persistence
    pub fn view_state(&self) -> TreeViewState {
        TreeViewState::capture(&self.root)
    }

    /// Get tree statistics
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        for group in &self.root.groups {
            Self::collect_stats(group, &mut stats);
        }
        stats
    }

    fn collect_stats(node: &TreeNode, stats: &mut TreeStats) {
        match node.kind() {
            NodeKind::Group => stats.groups += 1,
            NodeKind::Folder => stats.folders += 1,
            NodeKind::Leaf => stats.files += 1,
        }
        if node.is_expanded() {
            stats.expanded += 1;
        }
        for child in node.children() {
            Self::collect_stats(child, stats);
        }
    }
}

/// Statistics about the change tree
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeStats {
    pub groups: usize,
    pub folders: usize,
    pub files: usize,
    pub expanded: usize,
}
