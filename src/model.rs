use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Status glyph, color and tooltip shown next to a changed resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decorations {
    pub color: Option<String>,
    pub letter: Option<char>,
    pub tooltip: Option<String>,
}

impl Decorations {
    pub fn for_status(status: ChangeStatus) -> Self {
        Self {
            color: Some(status.color().to_string()),
            letter: Some(status.letter()),
            tooltip: Some(status.label().to_string()),
        }
    }
}

/// Kind of change a resource carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    #[default]
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Conflicted,
    TypeChanged,
}

impl ChangeStatus {
    pub fn letter(self) -> char {
        match self {
            ChangeStatus::Modified => 'M',
            ChangeStatus::Added => 'A',
            ChangeStatus::Deleted => 'D',
            ChangeStatus::Renamed => 'R',
            ChangeStatus::Copied => 'C',
            ChangeStatus::Untracked => 'U',
            ChangeStatus::Conflicted => '!',
            ChangeStatus::TypeChanged => 'T',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChangeStatus::Modified => "Modified",
            ChangeStatus::Added => "Added",
            ChangeStatus::Deleted => "Deleted",
            ChangeStatus::Renamed => "Renamed",
            ChangeStatus::Copied => "Copied",
            ChangeStatus::Untracked => "Untracked",
            ChangeStatus::Conflicted => "Conflict",
            ChangeStatus::TypeChanged => "Type changed",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ChangeStatus::Modified | ChangeStatus::TypeChanged => "yellow",
            ChangeStatus::Added | ChangeStatus::Untracked => "green",
            ChangeStatus::Deleted => "red",
            ChangeStatus::Renamed | ChangeStatus::Copied => "cyan",
            ChangeStatus::Conflicted => "magenta",
        }
    }
}

/// One changed item, owned by exactly one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub source_uri: String,
    #[serde(default)]
    pub status: ChangeStatus,
    #[serde(default)]
    pub decorations: Option<Decorations>,
}

impl Resource {
    pub fn new(source_uri: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            source_uri: source_uri.into(),
            status,
            decorations: Some(Decorations::for_status(status)),
        }
    }
}

/// A named bucket of resources supplied by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub hide_when_empty: bool,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Group {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            hide_when_empty: false,
            resources: Vec::new(),
        }
    }

    pub fn hidden_when_empty(mut self) -> Self {
        self.hide_when_empty = true;
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Whether this group produces a node in the tree
    pub fn is_visible(&self) -> bool {
        !(self.hide_when_empty && self.resources.is_empty())
    }
}

/// How resources are laid out under their group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Tree,
    #[default]
    Flat,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Tree => "tree",
            ViewMode::Flat => "flat",
        }
    }

    /// Anything other than "tree" reads as flat
    pub fn parse(value: &str) -> Self {
        if value == "tree" {
            ViewMode::Tree
        } else {
            ViewMode::Flat
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Tree => ViewMode::Flat,
            ViewMode::Flat => ViewMode::Tree,
        }
    }
}

impl Serialize for ViewMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ViewMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_str().map(ViewMode::parse).unwrap_or(ViewMode::Flat))
    }
}

/// Identity key matching nodes across rebuilds.
///
/// Group nodes use the group id and leaves use `group_id:source_uri`. Folders add a
/// trailing `/`, since git can report a deleted file `a` next to new files under `a/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn group(group_id: &str) -> Self {
        NodeId(group_id.to_string())
    }

    pub fn member(group_id: &str, source_uri: &str) -> Self {
        NodeId(format!("{}:{}", group_id, source_uri))
    }

    pub fn folder(group_id: &str, source_uri: &str) -> Self {
        NodeId(format!("{}:{}/", group_id, source_uri.trim_end_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Folder,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub id: NodeId,
    pub group_id: String,
    pub label: String,
    pub expanded: bool,
    pub selected: bool,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub id: NodeId,
    pub group_id: String,
    /// Joined relative segment(s) this folder stands for
    pub path: String,
    pub source_uri: String,
    pub expanded: bool,
    pub selected: bool,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub id: NodeId,
    pub group_id: String,
    pub source_uri: String,
    pub status: ChangeStatus,
    pub decorations: Option<Decorations>,
    pub selected: bool,
}

/// A node of the change tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Group(GroupNode),
    Folder(FolderNode),
    Leaf(LeafNode),
}

impl TreeNode {
    pub fn id(&self) -> &NodeId {
        match self {
            TreeNode::Group(node) => &node.id,
            TreeNode::Folder(node) => &node.id,
            TreeNode::Leaf(node) => &node.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TreeNode::Group(_) => NodeKind::Group,
            TreeNode::Folder(_) => NodeKind::Folder,
            TreeNode::Leaf(_) => NodeKind::Leaf,
        }
    }

    pub fn group_id(&self) -> &str {
        match self {
            TreeNode::Group(node) => &node.group_id,
            TreeNode::Folder(node) => &node.group_id,
            TreeNode::Leaf(node) => &node.group_id,
        }
    }

    pub fn source_uri(&self) -> Option<&str> {
        match self {
            TreeNode::Group(_) => None,
            TreeNode::Folder(node) => Some(&node.source_uri),
            TreeNode::Leaf(node) => Some(&node.source_uri),
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Group(node) => &node.children,
            TreeNode::Folder(node) => &node.children,
            TreeNode::Leaf(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<TreeNode>> {
        match self {
            TreeNode::Group(node) => Some(&mut node.children),
            TreeNode::Folder(node) => Some(&mut node.children),
            TreeNode::Leaf(_) => None,
        }
    }

    pub fn is_expandable(&self) -> bool {
        !matches!(self, TreeNode::Leaf(_))
    }

    pub fn is_expanded(&self) -> bool {
        match self {
            TreeNode::Group(node) => node.expanded,
            TreeNode::Folder(node) => node.expanded,
            TreeNode::Leaf(_) => false,
        }
    }

    /// Returns false for leaves, which cannot expand
    pub fn set_expanded(&mut self, expanded: bool) -> bool {
        match self {
            TreeNode::Group(node) => node.expanded = expanded,
            TreeNode::Folder(node) => node.expanded = expanded,
            TreeNode::Leaf(_) => return false,
        }
        true
    }

    pub fn is_selected(&self) -> bool {
        match self {
            TreeNode::Group(node) => node.selected,
            TreeNode::Folder(node) => node.selected,
            TreeNode::Leaf(node) => node.selected,
        }
    }

    pub fn set_selected(&mut self, selected: bool) {
        match self {
            TreeNode::Group(node) => node.selected = selected,
            TreeNode::Folder(node) => node.selected = selected,
            TreeNode::Leaf(node) => node.selected = selected,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            TreeNode::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf(_))
    }
}

/// Repository root plus its group nodes; rebuilt wholesale on every refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootNode {
    pub root_uri: String,
    /// Always `TreeNode::Group` entries
    pub groups: Vec<TreeNode>,
}

/// Folders before leaves, then case-aware by source location
pub fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.is_leaf(), b.is_leaf()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => compare_case_aware(a.source_uri().unwrap_or(""), b.source_uri().unwrap_or("")),
    }
}

/// Case-insensitive ordering with a case-sensitive tie break, so equal means identical
pub fn compare_case_aware(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn join_uri(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), relative)
    }
}

/// Path of `uri` below `base`, or the whole uri when it is not underneath
pub fn relative_path<'a>(base: &str, uri: &'a str) -> &'a str {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return uri.trim_start_matches('/');
    }
    match uri.strip_prefix(base) {
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => uri,
    }
}

pub fn relative_segments(base: &str, uri: &str) -> Vec<String> {
    relative_path(base, uri)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
