//! Diff chunk navigation and resource opening.
//!
//! An opened resource is represented by its diff navigator: the two sides of
//! the change are diffed with `similar` and grouped into hunks, and the
//! navigator walks those hunks one at a time.

use crate::error::{Result, ScmTreeError};
use crate::model::{relative_path, ChangeStatus, Resource};
use async_trait::async_trait;
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::path::PathBuf;

/// Lines of context kept around each change when grouping hunks
pub const HUNK_CONTEXT: usize = 3;

/// Position-aware navigation over the diff chunks of an open editor
#[cfg_attr(test, mockall::automock)]
pub trait DiffNavigator {
    fn can_navigate(&self) -> bool;
    fn has_next(&self) -> bool;
    fn next(&mut self);
    fn has_previous(&self) -> bool;
    fn previous(&mut self);
    /// Position past the last chunk, used when a file is entered moving backward
    fn seek_end(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start + 1,
            self.old_len,
            self.new_start + 1,
            self.new_len
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Before,
    At(usize),
    After,
}

/// Hunk-by-hunk navigator; starts unpositioned before the first hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkNavigator {
    hunks: Vec<Hunk>,
    cursor: Cursor,
}

impl HunkNavigator {
    pub fn new(hunks: Vec<Hunk>) -> Self {
        Self {
            hunks,
            cursor: Cursor::Before,
        }
    }

    pub fn from_texts(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_lines(old, new);
        let hunks = diff
            .grouped_ops(HUNK_CONTEXT)
            .iter()
            .filter_map(|group| {
                let first = group.first()?;
                let last = group.last()?;
                let lines = group
                    .iter()
                    .flat_map(|op| diff.iter_changes(op))
                    .map(|change| DiffLine {
                        tag: match change.tag() {
                            ChangeTag::Equal => LineTag::Context,
                            ChangeTag::Insert => LineTag::Added,
                            ChangeTag::Delete => LineTag::Removed,
                        },
                        text: change.value().trim_end_matches(['\r', '\n']).to_string(),
                    })
                    .collect();
                Some(Hunk {
                    old_start: first.old_range().start,
                    old_len: last.old_range().end - first.old_range().start,
                    new_start: first.new_range().start,
                    new_len: last.new_range().end - first.new_range().start,
                    lines,
                })
            })
            .collect();
        Self::new(hunks)
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Index of the current hunk, if positioned on one
    pub fn current(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(index) => Some(index),
            _ => None,
        }
    }
}

impl DiffNavigator for HunkNavigator {
    fn can_navigate(&self) -> bool {
        !self.hunks.is_empty()
    }

    fn has_next(&self) -> bool {
        match self.cursor {
            Cursor::Before => !self.hunks.is_empty(),
            Cursor::At(index) => index + 1 < self.hunks.len(),
            Cursor::After => false,
        }
    }

    fn next(&mut self) {
        if self.has_next() {
            self.cursor = match self.cursor {
                Cursor::Before => Cursor::At(0),
                Cursor::At(index) => Cursor::At(index + 1),
                Cursor::After => Cursor::After,
            };
        }
    }

    fn has_previous(&self) -> bool {
        match self.cursor {
            Cursor::Before => false,
            Cursor::At(index) => index > 0,
            Cursor::After => !self.hunks.is_empty(),
        }
    }

    fn previous(&mut self) {
        if self.has_previous() {
            self.cursor = match self.cursor {
                Cursor::After => Cursor::At(self.hunks.len() - 1),
                Cursor::At(index) => Cursor::At(index - 1),
                Cursor::Before => Cursor::Before,
            };
        }
    }

    fn seek_end(&mut self) {
        self.cursor = Cursor::After;
    }
}

/// Opens a resource into an editor with diff navigation
#[async_trait(?Send)]
pub trait ResourceOpener {
    type Editor: DiffNavigator;

    async fn open(&self, resource: &Resource, group_id: &str) -> Result<Self::Editor>;
}

/// Opens resources of a git work tree, diffing the sides that match the owning group
#[derive(Debug, Clone)]
pub struct WorkingTreeOpener {
    workdir: PathBuf,
    root_uri: String,
}

impl WorkingTreeOpener {
    pub fn new(workdir: impl Into<PathBuf>, root_uri: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            root_uri: root_uri.into(),
        }
    }

    /// Contents of a git object spec such as `HEAD:path`; empty when it does not exist
    async fn show(&self, spec: &str) -> Result<String> {
        let output = tokio::process::Command::new("git")
            .args(["show", spec])
            .current_dir(&self.workdir)
            .output()
            .await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            log::debug!("git show {} yielded nothing", spec);
            Ok(String::new())
        }
    }

    async fn read_worktree(&self, relative: &str, status: ChangeStatus) -> Result<String> {
        match tokio::fs::read_to_string(self.workdir.join(relative)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && status == ChangeStatus::Deleted => {
                Ok(String::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait(?Send)]
impl ResourceOpener for WorkingTreeOpener {
    type Editor = HunkNavigator;

    async fn open(&self, resource: &Resource, group_id: &str) -> Result<HunkNavigator> {
        let relative = relative_path(&self.root_uri, &resource.source_uri);
        let sides = match group_id {
            "index" => {
                let old = self.show(&format!("HEAD:{}", relative)).await?;
                let new = self.show(&format!(":{}", relative)).await?;
                (old, new)
            }
            "merge" => {
                let ours = self.show(&format!(":2:{}", relative)).await?;
                let theirs = self.show(&format!(":3:{}", relative)).await?;
                (ours, theirs)
            }
            _ => {
                let old = match resource.status {
                    ChangeStatus::Untracked => String::new(),
                    _ => self.show(&format!(":{}", relative)).await?,
                };
                let new = self.read_worktree(relative, resource.status).await?;
                (old, new)
            }
        };
        let (old, new) = sides;
        Ok(HunkNavigator::from_texts(&old, &new))
    }
}

/// Before/after text of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DiffSides {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
}

/// Opener backed by in-memory texts keyed by source uri
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    sides: HashMap<String, DiffSides>,
}

impl MemoryOpener {
    pub fn new(sides: HashMap<String, DiffSides>) -> Self {
        Self { sides }
    }

    pub fn sides(&self) -> &HashMap<String, DiffSides> {
        &self.sides
    }
}

#[async_trait(?Send)]
impl ResourceOpener for MemoryOpener {
    type Editor = HunkNavigator;

    async fn open(&self, resource: &Resource, _group_id: &str) -> Result<HunkNavigator> {
        let sides = self
            .sides
            .get(&resource.source_uri)
            .ok_or_else(|| ScmTreeError::Open {
                uri: resource.source_uri.clone(),
                reason: "no content available".to_string(),
            })?;
        Ok(HunkNavigator::from_texts(&sides.old, &sides.new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(lines: usize) -> String {
        (1..=lines).map(|i| format!("line {}\n", i)).collect()
    }

    fn two_hunks() -> HunkNavigator {
        let old = numbered(30);
        let new = old
            .replace("line 2\n", "line two\n")
            .replace("line 25\n", "line twenty-five\n");
        HunkNavigator::from_texts(&old, &new)
    }

    #[test]
    fn test_hunks_are_grouped() {
        let navigator = two_hunks();
        assert_eq!(navigator.hunks().len(), 2);
        let first = &navigator.hunks()[0];
        assert_eq!(first.old_start, 0);
        assert!(first
            .lines
            .iter()
            .any(|line| line.tag == LineTag::Added && line.text == "line two"));
        assert!(first
            .lines
            .iter()
            .any(|line| line.tag == LineTag::Removed && line.text == "line 2"));
        assert!(navigator.hunks()[1].header().starts_with("@@ -"));
    }

    #[test]
    fn test_identical_texts_have_nothing_to_navigate() {
        let navigator = HunkNavigator::from_texts("same\n", "same\n");
        assert!(!navigator.can_navigate());
        assert!(!navigator.has_next());
        assert!(!navigator.has_previous());
    }

    #[test]
    fn test_forward_then_backward() {
        let mut navigator = two_hunks();
        assert_eq!(navigator.current(), None);
        assert!(navigator.has_next());
        assert!(!navigator.has_previous());

        navigator.next();
        assert_eq!(navigator.current(), Some(0));
        navigator.next();
        assert_eq!(navigator.current(), Some(1));
        assert!(!navigator.has_next());
        navigator.next();
        assert_eq!(navigator.current(), Some(1));

        navigator.previous();
        assert_eq!(navigator.current(), Some(0));
        assert!(!navigator.has_previous());
    }

    #[test]
    fn test_seek_end_walks_backward_from_last_hunk() {
        let mut navigator = two_hunks();
        navigator.seek_end();
        assert!(!navigator.has_next());
        assert!(navigator.has_previous());
        navigator.previous();
        assert_eq!(navigator.current(), Some(1));
    }

    #[tokio::test]
    async fn test_memory_opener() {
        let mut sides = HashMap::new();
        sides.insert(
            "/repo/a.txt".to_string(),
            DiffSides {
                old: "a\n".to_string(),
                new: "b\n".to_string(),
            },
        );
        let opener = MemoryOpener::new(sides);
        let editor = opener
            .open(&Resource::new("/repo/a.txt", ChangeStatus::Modified), "changes")
            .await
            .unwrap();
        assert_eq!(editor.hunks().len(), 1);

        let missing = opener
            .open(&Resource::new("/repo/b.txt", ChangeStatus::Modified), "changes")
            .await;
        assert!(matches!(missing, Err(ScmTreeError::Open { .. })));
    }
}
