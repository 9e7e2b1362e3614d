//! Provider backed by a git work tree.
//!
//! The repository is located with `gix::discover`; pending changes come from
//! `git status --porcelain=v1 -z` and are sorted into merge, index and
//! working tree groups.

use crate::error::{Result, ScmTreeError};
use crate::model::{join_uri, ChangeStatus, Group, Resource};
use crate::provider::{ChangeNotifier, Provider, Subscription};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

pub const MERGE_GROUP: &str = "merge";
pub const INDEX_GROUP: &str = "index";
pub const WORKING_TREE_GROUP: &str = "workingTree";

/// Locate the work tree containing `path`
pub fn open_repository<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let repo = gix::discover(path)?;
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| ScmTreeError::Git("bare repositories have no pending changes".to_string()))
}

/// Groups in display order, all empty
pub fn empty_groups() -> Vec<Group> {
    vec![
        Group::new(MERGE_GROUP, "Merge Changes").hidden_when_empty(),
        Group::new(INDEX_GROUP, "Staged Changes").hidden_when_empty(),
        Group::new(WORKING_TREE_GROUP, "Changes"),
    ]
}

fn is_conflict(x: u8, y: u8) -> bool {
    matches!(
        (x, y),
        (b'D', b'D') | (b'A', b'U') | (b'U', b'D') | (b'U', b'A') | (b'D', b'U') | (b'A', b'A') | (b'U', b'U')
    )
}

fn status_for(code: u8) -> Option<ChangeStatus> {
    match code {
        b'M' => Some(ChangeStatus::Modified),
        b'A' => Some(ChangeStatus::Added),
        b'D' => Some(ChangeStatus::Deleted),
        b'R' => Some(ChangeStatus::Renamed),
        b'C' => Some(ChangeStatus::Copied),
        b'T' => Some(ChangeStatus::TypeChanged),
        _ => None,
    }
}

/// Sort `git status --porcelain=v1 -z` output into groups
pub fn parse_porcelain(output: &[u8], root_uri: &str) -> Vec<Group> {
    let mut groups = empty_groups();
    let mut entries = output.split(|byte| *byte == 0).filter(|entry| !entry.is_empty());

    while let Some(entry) = entries.next() {
        if entry.len() < 4 {
            log::warn!("Skipping malformed status entry {:?}", String::from_utf8_lossy(entry));
            continue;
        }
        let (x, y) = (entry[0], entry[1]);
        let path = String::from_utf8_lossy(&entry[3..]).into_owned();
        // Renames and copies carry the original path as the following entry
        if matches!(x, b'R' | b'C') || matches!(y, b'R' | b'C') {
            entries.next();
        }
        let uri = join_uri(root_uri, &path);

        if is_conflict(x, y) {
            push(&mut groups, MERGE_GROUP, Resource::new(uri, ChangeStatus::Conflicted));
            continue;
        }
        if x == b'?' {
            push(&mut groups, WORKING_TREE_GROUP, Resource::new(uri, ChangeStatus::Untracked));
            continue;
        }
        if x == b'!' {
            continue;
        }
        if let Some(status) = status_for(x) {
            push(&mut groups, INDEX_GROUP, Resource::new(uri.clone(), status));
        }
        if let Some(status) = status_for(y) {
            push(&mut groups, WORKING_TREE_GROUP, Resource::new(uri, status));
        }
    }
    groups
}

fn push(groups: &mut [Group], group_id: &str, resource: Resource) {
    if let Some(group) = groups.iter_mut().find(|group| group.id == group_id) {
        group.resources.push(resource);
    }
}

#[derive(Debug)]
pub struct GitProvider {
    workdir: PathBuf,
    root_uri: String,
    groups: Vec<Group>,
    notifier: ChangeNotifier,
}

impl GitProvider {
    /// Discover the repository containing `path` and load its status
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let workdir = open_repository(path)?;
        let root_uri = workdir.to_string_lossy().trim_end_matches('/').to_string();
        log::info!("Opened git work tree at {}", root_uri);
        let mut provider = Self {
            workdir,
            root_uri,
            groups: empty_groups(),
            notifier: ChangeNotifier::new(),
        };
        provider.read_status()?;
        Ok(provider)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn read_status(&mut self) -> Result<bool> {
        let start_time = Instant::now();
        let output = Command::new("git")
            .args(["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .current_dir(&self.workdir)
            .output()?;
        if !output.status.success() {
            return Err(ScmTreeError::Git(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let groups = parse_porcelain(&output.stdout, &self.root_uri);
        log::debug!("git status parsed in {:?}", start_time.elapsed());
        if groups == self.groups {
            return Ok(false);
        }
        self.groups = groups;
        self.notifier.notify();
        Ok(true)
    }
}

impl Provider for GitProvider {
    fn id(&self) -> &str {
        "git"
    }

    fn root_uri(&self) -> &str {
        &self.root_uri
    }

    fn groups(&self) -> &[Group] {
        &self.groups
    }

    fn subscribe(&self) -> Subscription {
        self.notifier.subscribe(0)
    }

    /// Re-read status; notifies subscribers when anything changed
    fn refresh(&mut self) -> Result<bool> {
        self.read_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(groups: &[Group], id: &str) -> Vec<(String, ChangeStatus)> {
        groups
            .iter()
            .find(|group| group.id == id)
            .unwrap()
            .resources
            .iter()
            .map(|resource| (resource.source_uri.clone(), resource.status))
            .collect()
    }

    #[test]
    fn test_parse_staged_and_unstaged() {
        let output = b"MM src/main.rs\0A  new.rs\0 D gone.rs\0?? scratch.txt\0";
        let groups = parse_porcelain(output, "/repo");
        assert_eq!(
            uris(&groups, INDEX_GROUP),
            vec![
                ("/repo/src/main.rs".to_string(), ChangeStatus::Modified),
                ("/repo/new.rs".to_string(), ChangeStatus::Added),
            ]
        );
        assert_eq!(
            uris(&groups, WORKING_TREE_GROUP),
            vec![
                ("/repo/src/main.rs".to_string(), ChangeStatus::Modified),
                ("/repo/gone.rs".to_string(), ChangeStatus::Deleted),
                ("/repo/scratch.txt".to_string(), ChangeStatus::Untracked),
            ]
        );
        assert!(uris(&groups, MERGE_GROUP).is_empty());
    }

    #[test]
    fn test_parse_rename_uses_new_path() {
        let output = b"R  renamed.rs\0original.rs\0 M other.rs\0";
        let groups = parse_porcelain(output, "/repo");
        assert_eq!(
            uris(&groups, INDEX_GROUP),
            vec![("/repo/renamed.rs".to_string(), ChangeStatus::Renamed)]
        );
        assert_eq!(
            uris(&groups, WORKING_TREE_GROUP),
            vec![("/repo/other.rs".to_string(), ChangeStatus::Modified)]
        );
    }

    #[test]
    fn test_conflicts_only_in_merge_group() {
        let output = b"UU both.rs\0AA added.rs\0";
        let groups = parse_porcelain(output, "/repo");
        assert_eq!(uris(&groups, MERGE_GROUP).len(), 2);
        assert!(uris(&groups, INDEX_GROUP).is_empty());
        assert!(uris(&groups, WORKING_TREE_GROUP).is_empty());
        assert!(groups.iter().all(|group| group.id != MERGE_GROUP || group.is_visible()));
    }

    #[test]
    fn test_empty_groups_visibility() {
        let groups = parse_porcelain(b"", "/repo");
        let visible: Vec<_> = groups
            .iter()
            .filter(|group| group.is_visible())
            .map(|group| group.id.as_str())
            .collect();
        assert_eq!(visible, vec![WORKING_TREE_GROUP]);
    }
}
