use scm_tree::config::TreeConfig;
use scm_tree::controller::TreeController;
use scm_tree::diff::{DiffNavigator, ResourceOpener, WorkingTreeOpener};
use scm_tree::git::{GitProvider, INDEX_GROUP, MERGE_GROUP, WORKING_TREE_GROUP};
use scm_tree::main_lib::render_status_tree;
use scm_tree::model::{ChangeStatus, Group, ViewMode};
use scm_tree::provider::Provider;
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn git(repo: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(["-c", "user.name=Test User", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(repo)
        .output()
        .expect("git is installed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Repository with one commit containing src/main.rs and notes.txt
fn create_test_git_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path();
    git(repo, &["init", "-q"]);
    fs::create_dir_all(repo.join("src")).unwrap();
    fs::write(repo.join("src/main.rs"), "fn main() {}\n").unwrap();
    fs::write(repo.join("notes.txt"), "one\ntwo\n").unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-q", "-m", "Initial commit"]);
    temp_dir
}

fn resources(provider: &GitProvider, group_id: &str) -> Vec<(String, ChangeStatus)> {
    let root = provider.root_uri();
    provider
        .groups()
        .iter()
        .find(|group: &&Group| group.id == group_id)
        .map(|group| {
            group
                .resources
                .iter()
                .map(|resource| {
                    let relative = resource.source_uri[root.len() + 1..].to_string();
                    (relative, resource.status)
                })
                .collect()
        })
        .unwrap_or_default()
}

#[test]
#[serial]
fn clean_repository_has_only_the_changes_group() {
    let repo = create_test_git_repo();
    let provider = assert_ok!(GitProvider::discover(repo.path().join("src")));

    assert_eq!(provider.id(), "git");
    let visible: Vec<_> = provider
        .groups()
        .iter()
        .filter(|group| group.is_visible())
        .map(|group| group.id.as_str())
        .collect();
    assert_eq!(visible, vec![WORKING_TREE_GROUP]);
    assert!(resources(&provider, WORKING_TREE_GROUP).is_empty());
}

#[test]
#[serial]
fn outside_a_repository_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert_err!(GitProvider::discover(dir.path()));
}

#[test]
#[serial]
fn staged_unstaged_and_untracked_changes_are_grouped() {
    let repo = create_test_git_repo();
    let path = repo.path();
    fs::write(path.join("src/main.rs"), "fn main() { run(); }\n").unwrap();
    git(path, &["add", "src/main.rs"]);
    fs::write(path.join("notes.txt"), "one\nTWO\n").unwrap();
    fs::write(path.join("src/new.rs"), "pub fn run() {}\n").unwrap();

    let provider = GitProvider::discover(path).unwrap();
    assert_eq!(
        resources(&provider, INDEX_GROUP),
        vec![("src/main.rs".to_string(), ChangeStatus::Modified)]
    );
    let mut working = resources(&provider, WORKING_TREE_GROUP);
    working.sort();
    assert_eq!(
        working,
        vec![
            ("notes.txt".to_string(), ChangeStatus::Modified),
            ("src/new.rs".to_string(), ChangeStatus::Untracked),
        ]
    );
    assert!(resources(&provider, MERGE_GROUP).is_empty());
}

#[test]
#[serial]
fn refresh_notifies_only_on_change() {
    let repo = create_test_git_repo();
    let mut provider = GitProvider::discover(repo.path()).unwrap();
    let subscription = provider.subscribe();

    assert!(!provider.refresh().unwrap());
    assert!(!subscription.has_changed());

    fs::write(repo.path().join("notes.txt"), "changed\n").unwrap();
    assert!(provider.refresh().unwrap());
    assert!(subscription.has_changed());
}

#[test]
#[serial]
fn controller_tracks_the_work_tree() {
    let repo = create_test_git_repo();
    fs::write(repo.path().join("src/main.rs"), "fn main() { }\n").unwrap();

    let mut controller = TreeController::new(TreeConfig {
        view_mode: ViewMode::Tree,
        ..TreeConfig::default()
    });
    controller.select_repository(Some(GitProvider::discover(repo.path()).unwrap()));
    assert_eq!(render_status_tree(controller.tree()), "Changes\n  src/\n    M main.rs\n");

    fs::write(repo.path().join("README.md"), "# readme\n").unwrap();
    assert!(controller.provider_mut().unwrap().refresh().unwrap());
    assert!(controller.poll_changes());
    assert_eq!(
        render_status_tree(controller.tree()),
        "Changes\n  src/\n    M main.rs\n  U README.md\n"
    );
}

#[tokio::test]
#[serial]
async fn working_tree_opener_diffs_the_right_sides() {
    let repo = create_test_git_repo();
    let path = repo.path();
    fs::write(path.join("notes.txt"), "one\nTWO\n").unwrap();
    git(path, &["add", "notes.txt"]);
    fs::write(path.join("notes.txt"), "one\nTWO\nthree\n").unwrap();

    let provider = GitProvider::discover(path).unwrap();
    let opener = WorkingTreeOpener::new(provider.workdir(), provider.root_uri());
    let group = |id: &str| {
        provider
            .groups()
            .iter()
            .find(|group| group.id == id)
            .unwrap()
            .clone()
    };

    // HEAD against the index: two -> TWO
    let staged = group(INDEX_GROUP);
    let navigator = opener.open(&staged.resources[0], INDEX_GROUP).await.unwrap();
    assert!(navigator.can_navigate());
    let lines: Vec<_> = navigator.hunks()[0]
        .lines
        .iter()
        .map(|line| line.text.as_str())
        .collect();
    assert!(lines.contains(&"two"));
    assert!(lines.contains(&"TWO"));
    assert!(!lines.contains(&"three"));

    // Index against the work tree: only the appended line
    let unstaged = group(WORKING_TREE_GROUP);
    let navigator = opener
        .open(&unstaged.resources[0], WORKING_TREE_GROUP)
        .await
        .unwrap();
    assert_eq!(navigator.hunks().len(), 1);
    assert!(navigator.hunks()[0]
        .lines
        .iter()
        .any(|line| line.text == "three"));
    assert!(!navigator.hunks()[0].lines.iter().any(|line| line.text == "two"));
}
