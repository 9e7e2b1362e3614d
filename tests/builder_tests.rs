use proptest::prelude::*;
use scm_tree::model::{
    compare_case_aware, ChangeStatus, Group, NodeId, Resource, TreeNode, ViewMode,
};
use scm_tree::reconcile::{Expansion, PriorIndex, Reconciler};
use scm_tree::tree::{build_group_children, build_root, BuildOptions, ChangeTree};
use std::cmp::Ordering;
use std::collections::BTreeSet;

const ROOT: &str = "/repo";

fn group_of(paths: &[String]) -> Group {
    paths.iter().fold(Group::new("changes", "Changes"), |group, path| {
        group.with_resource(Resource::new(
            format!("{}/{}", ROOT, path),
            ChangeStatus::Modified,
        ))
    })
}

fn build(paths: &[String], mode: ViewMode, threshold: usize) -> Vec<TreeNode> {
    let prior = PriorIndex::new();
    let mut reconciler = Reconciler::new(&prior, Expansion::Expanded);
    let options = BuildOptions {
        view_mode: mode,
        nesting_threshold: threshold,
    };
    build_group_children(ROOT, &group_of(paths), &options, &mut reconciler)
}

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|path| path.to_string()).collect()
}

/// Folder names and file names come from disjoint alphabets so no path is
/// both a file and a folder.
fn path_strategy() -> impl Strategy<Value = String> {
    let folder = prop::sample::select(vec!["a", "b", "B", "src", "Src"]);
    let file = prop::sample::select(vec!["x.txt", "y.rs", "Z.md", "mod.rs"]);
    (prop::collection::vec(folder, 0..4), file).prop_map(|(folders, file)| {
        let mut segments: Vec<&str> = folders;
        segments.push(file);
        segments.join("/")
    })
}

fn resource_sets() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(path_strategy(), 1..24)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
}

/// File names overlap folder names, so `a` can be a file next to folder `a/`.
fn overlapping_path_strategy() -> impl Strategy<Value = String> {
    let folder = prop::sample::select(vec!["a", "b", "src"]);
    let file = prop::sample::select(vec!["a", "b", "src", "x.txt"]);
    (prop::collection::vec(folder, 0..3), file).prop_map(|(folders, file)| {
        let mut segments: Vec<&str> = folders;
        segments.push(file);
        segments.join("/")
    })
}

fn overlapping_resource_sets() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(overlapping_path_strategy(), 1..16)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
}

fn check_sibling_order(nodes: &[TreeNode]) -> Result<(), TestCaseError> {
    for pair in nodes.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        match (left.is_leaf(), right.is_leaf()) {
            (true, false) => {
                return Err(TestCaseError::fail("leaf sorted before folder"));
            }
            (false, true) => {}
            _ => {
                prop_assert_eq!(
                    compare_case_aware(left.source_uri().unwrap(), right.source_uri().unwrap()),
                    Ordering::Less
                );
            }
        }
    }
    for node in nodes {
        check_sibling_order(node.children())?;
    }
    Ok(())
}

fn collect_leaves(nodes: &[TreeNode], parent_uri: &str, out: &mut Vec<String>) -> Result<(), TestCaseError> {
    for node in nodes {
        let uri = node.source_uri().unwrap();
        prop_assert!(
            uri.starts_with(&format!("{}/", parent_uri)),
            "{} is not below {}",
            uri,
            parent_uri
        );
        match node {
            TreeNode::Leaf(_) => out.push(uri.to_string()),
            TreeNode::Folder(folder) => {
                prop_assert!(!folder.children.is_empty());
                collect_leaves(&folder.children, uri, out)?;
            }
            TreeNode::Group(_) => return Err(TestCaseError::fail("group below a group")),
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn rebuilding_is_deterministic(set in resource_sets(), threshold in 1usize..4) {
        prop_assert_eq!(
            build(&set, ViewMode::Tree, threshold),
            build(&set, ViewMode::Tree, threshold)
        );
        prop_assert_eq!(
            build(&set, ViewMode::Flat, threshold),
            build(&set, ViewMode::Flat, threshold)
        );
    }

    #[test]
    fn input_order_does_not_matter(set in resource_sets(), threshold in 1usize..4) {
        let mut reversed = set.clone();
        reversed.reverse();
        prop_assert_eq!(
            build(&set, ViewMode::Tree, threshold),
            build(&reversed, ViewMode::Tree, threshold)
        );
    }

    #[test]
    fn folders_precede_leaves_and_siblings_are_ordered(set in resource_sets(), threshold in 1usize..4) {
        check_sibling_order(&build(&set, ViewMode::Tree, threshold))?;
        check_sibling_order(&build(&set, ViewMode::Flat, threshold))?;
    }

    #[test]
    fn every_resource_appears_once_below_its_folders(set in resource_sets(), threshold in 1usize..4) {
        let mut leaves = Vec::new();
        collect_leaves(&build(&set, ViewMode::Tree, threshold), ROOT, &mut leaves)?;
        leaves.sort();
        let mut expected: Vec<String> = set.iter().map(|path| format!("{}/{}", ROOT, path)).collect();
        expected.sort();
        prop_assert_eq!(leaves, expected);
    }

    #[test]
    fn flat_mode_never_creates_folders(set in resource_sets()) {
        let nodes = build(&set, ViewMode::Flat, 1);
        prop_assert_eq!(nodes.len(), set.len());
        prop_assert!(nodes.iter().all(TreeNode::is_leaf));
    }

    #[test]
    fn every_leaf_is_reachable_when_files_shadow_folders(
        set in overlapping_resource_sets(),
        threshold in 1usize..4,
    ) {
        let prior = PriorIndex::new();
        let mut reconciler = Reconciler::new(&prior, Expansion::Expanded);
        let options = BuildOptions {
            view_mode: ViewMode::Tree,
            nesting_threshold: threshold,
        };
        let mut tree = ChangeTree::new();
        tree.set_root(build_root(ROOT, &[group_of(&set)], &options, &mut reconciler), None);

        for path in &set {
            let id = NodeId::member("changes", &format!("{}/{}", ROOT, path));
            let node = tree.find_node(&id);
            prop_assert!(node.map_or(false, TreeNode::is_leaf), "{} is not a leaf", path);
        }

        let mut seen = BTreeSet::new();
        let mut current: Option<NodeId> = None;
        for _ in 0..set.len() + 2 {
            let Some(next) = tree
                .next_visible(current.as_ref(), TreeNode::is_leaf)
                .map(|node| node.id().clone())
            else {
                break;
            };
            prop_assert!(seen.insert(next.clone()), "{} visited twice", next.as_str());
            current = Some(next);
        }
        prop_assert_eq!(seen.len(), set.len());
    }
}

#[test]
fn shared_folder_with_sibling_file() {
    let nodes = build(&paths(&["a/x.txt", "a/y.txt", "b.txt"]), ViewMode::Tree, 1);
    assert_eq!(nodes.len(), 2);
    match &nodes[0] {
        TreeNode::Folder(folder) => {
            assert_eq!(folder.path, "a");
            assert_eq!(folder.id, NodeId::folder("changes", "/repo/a"));
            let children: Vec<_> = folder.children.iter().map(|c| c.source_uri().unwrap()).collect();
            assert_eq!(children, vec!["/repo/a/x.txt", "/repo/a/y.txt"]);
        }
        other => panic!("expected folder first, got {:?}", other.kind()),
    }
    assert_eq!(nodes[1].source_uri(), Some("/repo/b.txt"));
}

#[test]
fn single_nested_file_keeps_its_folder_at_threshold_one() {
    let nodes = build(&paths(&["a/x.txt"]), ViewMode::Tree, 1);
    assert_eq!(nodes.len(), 1);
    assert!(!nodes[0].is_leaf());
    assert_eq!(nodes[0].source_uri(), Some("/repo/a"));
    assert_eq!(nodes[0].children()[0].source_uri(), Some("/repo/a/x.txt"));
}

#[test]
fn single_nested_file_is_inlined_at_threshold_two() {
    let nodes = build(&paths(&["a/x.txt"]), ViewMode::Tree, 2);
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].is_leaf());
    assert_eq!(nodes[0].source_uri(), Some("/repo/a/x.txt"));
}

#[test]
fn shared_prefix_extends_until_first_and_last_disagree() {
    let nodes = build(
        &paths(&["a/b/c/one.txt", "a/b/d/two.txt", "a/b/c/three.txt"]),
        ViewMode::Tree,
        1,
    );
    assert_eq!(nodes.len(), 1);
    match &nodes[0] {
        TreeNode::Folder(folder) => {
            assert_eq!(folder.path, "a/b");
            let names: Vec<_> = folder
                .children
                .iter()
                .map(|child| child.source_uri().unwrap())
                .collect();
            assert_eq!(names, vec!["/repo/a/b/c", "/repo/a/b/d"]);
        }
        other => panic!("expected folder, got {:?}", other.kind()),
    }
}

#[test]
fn compaction_never_swallows_a_file_name() {
    let nodes = build(&paths(&["a/b/x.txt", "a/b/c/y.txt"]), ViewMode::Tree, 1);
    match &nodes[0] {
        TreeNode::Folder(folder) => {
            assert_eq!(folder.path, "a/b");
            assert_eq!(folder.children.len(), 2);
            assert!(!folder.children[0].is_leaf());
            assert_eq!(folder.children[1].source_uri(), Some("/repo/a/b/x.txt"));
        }
        other => panic!("expected folder, got {:?}", other.kind()),
    }
}
