// Library module containing testable functions used by main.rs

use crate::cli::TreeOptions;
use crate::command::Command;
use crate::config::Config;
use crate::controller::TreeController;
use crate::error::Result;
use crate::executor::Executor;
use crate::git::GitProvider;
use crate::model::{relative_path, TreeNode, ViewMode};
use crate::screenshot::render_snapshot;
use crate::snapshot::SnapshotConfig;
use crate::tree::ChangeTree;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Load the configuration file (if any) and apply command-line overrides
pub fn load_config(options: &TreeOptions) -> Result<Config> {
    let mut config = Config::load(options.settings.as_deref())?;
    apply_overrides(&mut config, options);
    Ok(config)
}

pub fn apply_overrides(config: &mut Config, options: &TreeOptions) {
    if let Some(threshold) = options.threshold {
        config.tree.nesting_threshold = threshold;
    }
    if options.tree {
        config.tree.view_mode = ViewMode::Tree;
    } else if options.flat {
        config.tree.view_mode = ViewMode::Flat;
    }
}

/// Indented plain-text rendering of every node, regardless of expansion
pub fn render_status_tree(tree: &ChangeTree) -> String {
    let mut out = String::new();
    for group in &tree.root().groups {
        render_node(group, 0, tree.root_uri(), &mut out);
    }
    out
}

fn render_node(node: &TreeNode, depth: usize, parent_uri: &str, out: &mut String) {
    let indent = "  ".repeat(depth);
    let child_parent = match node {
        TreeNode::Group(group) => {
            let _ = writeln!(out, "{}{}", indent, group.label);
            parent_uri
        }
        TreeNode::Folder(folder) => {
            let _ = writeln!(out, "{}{}/", indent, folder.path);
            folder.source_uri.as_str()
        }
        TreeNode::Leaf(leaf) => {
            let _ = writeln!(
                out,
                "{}{} {}",
                indent,
                leaf.status.letter(),
                relative_path(parent_uri, &leaf.source_uri)
            );
            parent_uri
        }
    };
    for child in node.children() {
        render_node(child, depth + 1, child_parent, out);
    }
}

/// Print the change tree of the repository containing `path`
pub fn print_status(path: &Path, config: &Config) -> Result<()> {
    let provider = GitProvider::discover(path)?;
    let mut controller = TreeController::new(config.tree.clone());
    controller.select_repository(Some(provider));
    let tree = controller.tree();
    print!("{}", render_status_tree(tree));
    let stats = tree.stats();
    log::info!(
        "status: {} groups, {} folders, {} files",
        stats.groups,
        stats.folders,
        stats.files
    );
    Ok(())
}

/// Apply a textual command to a snapshot and emit the resulting snapshot
pub async fn execute_command(
    config_path: &Path,
    command_str: &str,
    output_path: Option<&Path>,
    generate_screenshot: bool,
    width: u16,
    height: u16,
) -> Result<()> {
    let snapshot = SnapshotConfig::load_from_file(config_path)?;
    let command = Command::from_string(command_str)?;

    let mut app = snapshot.into_app().await?;
    let result = Executor::execute(&mut app, command).await;

    let resulting = SnapshotConfig::from_app(&app);
    let result_json = serde_json::to_string_pretty(&resulting)?;

    match output_path {
        Some(path) => {
            fs::write(path, &result_json)?;
            println!("Result saved to: {}", path.display());
        }
        None => {
            println!("{}", result_json);
        }
    }

    if let Some(status) = result.status_message {
        eprintln!("Status: {}", status);
    }
    if result.should_quit {
        eprintln!("Command resulted in quit");
    }

    if generate_screenshot {
        let screenshot = render_snapshot(resulting, width, height).await?;
        eprint!("{}", screenshot);
    }

    Ok(())
}
