use crate::app::App;
use crate::command::Command;
use crate::diff::ResourceOpener;
use crate::labels::LabelProvider;
use crate::navigator::CursorMove;
use crate::provider::Provider;

/// Result of executing a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status_message: Option<String>,
    pub should_quit: bool,
}

/// Executes commands against an app
pub struct Executor;

impl Executor {
    /// Execute a command (sequences run in order) and update the app's status line
    pub async fn execute<P: Provider, O: ResourceOpener>(
        app: &mut App<P, O>,
        command: Command,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        for command in Self::flatten(command) {
            let message = Self::execute_one(app, &command).await;
            log::debug!("Executed {}: {:?}", command, message);
            if let Some(message) = message {
                result.status_message = Some(message);
            }
            if app.should_quit {
                result.should_quit = true;
                break;
            }
        }
        if let Some(message) = &result.status_message {
            app.status_message = message.clone();
        }
        result
    }

    fn flatten(command: Command) -> Vec<Command> {
        match command {
            Command::Sequence(commands) => commands.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }

    async fn execute_one<P: Provider, O: ResourceOpener>(
        app: &mut App<P, O>,
        command: &Command,
    ) -> Option<String> {
        let view = &mut app.view;
        let outcome = match command {
            Command::Quit => {
                app.should_quit = true;
                return Some("Goodbye!".to_string());
            }
            Command::NavigateUp => view.handle_up(),
            Command::NavigateDown => view.handle_down(),
            Command::Home => view.handle_home(),
            Command::End => view.handle_end(),
            Command::NavigateLeft => view.handle_left().await,
            Command::NavigateRight => view.handle_right().await,
            Command::Enter => view.handle_enter().await,
            Command::NextChange => view.next_change().await,
            Command::PreviousChange => view.previous_change().await,
            Command::ToggleView => {
                let mode = view.toggle_view_mode();
                return Some(format!("Switched to {} view", mode.as_str()));
            }
            Command::Refresh => {
                return Some(match view.refresh() {
                    Ok(()) => "Refreshed".to_string(),
                    Err(e) => {
                        log::warn!("Refresh failed: {}", e);
                        format!("Refresh failed: {}", e)
                    }
                });
            }
            Command::Sequence(_) => return None,
        };
        Self::describe(app, command, outcome)
    }

    fn describe<P: Provider, O: ResourceOpener>(
        app: &App<P, O>,
        command: &Command,
        outcome: CursorMove,
    ) -> Option<String> {
        let tree = app.view.controller().tree();
        match outcome {
            CursorMove::Chunk => {
                let editor = app.view.cursor().editor()?;
                Some(format!("Change in {}", app.labels.get_long_name(&editor.source_uri)))
            }
            CursorMove::File(id) => {
                let uri = tree.find_node(&id)?.source_uri()?;
                Some(format!("Opened {}", app.labels.get_long_name(uri)))
            }
            CursorMove::Tree => {
                let node = tree.selected_node()?;
                Some(match node.source_uri() {
                    Some(uri) => format!("Selected {}", app.labels.get_long_name(uri)),
                    None => format!("Selected {}", node.id()),
                })
            }
            CursorMove::Unchanged => match command {
                Command::NextChange | Command::NavigateRight => {
                    Some("No further changes".to_string())
                }
                Command::PreviousChange | Command::NavigateLeft => {
                    Some("No earlier changes".to_string())
                }
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diff::{DiffSides, MemoryOpener};
    use crate::model::{ChangeStatus, Group, NodeId, Resource, ViewMode};
    use crate::provider::StaticProvider;
    use std::collections::HashMap;

    fn create_test_app() -> App<StaticProvider, MemoryOpener> {
        let group = Group::new("changes", "Changes")
            .with_resource(Resource::new("/repo/src/a.rs", ChangeStatus::Modified))
            .with_resource(Resource::new("/repo/src/b.rs", ChangeStatus::Modified));
        let mut sides = HashMap::new();
        for uri in ["/repo/src/a.rs", "/repo/src/b.rs"] {
            sides.insert(
                uri.to_string(),
                DiffSides {
                    old: "one\n".to_string(),
                    new: "two\n".to_string(),
                },
            );
        }
        App::new(
            Config::default(),
            StaticProvider::new("repo", "/repo", vec![group]),
            MemoryOpener::new(sides),
        )
    }

    #[tokio::test]
    async fn test_next_change_walks_files_and_chunks() {
        let mut app = create_test_app();
        let result = Executor::execute(&mut app, Command::NextChange).await;
        assert_eq!(result.status_message.as_deref(), Some("Opened src/a.rs"));
        let result = Executor::execute(&mut app, Command::NextChange).await;
        assert_eq!(result.status_message.as_deref(), Some("Change in src/a.rs"));
        let result = Executor::execute(&mut app, Command::NextChange).await;
        assert_eq!(result.status_message.as_deref(), Some("Opened src/b.rs"));
        Executor::execute(&mut app, Command::NextChange).await;
        let result = Executor::execute(&mut app, Command::NextChange).await;
        assert_eq!(result.status_message.as_deref(), Some("No further changes"));
        assert_eq!(app.status_message, "No further changes");
    }

    #[tokio::test]
    async fn test_sequence_and_quit() {
        let mut app = create_test_app();
        let command = Command::from_string("sequence:[toggle_view,home,down,quit,down]").unwrap();
        let result = Executor::execute(&mut app, command).await;
        assert!(result.should_quit);
        assert_eq!(app.view.view_mode(), ViewMode::Tree);
        assert_eq!(
            app.view.controller().tree().selection(),
            Some(&NodeId::folder("changes", "/repo/src"))
        );
    }

    #[tokio::test]
    async fn test_refresh_reports_status() {
        let mut app = create_test_app();
        let result = Executor::execute(&mut app, Command::Refresh).await;
        assert_eq!(result.status_message.as_deref(), Some("Refreshed"));
    }
}
