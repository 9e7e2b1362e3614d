use crate::app::App;
use crate::command::Command;
use crate::config::Config;
use crate::controller::PersistedState;
use crate::diff::{DiffSides, MemoryOpener};
use crate::error::Result;
use crate::executor::Executor;
use crate::model::Group;
use crate::provider::{Provider, StaticProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A self-contained session: provider snapshot, file contents, view state
/// and commands to replay. Used for screenshots, scripted runs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub root_uri: String,
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Before/after text keyed by source uri
    #[serde(default)]
    pub diffs: HashMap<String, DiffSides>,
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub state: Option<PersistedState>,
    /// Commands replayed after loading, in order
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl SnapshotConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SnapshotConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Build the app, restore its state and replay the recorded commands
    pub async fn into_app(self) -> Result<App<StaticProvider, MemoryOpener>> {
        let commands = self
            .commands
            .iter()
            .map(|command| Command::from_string(command))
            .collect::<Result<Vec<_>>>()?;

        let provider = StaticProvider::new("snapshot", self.root_uri, self.groups);
        let mut app = App::new(self.config, provider, MemoryOpener::new(self.diffs));
        if let Some(state) = self.state {
            app.view.restore_state(state);
        }
        for command in commands {
            Executor::execute(&mut app, command).await;
        }
        if let Some(message) = self.status_message {
            app.status_message = message;
        }
        Ok(app)
    }

    /// Capture an app built from a snapshot; recorded commands are already applied
    pub fn from_app(app: &App<StaticProvider, MemoryOpener>) -> Self {
        let controller = app.view.controller();
        let (root_uri, groups) = controller
            .provider()
            .map(|provider| (provider.root_uri().to_string(), provider.groups().to_vec()))
            .unwrap_or_default();
        Self {
            root_uri,
            groups,
            diffs: app.view.cursor().opener().sides().clone(),
            config: app.config.clone(),
            state: Some(app.view.store_state()),
            commands: Vec::new(),
            status_message: Some(app.status_message.clone()),
        }
    }
}
