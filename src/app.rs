use crate::config::Config;
use crate::controller::TreeController;
use crate::diff::ResourceOpener;
use crate::labels::PathLabels;
use crate::provider::Provider;
use crate::view::ScmTreeView;

/// Interactive session state: the tree view plus what the frame shows around it
pub struct App<P: Provider, O: ResourceOpener> {
    pub view: ScmTreeView<P, O>,
    pub config: Config,
    pub labels: PathLabels,
    pub status_message: String,
    pub should_quit: bool,
}

impl<P: Provider, O: ResourceOpener> App<P, O> {
    /// Bind `provider` under a fresh controller configured from `config`
    pub fn new(config: Config, provider: P, opener: O) -> Self {
        let labels = PathLabels::new(provider.root_uri());
        let mut controller = TreeController::new(config.tree.clone());
        controller.select_repository(Some(provider));
        Self {
            view: ScmTreeView::new(controller, opener),
            config,
            labels,
            status_message: "Ready".to_string(),
            should_quit: false,
        }
    }

    /// Summary line for the status bar
    pub fn stats_line(&self) -> String {
        let stats = self.view.controller().tree().stats();
        format!(
            "{} | {} groups, {} folders, {} files",
            self.view.view_mode().as_str(),
            stats.groups,
            stats.folders,
            stats.files
        )
    }
}
