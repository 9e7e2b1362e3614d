use crate::error::Result;
use crate::model::Group;
use tokio::sync::watch;

/// Source of groups and resources for one repository
pub trait Provider {
    /// Stable identifier, used in log output
    fn id(&self) -> &str;
    fn root_uri(&self) -> &str;
    /// Current snapshot, in display order
    fn groups(&self) -> &[Group];
    /// Subscribe to change notifications; dropping the subscription disposes it
    fn subscribe(&self) -> Subscription;
    /// Re-read the underlying source; true when the snapshot changed
    fn refresh(&mut self) -> Result<bool> {
        Ok(false)
    }
}

/// Notifier shared by providers: every mutation bumps a version
#[derive(Debug)]
pub struct ChangeNotifier {
    sender: watch::Sender<u64>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    pub fn notify(&self) {
        self.sender.send_modify(|version| *version += 1);
    }

    pub fn version(&self) -> u64 {
        *self.sender.borrow()
    }

    pub fn subscribe(&self, generation: u64) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            generation,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live change subscription
#[derive(Debug)]
pub struct Subscription {
    receiver: watch::Receiver<u64>,
    generation: u64,
}

impl Subscription {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Whether a notification arrived since the last `mark_seen`
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    pub fn mark_seen(&mut self) {
        self.receiver.borrow_and_update();
    }

    /// Wait for the next notification; `false` once the provider is gone
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

/// In-memory provider fed by the host or by snapshot files
#[derive(Debug)]
pub struct StaticProvider {
    id: String,
    root_uri: String,
    groups: Vec<Group>,
    notifier: ChangeNotifier,
}

impl StaticProvider {
    pub fn new(id: impl Into<String>, root_uri: impl Into<String>, groups: Vec<Group>) -> Self {
        Self {
            id: id.into(),
            root_uri: root_uri.into(),
            groups,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Replace the snapshot and notify subscribers
    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.groups = groups;
        self.notifier.notify();
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

impl Provider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
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
}
