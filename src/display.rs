use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::DisplayConfig;

/// The published value pair for one poll cycle: the visitor count line (raw
/// body text or an error string) and the formatted waiting-time prediction.
/// Overwritten wholesale every cycle, never accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub visitors_text: String,
    pub waiting_text: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    /// State shown before the first cycle completes. The prediction default
    /// only ever changes if a model is loaded.
    pub fn initial() -> Self {
        Self {
            visitors_text: "Loading...".to_string(),
            waiting_text: None,
            updated_at: Utc::now(),
        }
    }
}

/// Single-writer published state with atomic replace-on-write. The poller
/// stores a fresh snapshot each cycle; any number of observers may load it.
pub struct PublishedState {
    current: ArcSwap<Snapshot>,
}

impl PublishedState {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::initial()),
        }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }
}

impl Default for PublishedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal observer interface; the poller pushes every published snapshot
/// through this.
pub trait DisplaySurface: Send + Sync {
    fn render(&self, snapshot: &Snapshot);
}

/// Console rendition of the original screen: fixed title, visitor line with
/// a capacity suffix, waiting-time line in minutes.
pub struct ConsoleScreen {
    title: String,
    capacity: u32,
}

impl ConsoleScreen {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            title: config.title.clone(),
            capacity: config.capacity,
        }
    }

    fn lines(&self, snapshot: &Snapshot) -> (String, String) {
        (
            format!(
                "Number of visitors: {} / {}",
                snapshot.visitors_text, self.capacity
            ),
            format!(
                "Estimated waiting time: {} mins",
                snapshot.waiting_text.as_deref().unwrap_or("0")
            ),
        )
    }
}

impl DisplaySurface for ConsoleScreen {
    fn render(&self, snapshot: &Snapshot) {
        let (visitors, waiting) = self.lines(snapshot);
        println!();
        println!("{}", self.title);
        println!("{visitors}");
        println!("{waiting}");
    }
}
