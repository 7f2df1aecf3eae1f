use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

pub const INITIAL_LOAD: &str = "initial-load";
pub const SYNC: &str = "sync";

/// Named in-flight counters. Overlapping operations under different names never
/// interfere, and nested starts of the same name are counted.
#[derive(Debug, Clone)]
pub struct LoadingTracker {
    active: Arc<watch::Sender<HashMap<String, usize>>>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(HashMap::new());
        Self {
            active: Arc::new(tx),
        }
    }

    pub fn start_loading(&self, name: &str) {
        self.active.send_modify(|active| {
            *active.entry(name.to_string()).or_insert(0) += 1;
        });
    }

    /// Extra stops for a name that is not loading are ignored.
    pub fn stop_loading(&self, name: &str) {
        self.active.send_if_modified(|active| match active.get_mut(name) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                active.remove(name);
                true
            }
            None => false,
        });
    }

    pub fn is_loading(&self, name: &str) -> bool {
        self.active.borrow().contains_key(name)
    }

    /// Names currently in flight, sorted.
    pub fn active(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn subscribe(&self) -> watch::Receiver<HashMap<String, usize>> {
        self.active.subscribe()
    }

    /// Starts `name` and stops it when the guard drops, including on early return.
    pub fn begin(&self, name: &str) -> LoadingGuard {
        self.start_loading(name);
        LoadingGuard {
            tracker: self.clone(),
            name: name.to_string(),
        }
    }
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use = "loading stops as soon as the guard is dropped"]
pub struct LoadingGuard {
    tracker: LoadingTracker,
    name: String,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.stop_loading(&self.name);
    }
}
