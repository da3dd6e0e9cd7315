//! Router state and the navigation seam.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{Action, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    pub search: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            pathname: "/".into(),
            search: String::new(),
        }
    }
}

impl Location {
    /// Split a `/path?search` string into its parts.
    pub fn from_path(path: &str) -> Self {
        match path.split_once('?') {
            Some((pathname, search)) => Self {
                pathname: pathname.to_string(),
                search: search.to_string(),
            },
            None => Self {
                pathname: path.to_string(),
                search: String::new(),
            },
        }
    }
}

/// Resolver-attached route metadata: which feature modules the current
/// location resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteData {
    pub matched: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterState {
    pub location: Location,
    pub data: RouteData,
}

/// Navigation collaborator. `replace` performs a history-based in-app
/// replace (and feeds the resulting location change back into the store);
/// `hard_redirect` leaves the application with a full page load.
pub trait Navigator: Send + Sync {
    fn replace(&self, path: &str);
    fn hard_redirect(&self, url: &str);
}

pub struct MissingNavigator;

impl Navigator for MissingNavigator {
    fn replace(&self, path: &str) {
        error!(path, "navigator unavailable, in-app replace dropped");
    }

    fn hard_redirect(&self, url: &str) {
        error!(url, "navigator unavailable, hard redirect dropped");
    }
}

/// In-process history. Location changes go through the dispatch stream like
/// every other state transition; hard redirects are recorded for the shell
/// (or a test) to act on.
pub struct MemoryHistory {
    store: Store,
    hard_redirects: Mutex<Vec<String>>,
}

impl MemoryHistory {
    pub fn new(store: Store) -> Arc<Self> {
        Arc::new(Self {
            store,
            hard_redirects: Mutex::new(Vec::new()),
        })
    }

    /// Push a new location into the store (initial load and subsequent
    /// client-side transitions).
    pub fn navigate(&self, path: &str) {
        let location = Location::from_path(path);
        self.store.dispatch(Action::location_change(&location));
    }

    pub fn hard_redirects(&self) -> Vec<String> {
        self.hard_redirects.lock().expect("history lock").clone()
    }
}

impl Navigator for MemoryHistory {
    fn replace(&self, path: &str) {
        debug!(path, "history replace");
        self.navigate(path);
    }

    fn hard_redirect(&self, url: &str) {
        info!(url, "hard redirect, leaving application");
        self.hard_redirects
            .lock()
            .expect("history lock")
            .push(url.to_string());
    }
}
