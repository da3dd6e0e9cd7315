use serde::{Deserialize, Serialize};

/// Per-operation flag tracking in-flight asynchronous work, kept under the
/// `loading` map of a module's state slice.
///
/// Transitions: `Stop -> Loading` when an effect bound to the key starts,
/// `Loading -> Stop` on success, `Loading -> Failed` on failure. Overlapping
/// effects under the same key are last-writer-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Stop,
    Loading,
    Failed,
}

impl LoadingState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading)
    }
}
