//! Loader configuration.

use serde::{Deserialize, Serialize};

/// Default number of images fetched at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Runtime-tunable queue configuration, read by dispatch on every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Upper bound on in-flight fetches. Always at least 1.
    pub max_concurrent: usize,
    /// Load one image at a time, ignoring `max_concurrent`.
    pub sequential: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            sequential: false,
        }
    }
}

impl LoaderConfig {
    /// Clamp `max_concurrent` into its valid range.
    pub(crate) fn sanitize(mut self) -> Self {
        self.max_concurrent = self.max_concurrent.max(1);
        self
    }
}
