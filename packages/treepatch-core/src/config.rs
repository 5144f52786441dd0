#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default bound on element nesting for a single pass.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Tunables for a [`Patcher`](crate::Patcher).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PatchConfig {
    /// Deepest element nesting materialization or patching will descend into before failing
    /// with [`Error::DepthLimitExceeded`](crate::Error::DepthLimitExceeded).
    pub max_depth: usize,
}

impl PatchConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
