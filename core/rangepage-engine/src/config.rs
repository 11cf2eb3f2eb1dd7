use serde::{Deserialize, Serialize};

/// Configuration for the listing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when the request gives none or an out-of-range one.
    pub default_page_size: usize,
    /// Store fetches a bounded request may issue before it gives up filling the page.
    pub max_bounded_fetches: usize,
    /// Multiplier on the page-size hint when post-fetch filters run in bounded mode.
    pub overfetch_factor: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_bounded_fetches: 10,
            overfetch_factor: 2,
        }
    }
}
