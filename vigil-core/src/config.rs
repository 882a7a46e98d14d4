//! Watch configuration

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_REDIRECT_WAIT_MS, DEFAULT_SCREENSHOT_QUALITY};

/// A named CSS selector to probe for presence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Short name used in signals and reports
    pub name: String,
    /// CSS selector tested against the rendered page
    pub css: String,
}

impl SelectorSpec {
    pub fn new(name: &str, css: &str) -> Self {
        Self {
            name: name.to_string(),
            css: css.to_string(),
        }
    }
}

/// What to look for during one inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Selectors probed for presence, in report order
    pub selectors: Vec<SelectorSpec>,
    /// Regex a post-redirect URL must match to count as redirected.
    /// When absent, any final URL differing from the request counts.
    pub redirect_pattern: Option<String>,
    /// How long the renderer waits for a client-side redirect
    pub redirect_wait_ms: u64,
    /// JPEG quality of the stored screenshot (1-100)
    pub screenshot_quality: u8,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            selectors: Vec::new(),
            redirect_pattern: None,
            redirect_wait_ms: DEFAULT_REDIRECT_WAIT_MS,
            screenshot_quality: DEFAULT_SCREENSHOT_QUALITY,
        }
    }
}

/// Indexable table of watch targets.
///
/// Triggers may carry an index; out-of-range or missing indexes fall back to
/// the first entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlTable(Vec<String>);

impl UrlTable {
    pub fn new(urls: Vec<String>) -> Self {
        Self(urls)
    }

    /// Resolve an optional index to a target URL.
    pub fn resolve(&self, index: Option<usize>) -> Option<&str> {
        index
            .and_then(|i| self.0.get(i))
            .or_else(|| self.0.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
