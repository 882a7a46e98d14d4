//! Page signals and notability evaluation
//!
//! A `PageSignal` is the immutable result of one inspection: which of the
//! configured selectors matched, and whether the page redirected to a URL
//! matching the configured pattern. `NotabilityReport` is the derived
//! decision plus a stable textual rendering for the admin channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::messages;

/// Outcome of probing one configured selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorProbe {
    /// Name of the selector from the watch configuration
    pub name: String,
    /// Whether at least one element matched
    pub present: bool,
}

/// The observed facts of a single page inspection.
///
/// Produced fresh per inspection, never mutated afterwards. Probe order
/// follows the configured selector order so renderings are diffable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSignal {
    /// Correlation id of the inspection that produced this signal
    pub inspection_id: Uuid,
    /// One probe per configured selector, in configuration order
    pub probes: Vec<SelectorProbe>,
    /// Whether navigation ended on a URL matching the redirect pattern
    pub redirected: bool,
    /// Final URL when redirected
    pub redirected_url: Option<String>,
    /// When the inspection observed the page
    pub observed_at: DateTime<Utc>,
    /// Hex sha256 of the persisted HTML snapshot, when the write succeeded
    pub snapshot_digest: Option<String>,
}

impl PageSignal {
    /// A signal is notable when any selector matched or the page redirected.
    pub fn is_notable(&self) -> bool {
        self.redirected || self.probes.iter().any(|p| p.present)
    }
}

/// Derived notability decision with the full detail rendering
#[derive(Debug, Clone)]
pub struct NotabilityReport {
    pub notable: bool,
    pub detail: String,
}

impl NotabilityReport {
    /// Evaluate a signal into a report.
    ///
    /// Field order is fixed: selectors in configuration order, then the
    /// redirect flag, the redirect URL (explicit placeholder when absent),
    /// the observation time and the snapshot digest.
    pub fn evaluate(signal: &PageSignal) -> Self {
        let mut lines = Vec::with_capacity(signal.probes.len() + 4);

        for probe in &signal.probes {
            lines.push(format!("element {}: {}", probe.name, probe.present));
        }
        lines.push(format!("redirected: {}", signal.redirected));
        lines.push(format!(
            "redirected url: {}",
            signal.redirected_url.as_deref().unwrap_or(messages::NONE)
        ));
        lines.push(format!(
            "observed at: {}",
            signal.observed_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));
        lines.push(format!(
            "snapshot sha256: {}",
            signal.snapshot_digest.as_deref().unwrap_or(messages::NONE)
        ));

        Self {
            notable: signal.is_notable(),
            detail: lines.join("\n"),
        }
    }
}
