//! Vigil Core - domain types and change detection
//!
//! This crate provides the foundational primitives:
//! - Subscriber identities
//! - Page signals observed by a single inspection
//! - Notability evaluation and the admin detail report
//! - Watch configuration (selectors, redirect pattern, timeouts)
//! - The telemetry port for swallowed pipeline failures

pub mod config;
pub mod messages;
pub mod signal;
pub mod subscriber;
pub mod telemetry;

pub use config::*;
pub use signal::*;
pub use subscriber::*;
pub use telemetry::*;

/// Default wait for a client-side redirect, in milliseconds
pub const DEFAULT_REDIRECT_WAIT_MS: u64 = 7_000;

/// Default JPEG quality for the full-page screenshot
pub const DEFAULT_SCREENSHOT_QUALITY: u8 = 60;

/// Default directory for inspection artifacts and the registry file
pub const DEFAULT_FILES_DIR: &str = "files";

/// Fixed filename of the latest full-page screenshot
pub const SCREENSHOT_FILENAME: &str = "screenshot.jpg";

/// Fixed filename of the latest HTML snapshot
pub const SNAPSHOT_FILENAME: &str = "snapshot.html";

/// Default filename of the subscriber registry
pub const DEFAULT_REGISTRY_FILENAME: &str = "ids.json";
