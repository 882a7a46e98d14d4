//! Vigil Runtime - orchestration
//!
//! Composes inspection, change detection, the subscriber registry and
//! notification dispatch into the per-trigger pipeline, and exposes the
//! fire-and-forget trigger surface.

pub mod triggers;
pub mod watcher;

pub use triggers::*;
pub use watcher::*;
