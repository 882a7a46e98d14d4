//! The watch orchestrator
//!
//! One linear pipeline per trigger: inspect the page, evaluate notability,
//! then notify subscribers and/or the admin channel. No state survives a
//! trigger beyond the registry and the artifact store.

use std::sync::Arc;
use tracing::{info, warn};

use vigil_core::{messages, NotabilityReport, PageSignal, SharedTelemetry, SubscriberId, UrlTable};
use vigil_inspect::{ArtifactStore, SharedInspector};
use vigil_notify::{
    AddOutcome, NotificationDispatcher, RegistryError, RemoveOutcome, SubscriberRegistry,
};

/// Composes the per-trigger pipeline
pub struct Watcher {
    inspector: SharedInspector,
    registry: Arc<SubscriberRegistry>,
    dispatcher: NotificationDispatcher,
    artifacts: ArtifactStore,
    targets: UrlTable,
    telemetry: SharedTelemetry,
}

impl Watcher {
    pub fn new(
        inspector: SharedInspector,
        registry: Arc<SubscriberRegistry>,
        dispatcher: NotificationDispatcher,
        artifacts: ArtifactStore,
        targets: UrlTable,
        telemetry: SharedTelemetry,
    ) -> Self {
        Self {
            inspector,
            registry,
            dispatcher,
            artifacts,
            targets,
            telemetry,
        }
    }

    /// Resolve an optional target index against the configured URL table.
    pub fn resolve_target(&self, index: Option<usize>) -> Option<String> {
        self.targets.resolve(index).map(str::to_string)
    }

    /// Inspect `url`; when the signal is notable, notify every subscriber.
    ///
    /// Inspection failures go to telemetry and suppress notification for
    /// this run. The admin channel is never involved here.
    pub async fn check_and_notify(&self, url: &str) {
        let signal = match self.inspect(url).await {
            Some(signal) => signal,
            None => return,
        };

        let report = NotabilityReport::evaluate(&signal);
        if !report.notable {
            info!("No change at {}", url);
            return;
        }

        let recipients = self.registry.list();
        let text = format!("{}\n\n{}", messages::NOTIFICATION, url);
        let delivered = self.dispatcher.broadcast(&recipients, &text).await;
        info!(
            "Change at {}: notified {}/{} subscribers",
            url,
            delivered,
            recipients.len()
        );
    }

    /// Inspect `url` and always send the full report to the admin channel.
    ///
    /// The notable marker and the URL are appended when the signal fires.
    /// Subscribers are never notified from this path.
    pub async fn check_with_details(&self, url: &str) {
        match self.inspector.inspect(url).await {
            Ok(signal) => {
                let report = NotabilityReport::evaluate(&signal);
                let mut text = report.detail;
                if report.notable {
                    text.push_str("\n\n");
                    text.push_str(messages::NOTIFICATION);
                }
                text.push_str("\n\n");
                text.push_str(url);
                self.dispatcher.send_admin_report(&text).await;
            }
            Err(e) => {
                self.telemetry
                    .capture_error("inspect", &format!("{}: {}", url, e));
                self.dispatcher
                    .send_admin_report(&format!("Inspection of {} failed: {}", url, e))
                    .await;
            }
        }
    }

    /// Send a liveness message to every current subscriber.
    pub async fn ping_all_subscribers(&self) -> usize {
        let recipients = self.registry.list();
        self.dispatcher
            .broadcast(&recipients, messages::STATUS_PING)
            .await
    }

    /// Register a subscriber. The outcome is surfaced to the caller; a state
    /// change is confirmed to the subscriber and audited on the admin channel.
    pub async fn subscribe(&self, id: SubscriberId) -> Result<AddOutcome, RegistryError> {
        let outcome = self.registry.add(id).await?;

        match outcome {
            AddOutcome::Added => {
                self.confirm(id, messages::SUBSCRIBED).await;
                self.dispatcher
                    .send_admin_report(&format!("{}: {}", messages::SUBSCRIBER_ADDED, id))
                    .await;
            }
            AddOutcome::AlreadyPresent => {
                self.confirm(id, messages::ALREADY_SUBSCRIBED).await;
            }
        }

        Ok(outcome)
    }

    /// Deregister a subscriber; mirrors `subscribe`.
    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<RemoveOutcome, RegistryError> {
        let outcome = self.registry.remove(id).await?;

        match outcome {
            RemoveOutcome::Removed => {
                self.confirm(id, messages::UNSUBSCRIBED).await;
                self.dispatcher
                    .send_admin_report(&format!("{}: {}", messages::SUBSCRIBER_REMOVED, id))
                    .await;
            }
            RemoveOutcome::NotPresent => {
                self.confirm(id, messages::ALREADY_UNSUBSCRIBED).await;
            }
        }

        Ok(outcome)
    }

    /// Forward the latest stored screenshot to a recipient.
    pub async fn send_latest_screenshot(&self, recipient: SubscriberId) {
        let path = self.artifacts.screenshot_path();
        if let Err(e) = self.dispatcher.send_photo(recipient, &path).await {
            self.telemetry
                .capture_error("screenshot", &format!("send to {} failed: {}", recipient, e));
            self.confirm(recipient, &format!("Could not send screenshot: {}", e))
                .await;
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.list().len()
    }

    async fn inspect(&self, url: &str) -> Option<PageSignal> {
        match self.inspector.inspect(url).await {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!("Inspection of {} failed: {}", url, e);
                self.telemetry
                    .capture_error("inspect", &format!("{}: {}", url, e));
                None
            }
        }
    }

    async fn confirm(&self, recipient: SubscriberId, text: &str) {
        if let Err(e) = self.dispatcher.send_to(recipient, text).await {
            self.telemetry
                .capture_error("dispatch", &format!("reply to {} failed: {}", recipient, e));
        }
    }
}
