//! Fire-and-forget trigger surface
//!
//! External callers (HTTP routes, bot commands) hand work to this layer and
//! get an acknowledgement back immediately; the pipeline runs on a background
//! task. Pipeline failures reach telemetry, never the trigger's caller.
//! Subscription changes are the exception: their outcome is part of the
//! caller-visible response, so they run inline.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

use vigil_core::SubscriberId;
use vigil_notify::{AddOutcome, RegistryError, RemoveOutcome};

use crate::Watcher;

/// Immediate acknowledgement of an accepted trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAck {
    Check,
    Details,
    StatusPing,
}

impl TriggerAck {
    /// Response body for the acknowledging transport
    pub fn message(&self) -> &'static str {
        match self {
            TriggerAck::Check => "checked",
            TriggerAck::Details => "details",
            TriggerAck::StatusPing => "ping",
        }
    }
}

/// Accepts triggers and runs the pipeline in the background
pub struct TriggerHandle {
    watcher: Arc<Watcher>,
    tasks: Mutex<JoinSet<()>>,
}

impl TriggerHandle {
    pub fn new(watcher: Arc<Watcher>) -> Self {
        Self {
            watcher,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Trigger a check of the target at `index`; notable signals notify
    /// subscribers. Acknowledges before the inspection runs.
    pub async fn request_check(&self, index: Option<usize>) -> TriggerAck {
        if let Some(url) = self.watcher.resolve_target(index) {
            let watcher = Arc::clone(&self.watcher);
            self.tasks
                .lock()
                .await
                .spawn(async move { watcher.check_and_notify(&url).await });
        } else {
            warn!("Check trigger ignored: no watch target configured");
        }
        TriggerAck::Check
    }

    /// Trigger a detail inspection of the target at `index`; the full report
    /// goes to the admin channel. Acknowledges before the inspection runs.
    pub async fn request_details(&self, index: Option<usize>) -> TriggerAck {
        if let Some(url) = self.watcher.resolve_target(index) {
            let watcher = Arc::clone(&self.watcher);
            self.tasks
                .lock()
                .await
                .spawn(async move { watcher.check_with_details(&url).await });
        } else {
            warn!("Details trigger ignored: no watch target configured");
        }
        TriggerAck::Details
    }

    /// Trigger a liveness ping to every subscriber.
    pub async fn request_status_ping(&self) -> TriggerAck {
        let watcher = Arc::clone(&self.watcher);
        self.tasks.lock().await.spawn(async move {
            watcher.ping_all_subscribers().await;
        });
        TriggerAck::StatusPing
    }

    /// Register a subscriber; the distinct outcome is the caller's response.
    pub async fn subscribe(&self, id: SubscriberId) -> Result<AddOutcome, RegistryError> {
        self.watcher.subscribe(id).await
    }

    /// Deregister a subscriber; the distinct outcome is the caller's response.
    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<RemoveOutcome, RegistryError> {
        self.watcher.unsubscribe(id).await
    }

    /// Forward the latest stored screenshot to a recipient. Runs inline:
    /// the reply is part of the conversation, not a background pipeline.
    pub async fn send_latest_screenshot(&self, recipient: SubscriberId) {
        self.watcher.send_latest_screenshot(recipient).await;
    }

    /// Wait for every accepted trigger to finish. Used by one-shot callers;
    /// long-running embedders never need this.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::tempdir;
    use uuid::Uuid;
    use vigil_core::{log_telemetry, PageSignal, SelectorProbe, UrlTable};
    use vigil_inspect::{ArtifactStore, InspectError, PageInspector};
    use vigil_notify::{Messenger, NotificationDispatcher, SendError, SubscriberRegistry};

    /// Inspector that takes a moment, so acknowledgement visibly precedes
    /// pipeline completion.
    struct SlowInspector;

    #[async_trait]
    impl PageInspector for SlowInspector {
        async fn inspect(&self, _url: &str) -> Result<PageSignal, InspectError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(PageSignal {
                inspection_id: Uuid::new_v4(),
                probes: vec![SelectorProbe {
                    name: "cta".to_string(),
                    present: true,
                }],
                redirected: false,
                redirected_url: None,
                observed_at: Utc::now(),
                snapshot_digest: None,
            })
        }
    }

    #[derive(Default)]
    struct FakeMessenger {
        sent: StdMutex<Vec<(SubscriberId, String)>>,
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        async fn send_text(&self, recipient: SubscriberId, text: &str) -> Result<(), SendError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient, text.to_string()));
            Ok(())
        }

        async fn send_photo(&self, recipient: SubscriberId, _photo: &Path) -> Result<(), SendError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient, "<photo>".to_string()));
            Ok(())
        }
    }

    async fn handle() -> (TriggerHandle, Arc<FakeMessenger>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let messenger = Arc::new(FakeMessenger::default());
        let telemetry = log_telemetry();

        let registry = Arc::new(SubscriberRegistry::new(
            dir.path().join("ids.json"),
            telemetry.clone(),
        ));
        registry.add(SubscriberId(1)).await.unwrap();

        let watcher = Arc::new(Watcher::new(
            Arc::new(SlowInspector),
            registry,
            NotificationDispatcher::new(messenger.clone(), SubscriberId(1000), telemetry.clone()),
            ArtifactStore::new(dir.path()),
            UrlTable::new(vec!["https://shop.example/queue".to_string()]),
            telemetry,
        ));

        (TriggerHandle::new(watcher), messenger, dir)
    }

    #[tokio::test]
    async fn test_check_acknowledges_before_pipeline_completes() {
        let (handle, messenger, _dir) = handle().await;

        let ack = handle.request_check(None).await;
        assert_eq!(ack, TriggerAck::Check);
        assert_eq!(ack.message(), "checked");

        // Acknowledged, but the slow inspection has not delivered yet
        assert!(messenger.sent.lock().unwrap().is_empty());

        handle.drain().await;
        assert_eq!(messenger.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_details_trigger_reports_to_admin() {
        let (handle, messenger, _dir) = handle().await;

        handle.request_details(None).await;
        handle.drain().await;

        let sent = messenger.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SubscriberId(1000));
    }

    #[tokio::test]
    async fn test_status_ping_trigger() {
        let (handle, messenger, _dir) = handle().await;

        let ack = handle.request_status_ping().await;
        assert_eq!(ack, TriggerAck::StatusPing);

        handle.drain().await;
        let sent = messenger.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SubscriberId(1));
    }

    #[tokio::test]
    async fn test_subscription_outcome_is_visible_to_caller() {
        let (handle, _messenger, _dir) = handle().await;

        assert_eq!(
            handle.subscribe(SubscriberId(2)).await.unwrap(),
            AddOutcome::Added
        );
        assert_eq!(
            handle.subscribe(SubscriberId(2)).await.unwrap(),
            AddOutcome::AlreadyPresent
        );
        assert_eq!(
            handle.unsubscribe(SubscriberId(2)).await.unwrap(),
            RemoveOutcome::Removed
        );
        assert_eq!(
            handle.unsubscribe(SubscriberId(2)).await.unwrap(),
            RemoveOutcome::NotPresent
        );
    }
}
