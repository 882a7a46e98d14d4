//! Notification dispatch
//!
//! Fans a message out to a set of recipients. Deliveries are independent: a
//! failed recipient is reported to telemetry and the rest still receive the
//! message. The admin channel is a fixed recipient that takes full reports.

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

use vigil_core::{SharedTelemetry, SubscriberId};

use crate::{SendError, SharedMessenger};

/// Default concurrent deliveries per broadcast
const DEFAULT_FANOUT: usize = 8;

/// Fans messages out to recipients and the admin channel
pub struct NotificationDispatcher {
    messenger: SharedMessenger,
    admin: SubscriberId,
    telemetry: SharedTelemetry,
    max_concurrent: usize,
}

impl NotificationDispatcher {
    pub fn new(messenger: SharedMessenger, admin: SubscriberId, telemetry: SharedTelemetry) -> Self {
        Self {
            messenger,
            admin,
            telemetry,
            max_concurrent: DEFAULT_FANOUT,
        }
    }

    pub fn with_fanout(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// The fixed administrative recipient
    pub fn admin(&self) -> SubscriberId {
        self.admin
    }

    /// Deliver `text` to every recipient, isolating failures per recipient.
    ///
    /// Returns the number of successful deliveries.
    pub async fn broadcast(&self, recipients: &BTreeSet<SubscriberId>, text: &str) -> usize {
        if recipients.is_empty() {
            debug!("Broadcast skipped: no recipients");
            return 0;
        }

        let delivered = stream::iter(recipients.iter().copied())
            .map(|recipient| {
                let messenger = self.messenger.clone();
                let text = text.to_string();
                async move {
                    match messenger.send_text(recipient, &text).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!("Delivery to {} failed: {}", recipient, e);
                            self.telemetry
                                .capture_error("dispatch", &format!("send to {} failed: {}", recipient, e));
                            false
                        }
                    }
                }
            })
            .buffer_unordered(self.max_concurrent)
            .filter(|ok| futures::future::ready(*ok))
            .count()
            .await;

        debug!("Broadcast delivered to {}/{}", delivered, recipients.len());
        delivered
    }

    /// Deliver a text message to a single recipient.
    pub async fn send_to(&self, recipient: SubscriberId, text: &str) -> Result<(), SendError> {
        self.messenger.send_text(recipient, text).await
    }

    /// Deliver a photo to a single recipient.
    pub async fn send_photo(&self, recipient: SubscriberId, photo: &Path) -> Result<(), SendError> {
        self.messenger.send_photo(recipient, photo).await
    }

    /// Deliver a full report to the admin channel.
    ///
    /// Failures go to telemetry only; the report path never propagates them.
    pub async fn send_admin_report(&self, text: &str) {
        if let Err(e) = self.messenger.send_text(self.admin, text).await {
            warn!("Admin report failed: {}", e);
            self.telemetry
                .capture_error("dispatch", &format!("admin report failed: {}", e));
        }
    }
}
