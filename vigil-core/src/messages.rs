//! User-facing message templates

/// Placeholder for absent optional report fields
pub const NONE: &str = "(none)";

/// Sent to every subscriber when a signal fires
pub const NOTIFICATION: &str = "Change detected!";

/// Reply to a successful subscribe
pub const SUBSCRIBED: &str = "Subscribed to change notifications.";

/// Reply when the subscriber is already registered
pub const ALREADY_SUBSCRIBED: &str = "Already subscribed.";

/// Reply to a successful unsubscribe
pub const UNSUBSCRIBED: &str = "Unsubscribed from change notifications.";

/// Reply when the subscriber was not registered
pub const ALREADY_UNSUBSCRIBED: &str = "Not currently subscribed.";

/// Liveness message confirming a subscription is registered
pub const STATUS_PING: &str = "Subscription is active.";

/// Admin audit line prefix for a new subscriber
pub const SUBSCRIBER_ADDED: &str = "Subscriber added";

/// Admin audit line prefix for a removed subscriber
pub const SUBSCRIBER_REMOVED: &str = "Subscriber removed";
