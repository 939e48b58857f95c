//! Canonical structured event names used across `vms-broker`.

// Publisher identity events.
pub const PUBLISHER_ID_ASSIGNED: &str = "publisher_id_assigned";
pub const PUBLISHER_ID_UNKNOWN: &str = "publisher_id_unknown";
pub const PUBLISHER_ID_EXHAUSTED: &str = "publisher_id_exhausted";

// Layer availability events.
pub const AVAILABILITY_RECOMPUTE_START: &str = "availability_recompute_start";
pub const AVAILABILITY_RECOMPUTE_OK: &str = "availability_recompute_ok";
pub const AVAILABILITY_GENERATION_OVERFLOW: &str = "availability_generation_overflow";
pub const DEPENDENCY_CYCLE_DETECTED: &str = "dependency_cycle_detected";
pub const DEPENDENCY_NOT_OFFERED: &str = "dependency_not_offered";

// Subscription routing events.
pub const SUBSCRIPTION_ADD: &str = "subscription_add";
pub const SUBSCRIPTION_REMOVE: &str = "subscription_remove";
pub const SUBSCRIPTION_REMOVE_MISSING: &str = "subscription_remove_missing";
pub const SUBSCRIBER_REMOVE_ALL: &str = "subscriber_remove_all";
pub const SUBSCRIBER_REMOVE_ALL_MISSING: &str = "subscriber_remove_all_missing";

// Broker facade events.
pub const BROKER_START: &str = "broker_start";
pub const OFFERING_UPDATE: &str = "offering_update";
pub const OFFERING_REJECTED: &str = "offering_rejected";
pub const PUBLISH_ROUTE: &str = "publish_route";
pub const PUBLISH_NO_SUBSCRIBERS: &str = "publish_no_subscribers";
pub const DELIVERY_FAILED: &str = "delivery_failed";
pub const AVAILABILITY_NOTIFY_FAILED: &str = "availability_notify_failed";
