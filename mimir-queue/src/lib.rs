// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Queue
//!
//! The Redis-backed task queue protocol: see [`broker::Broker`] for the
//! list, key, and channel operations a worker and an orchestrator use to
//! exchange tasks and results.

pub mod broker;

pub use broker::{
    cancel_channel, notification_channel, result_key, Broker, CancelSubscription, DEFAULT_DEQUEUE_TIMEOUT_SECS, RESULT_TTL_SECS, TASKS_LIST,
};

#[cfg(test)]
mod tests {
    use super::broker::{cancel_channel, notification_channel, result_key};

    #[test]
    fn key_and_channel_naming_matches_the_documented_protocol() {
        assert_eq!(result_key("abc"), "mimir:task_results:abc");
        assert_eq!(notification_channel("abc"), "mimir:notifications:task:abc");
        assert_eq!(cancel_channel("abc"), "mimir:cancel:abc");
    }
}
