// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Broker
//!
//! A thin wrapper over Redis implementing exactly the keys and channels the
//! worker protocol needs:
//!
//! - `mimir:tasks` — a list; the orchestrator right-pushes a `Task`, a
//!   worker blocking-left-pops it.
//! - `mimir:task_results:<id>` — a string key holding a `TaskResult`, set
//!   with a one-hour expiry.
//! - `mimir:notifications:task:<id>` — published alongside the result
//!   store, for any listener that wants to react immediately.
//! - `mimir:cancel:<id>` — published by an orchestrator wanting to cancel
//!   an in-flight task; a worker's subscriber loop forwards this into the
//!   task's `CancellationScope`.
//!
//! Every public method that touches the connection maps a connection-class
//! redis error to `MimirError::BrokerUnavailable` rather than letting the
//! underlying `redis::RedisError` escape this crate.

use std::time::Duration;

use mimir_domain::{MimirError, MimirResult, Task, TaskResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

pub const TASKS_LIST: &str = "mimir:tasks";
pub const DEFAULT_DEQUEUE_TIMEOUT_SECS: u64 = 5;
pub const RESULT_TTL_SECS: u64 = 3600;

pub fn result_key(task_id: &str) -> String {
    format!("mimir:task_results:{task_id}")
}

pub fn notification_channel(task_id: &str) -> String {
    format!("mimir:notifications:task:{task_id}")
}

pub fn cancel_channel(task_id: &str) -> String {
    format!("mimir:cancel:{task_id}")
}

/// An async, cloneable handle to the task queue. Cloning is cheap:
/// `ConnectionManager` multiplexes a single connection and reconnects
/// transparently. A separate `redis::Client` is kept alongside it because
/// pub/sub subscriptions need their own dedicated connection.
#[derive(Clone)]
pub struct Broker {
    client: redis::Client,
    conn: ConnectionManager,
}

impl Broker {
    /// Connects to `redis_url` and verifies it with a `PING`, raising
    /// `BrokerUnavailable` if either step fails.
    pub async fn connect(redis_url: &str) -> MimirResult<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        let mut conn = client.get_connection_manager().await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        Ok(Self { client, conn })
    }

    /// Right-pushes a serialized `Task` onto `mimir:tasks`.
    pub async fn enqueue(&self, task: &Task) -> MimirResult<()> {
        let payload = serde_json::to_string(task).map_err(|e| MimirError::malformed_value(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(TASKS_LIST, payload).await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        Ok(())
    }

    /// Blocking-left-pops `mimir:tasks`, waiting up to `timeout`. Returns
    /// `None` on timeout, which the worker's poll loop treats as "no work
    /// right now" rather than an error.
    pub async fn dequeue(&self, timeout: Duration) -> MimirResult<Option<Task>> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> =
            conn.blpop(TASKS_LIST, timeout.as_secs_f64()).await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        match reply {
            None => Ok(None),
            Some((_, payload)) => {
                let task = serde_json::from_str(&payload).map_err(|e| MimirError::malformed_value(e.to_string()))?;
                Ok(Some(task))
            }
        }
    }

    /// Stores `result` under `mimir:task_results:<id>` with a 3600s expiry,
    /// then publishes it on `mimir:notifications:task:<id>`.
    pub async fn publish_result(&self, result: &TaskResult) -> MimirResult<()> {
        let payload = serde_json::to_string(result).map_err(|e| MimirError::malformed_value(e.to_string()))?;
        let mut conn = self.conn.clone();
        let key = result_key(&result.id.to_string());
        conn.set_ex::<_, _, ()>(&key, &payload, RESULT_TTL_SECS).await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        conn.publish::<_, _, ()>(notification_channel(&result.id.to_string()), payload)
            .await
            .map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        Ok(())
    }

    /// Reads a previously stored result, if it hasn't expired.
    pub async fn fetch_result(&self, task_id: &str) -> MimirResult<Option<TaskResult>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(result_key(task_id)).await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        match payload {
            None => Ok(None),
            Some(p) => {
                let result = serde_json::from_str(&p).map_err(|e| MimirError::malformed_value(e.to_string()))?;
                Ok(Some(result))
            }
        }
    }

    /// Publishes on `mimir:cancel:<id>`. Best-effort: a worker not
    /// currently subscribed (or not running that task) simply never sees
    /// the message, which is the documented semantics.
    pub async fn request_cancel(&self, task_id: &str) -> MimirResult<()> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(cancel_channel(task_id), "cancel").await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        Ok(())
    }

    /// Opens a dedicated pub/sub connection subscribed to `mimir:cancel:<id>`
    /// and calls `on_message` once for every message received, until the
    /// returned [`CancelSubscription`] is dropped or the connection errors.
    /// The caller is responsible for wiring `on_message` into whatever
    /// cancellation mechanism the task uses; this crate has no knowledge of
    /// `CancellationScope`.
    pub async fn subscribe_cancel(&self, task_id: &str, mut on_message: impl FnMut() + Send + 'static) -> MimirResult<CancelSubscription> {
        use futures::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;
        pubsub.subscribe(cancel_channel(task_id)).await.map_err(|e| MimirError::broker_unavailable(e.to_string()))?;

        let handle = tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while stream.next().await.is_some() {
                on_message();
            }
        });
        Ok(CancelSubscription { handle })
    }
}

/// Keeps a `subscribe_cancel` listener alive; dropping it unsubscribes by
/// aborting the background task, so a finished task's Redis subscription
/// doesn't outlive it.
pub struct CancelSubscription {
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for CancelSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
