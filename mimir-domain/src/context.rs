// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Typed Dataflow Context
//!
//! `Context` is the thread-safe key -> typed-value store that a pipeline
//! executor threads through an ordered sequence of steps. Every step reads
//! zero or more keys out of its inbound context and writes zero or more keys
//! into its outbound context; the executor then merges the outbound context
//! back into the shared one.
//!
//! Two variants are provided:
//!
//! - [`Context`] — a straightforward `RwLock`-guarded map. `clone()` performs
//!   a full deep copy: every `DataValue` is cloned (bytes included), so
//!   mutations on the clone are never visible on the source.
//! - [`FastContext`] — the "optimized" variant described in the component
//!   design. It tracks a monotonic version counter and clones in O(top-level
//!   map size) rather than O(total bytes) by structurally sharing immutable
//!   `DataValue`s behind `Arc` and only ever replacing whole top-level maps,
//!   never mutating one in place. Because `DataValue`s are never mutated
//!   after being stored (callers always `set` a fresh value), this sharing is
//!   safe and still gives clone-then-mutate isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::RwLock;
use serde_json::Value as Json;

use crate::value::DataValue;

/// Strips the `DataValue` envelope down to the variant's bare shape: the
/// content map itself for `Structured`, the struct's own fields for
/// `Binary`/`Image`, the points list alone (metadata dropped) for
/// `TimeSeries`, and a base64 string for `Custom`.
fn unwrap_payload(value: &DataValue) -> Json {
    match value {
        DataValue::Structured(v) => Json::Object(v.content.clone().into_iter().collect()),
        DataValue::Binary(v) => serde_json::to_value(v).unwrap_or(Json::Null),
        DataValue::TimeSeries(v) => serde_json::to_value(&v.points).unwrap_or(Json::Null),
        DataValue::Image(v) => serde_json::to_value(v).unwrap_or(Json::Null),
        DataValue::Custom(c) => match c.serialize() {
            Ok(bytes) => Json::String(BASE64.encode(bytes)),
            Err(_) => Json::Null,
        },
    }
}

/// Thread-safe key -> typed-value store, deep-cloning.
#[derive(Debug)]
pub struct Context {
    inner: RwLock<ContextInner>,
}

#[derive(Debug, Default)]
struct ContextInner {
    data: HashMap<String, DataValue>,
    metadata: HashMap<String, Json>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self { inner: RwLock::new(ContextInner::default()) }
    }

    /// Returns the unwrapped inner payload for ergonomic use: a plain JSON
    /// object for `Structured` (the bare content map, not wrapped in an
    /// envelope field), the variant's own field shape (payload/mime_type,
    /// width/height, ...) for `Binary`/`Image`, the bare points list (no
    /// metadata) for `TimeSeries`, and a base64 string for `Custom`. Callers
    /// that need the tagged variant itself should use [`Self::get_typed`].
    pub fn get(&self, key: &str) -> Option<Json> {
        self.inner.read().data.get(key).map(unwrap_payload)
    }

    /// Returns the variant itself, envelope included.
    pub fn get_typed(&self, key: &str) -> Option<DataValue> {
        self.inner.read().data.get(key).cloned()
    }

    /// Auto-wraps a raw JSON value into the appropriate variant:
    /// - a JSON object -> `Structured`
    /// - anything else -> `Structured` wrapping `{"value": raw}`
    ///
    /// Binary and time-series payloads do not have a natural `serde_json`
    /// representation, so callers that want those variants should use
    /// [`Context::set_typed`] directly.
    pub fn set(&self, key: impl Into<String>, raw: Json) {
        let value = match raw {
            Json::Object(map) => DataValue::Structured(crate::value::StructuredValue::new(map.into_iter().collect())),
            other => {
                let mut wrapped = HashMap::new();
                wrapped.insert("value".to_string(), other);
                DataValue::Structured(crate::value::StructuredValue::new(wrapped))
            }
        };
        self.set_typed(key, value);
    }

    /// Stores a value without wrapping.
    pub fn set_typed(&self, key: impl Into<String>, value: DataValue) {
        self.inner.write().data.insert(key.into(), value);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().data.remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.read().data.keys().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write();
        guard.data.clear();
        guard.metadata.clear();
    }

    pub fn get_metadata(&self, key: &str) -> Option<Json> {
        self.inner.read().metadata.get(key).cloned()
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: Json) {
        self.inner.write().metadata.insert(key.into(), value);
    }

    /// A deep-cloned snapshot of every `(key, value)` pair, for callers that
    /// need to iterate the whole map (the serialization layer, the
    /// executor's merge step).
    pub fn entries(&self) -> Vec<(String, DataValue)> {
        self.inner.read().data.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// A deep-cloned snapshot of the metadata map.
    pub fn metadata_entries(&self) -> HashMap<String, Json> {
        self.inner.read().metadata.clone()
    }

    /// Deep clone: every `DataValue` is cloned independently, so subsequent
    /// mutation of either context is invisible to the other.
    pub fn clone_deep(&self) -> Self {
        let guard = self.inner.read();
        Self {
            inner: RwLock::new(ContextInner { data: guard.data.clone(), metadata: guard.metadata.clone() }),
        }
    }

    /// Merges `other` into `self`, later keys overwriting earlier ones on
    /// collision, per the executor's documented merge policy.
    pub fn merge_from(&self, other: &Context) {
        let other_guard = other.inner.read();
        let mut guard = self.inner.write();
        for (k, v) in other_guard.data.iter() {
            guard.data.insert(k.clone(), v.clone());
        }
        for (k, v) in other_guard.metadata.iter() {
            guard.metadata.insert(k.clone(), v.clone());
        }
    }
}

/// Optimized variant of [`Context`] with a monotonic version counter and
/// cheap, structurally-shared cloning.
#[derive(Debug)]
pub struct FastContext {
    version: AtomicU64,
    snapshot: RwLock<Arc<FastContextInner>>,
}

#[derive(Debug, Default, Clone)]
struct FastContextInner {
    data: HashMap<String, Arc<DataValue>>,
    metadata: HashMap<String, Arc<Json>>,
}

impl Default for FastContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FastContext {
    pub fn new() -> Self {
        Self { version: AtomicU64::new(0), snapshot: RwLock::new(Arc::new(FastContextInner::default())) }
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Unwrapped inner payload, matching [`Context::get`]'s shape per variant.
    pub fn get(&self, key: &str) -> Option<Json> {
        self.snapshot.read().data.get(key).map(|v| unwrap_payload(v))
    }

    pub fn get_typed(&self, key: &str) -> Option<DataValue> {
        self.snapshot.read().data.get(key).map(|v| (**v).clone())
    }

    pub fn set_typed(&self, key: impl Into<String>, value: DataValue) {
        let mut guard = self.snapshot.write();
        let mut next = (**guard).clone();
        next.data.insert(key.into(), Arc::new(value));
        *guard = Arc::new(next);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    pub fn delete(&self, key: &str) -> bool {
        let mut guard = self.snapshot.write();
        let mut next = (**guard).clone();
        let removed = next.data.remove(key).is_some();
        if removed {
            *guard = Arc::new(next);
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    pub fn keys(&self) -> Vec<String> {
        self.snapshot.read().data.keys().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.snapshot.read().data.len()
    }

    pub fn clear(&self) {
        *self.snapshot.write() = Arc::new(FastContextInner::default());
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    pub fn get_metadata(&self, key: &str) -> Option<Json> {
        self.snapshot.read().metadata.get(key).map(|v| (**v).clone())
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: Json) {
        let mut guard = self.snapshot.write();
        let mut next = (**guard).clone();
        next.metadata.insert(key.into(), Arc::new(value));
        *guard = Arc::new(next);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Shallow clone of the top-level maps: Arc pointers are duplicated, the
    /// `DataValue`s behind them are not. Safe because values are never
    /// mutated in place once stored.
    pub fn clone_shallow(&self) -> Self {
        let snapshot = self.snapshot.read().clone();
        Self { version: AtomicU64::new(self.version()), snapshot: RwLock::new(snapshot) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_is_isolated() {
        let ctx = Context::new();
        ctx.set("u", serde_json::json!({"name": "Alice"}));
        let clone = ctx.clone_deep();
        clone.set("u", serde_json::json!({"name": "Bob"}));

        let original = ctx.get("u").unwrap();
        assert_eq!(original.get("name").unwrap(), "Alice");
    }

    #[test]
    fn get_unwraps_the_envelope_while_get_typed_keeps_it() {
        let ctx = Context::new();
        ctx.set_typed("p", DataValue::Binary(crate::value::BinaryValue::new(b"hi".to_vec(), "application/octet-stream")));

        let unwrapped = ctx.get("p").unwrap();
        assert_eq!(unwrapped.get("mime_type").unwrap(), "application/octet-stream");

        match ctx.get_typed("p").unwrap() {
            DataValue::Binary(b) => assert_eq!(b.payload, b"hi"),
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn fast_context_clone_is_isolated() {
        let ctx = FastContext::new();
        ctx.set_typed("k", DataValue::Structured(crate::value::StructuredValue::new(HashMap::new())));
        let clone = ctx.clone_shallow();
        clone.delete("k");

        assert!(ctx.get("k").is_some());
        assert!(clone.get("k").is_none());
    }

    #[test]
    fn fast_context_version_increments() {
        let ctx = FastContext::new();
        let v0 = ctx.version();
        ctx.set_metadata("a", serde_json::json!(1));
        assert!(ctx.version() > v0);
    }

    proptest::proptest! {
        /// For any sequence of key/value writes, mutating a deep clone never
        /// changes what the original reports back for those keys.
        #[test]
        fn context_deep_clone_is_isolated_for_arbitrary_writes(
            seed in proptest::collection::vec(
                ("[a-zA-Z][a-zA-Z0-9_]{0,9}", proptest::prelude::any::<i32>()),
                1..16,
            ),
            mutation in "[a-zA-Z][a-zA-Z0-9_]{0,9}",
            mutated_value in proptest::prelude::any::<i32>(),
        ) {
            let ctx = Context::new();
            for (k, v) in &seed {
                ctx.set(k.clone(), serde_json::json!(*v));
            }
            let before: std::collections::HashMap<_, _> = ctx.entries().into_iter().collect();

            let clone = ctx.clone_deep();
            clone.set(mutation.clone(), serde_json::json!(mutated_value));
            clone.delete(&seed[0].0);

            let after: std::collections::HashMap<_, _> = ctx.entries().into_iter().collect();
            proptest::prop_assert_eq!(before, after);
        }

        /// Same isolation property for `FastContext`'s structurally-shared
        /// shallow clone: replacing a top-level entry on the clone must not
        /// perturb the Arc-shared snapshot still held by the original.
        #[test]
        fn fast_context_shallow_clone_is_isolated_for_arbitrary_writes(
            seed in proptest::collection::vec(
                ("[a-zA-Z][a-zA-Z0-9_]{0,9}", proptest::prelude::any::<i32>()),
                1..16,
            ),
            mutation in "[a-zA-Z][a-zA-Z0-9_]{0,9}",
        ) {
            let ctx = FastContext::new();
            for (k, v) in &seed {
                ctx.set_typed(k.clone(), DataValue::Structured(crate::value::StructuredValue::new(
                    [( "v".to_string(), serde_json::json!(*v))].into_iter().collect(),
                )));
            }
            let before_keys = ctx.keys();

            let clone = ctx.clone_shallow();
            clone.set_typed(mutation, DataValue::Structured(crate::value::StructuredValue::new(HashMap::new())));
            clone.delete(&seed[0].0);

            let after_keys = ctx.keys();
            proptest::prop_assert_eq!(before_keys.len(), after_keys.len());
            proptest::prop_assert!(ctx.get(&seed[0].0).is_some());
        }
    }
}
