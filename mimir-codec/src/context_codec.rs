// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Context Serializer
//!
//! Serializes a whole [`Context`] to the wire shape `{data: {key:
//! base64(serialized_value)}, metadata: {key: scalar}}`. On deserialization,
//! the variant tag for each entry is *recovered* from the decoded inner
//! bytes by a documented heuristic, since the wire format does not carry an
//! explicit tag:
//!
//! - a top-level `points` key -> `TimeSeries`
//! - `mime_type` + `width` -> `Image`
//! - `mime_type` alone -> `Binary`
//! - otherwise -> `Structured`
//!
//! `Custom` values are outside the scope of this heuristic: they carry
//! caller-defined shapes the core cannot recognize generically, so a context
//! containing a `Custom` value must be read back through
//! `Context::get_typed` by a caller that already knows the concrete type,
//! not through this round trip.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mimir_domain::{Context, MimirError, MimirResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value_codec::ValueSerializer;

#[derive(Debug, Serialize, Deserialize)]
struct ContextWire {
    data: HashMap<String, String>,
    metadata: HashMap<String, Json>,
}

pub struct ContextSerializer {
    values: ValueSerializer,
}

impl ContextSerializer {
    pub fn new(compress: bool) -> Self {
        Self { values: ValueSerializer::new(compress) }
    }

    pub fn serialize(&self, ctx: &Context) -> MimirResult<Vec<u8>> {
        let mut data = HashMap::new();
        for (key, value) in ctx.entries() {
            let bytes = self.values.serialize(&value)?;
            data.insert(key, STANDARD.encode(bytes));
        }
        let wire = ContextWire { data, metadata: ctx.metadata_entries() };
        serde_json::to_vec(&wire).map_err(|e| MimirError::malformed_value(e.to_string()))
    }

    pub fn deserialize(&self, bytes: &[u8]) -> MimirResult<Context> {
        let wire: ContextWire = serde_json::from_slice(bytes).map_err(|e| MimirError::malformed_value(e.to_string()))?;
        let ctx = Context::new();

        for (key, encoded) in wire.data {
            let raw = STANDARD.decode(encoded.as_bytes()).map_err(|e| MimirError::malformed_value(e.to_string()))?;
            let inner = self.values.decompress(&raw)?;
            let probe: Json = serde_json::from_slice(&inner).map_err(|e| MimirError::malformed_value(e.to_string()))?;
            let tag = recover_variant_tag(&probe)?;
            let value = self.values.deserialize(&raw, tag)?;
            ctx.set_typed(key, value);
        }
        for (key, value) in wire.metadata {
            ctx.set_metadata(key, value);
        }
        Ok(ctx)
    }
}

/// Applies the documented shape-key heuristic to a decoded JSON payload.
pub fn recover_variant_tag(json: &Json) -> MimirResult<&'static str> {
    let obj = json.as_object().ok_or_else(|| MimirError::malformed_value("context entry is not a JSON object"))?;
    if obj.contains_key("points") {
        Ok("time_series")
    } else if obj.contains_key("mime_type") && obj.contains_key("width") {
        Ok("image")
    } else if obj.contains_key("mime_type") {
        Ok("binary")
    } else {
        Ok("structured")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;

    use mimir_domain::{BinaryValue, DataValue, StructuredValue};
    use serde_json::json;

    use super::*;

    #[test]
    fn round_trips_structured_and_binary_scenario_s1() {
        let ctx = Context::new();
        let mut content = StdHashMap::new();
        content.insert("name".to_string(), json!("Alice"));
        content.insert("age".to_string(), json!(30));
        ctx.set_typed("u", DataValue::Structured(StructuredValue::new(content)));
        ctx.set_typed("p", DataValue::Binary(BinaryValue::new(b"hi".to_vec(), "application/octet-stream")));

        let serializer = ContextSerializer::new(false);
        let bytes = serializer.serialize(&ctx).unwrap();
        let restored = serializer.deserialize(&bytes).unwrap();

        match restored.get_typed("u").unwrap() {
            DataValue::Structured(s) => {
                assert_eq!(s.content.get("name").unwrap(), &json!("Alice"));
                assert_eq!(s.content.get("age").unwrap(), &json!(30.0));
            }
            _ => panic!("expected structured"),
        }
        match restored.get_typed("p").unwrap() {
            DataValue::Binary(b) => {
                assert_eq!(b.payload, b"hi");
                assert_eq!(b.mime_type, "application/octet-stream");
            }
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn heuristic_prefers_time_series_over_other_shapes() {
        let json = json!({"points": [], "metadata": {}});
        assert_eq!(recover_variant_tag(&json).unwrap(), "time_series");
    }

    #[test]
    fn heuristic_detects_image_vs_binary() {
        let image = json!({"payload": "", "mime_type": "image/png", "format": "png", "width": 1, "height": 1});
        assert_eq!(recover_variant_tag(&image).unwrap(), "image");

        let binary = json!({"payload": "", "mime_type": "application/octet-stream"});
        assert_eq!(recover_variant_tag(&binary).unwrap(), "binary");
    }
}
