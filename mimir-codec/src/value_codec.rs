// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Serializer
//!
//! Round-trips one [`DataValue`] to bytes, optionally gzip-wrapped. The
//! caller is responsible for remembering which variant a blob belongs to
//! (the context serializer recovers it with a heuristic; direct callers
//! that already know the shape just pass it back in).

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mimir_domain::{DataValue, MimirError, MimirResult};

pub struct ValueSerializer {
    compress: bool,
}

impl ValueSerializer {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    pub fn serialize(&self, value: &DataValue) -> MimirResult<Vec<u8>> {
        let raw = value.serialize()?;
        if self.compress {
            gzip(&raw)
        } else {
            Ok(raw)
        }
    }

    pub fn deserialize(&self, bytes: &[u8], variant_tag: &str) -> MimirResult<DataValue> {
        let raw = self.decompress(bytes)?;
        DataValue::deserialize(variant_tag, &raw)
    }

    /// Undoes the optional gzip wrapping without interpreting the result as
    /// any particular variant; used by the context serializer to peek at a
    /// value's shape before it knows the tag.
    pub fn decompress(&self, bytes: &[u8]) -> MimirResult<Vec<u8>> {
        if self.compress {
            gunzip(bytes)
        } else {
            Ok(bytes.to_vec())
        }
    }
}

fn gzip(raw: &[u8]) -> MimirResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).map_err(|e| MimirError::internal(e.to_string()))?;
    encoder.finish().map_err(|e| MimirError::internal(e.to_string()))
}

fn gunzip(bytes: &[u8]) -> MimirResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| MimirError::malformed_value(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mimir_domain::StructuredValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn uncompressed_round_trip() {
        let serializer = ValueSerializer::new(false);
        let mut content = HashMap::new();
        content.insert("k".to_string(), json!("v"));
        let value = DataValue::Structured(StructuredValue::new(content));

        let bytes = serializer.serialize(&value).unwrap();
        let back = serializer.deserialize(&bytes, "structured").unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn compressed_round_trip() {
        let serializer = ValueSerializer::new(true);
        let mut content = HashMap::new();
        content.insert("k".to_string(), json!("v"));
        let value = DataValue::Structured(StructuredValue::new(content));

        let bytes = serializer.serialize(&value).unwrap();
        let back = serializer.deserialize(&bytes, "structured").unwrap();
        assert_eq!(value, back);
    }
}
