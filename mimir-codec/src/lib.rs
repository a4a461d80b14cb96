// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Codec
//!
//! The serialization layer: [`value_codec`] round-trips one `DataValue`
//! (with optional gzip compression), [`context_codec`] round-trips a whole
//! `Context` and recovers each entry's variant tag from its decoded shape.

pub mod context_codec;
pub mod value_codec;

pub use context_codec::{recover_variant_tag, ContextSerializer};
pub use value_codec::ValueSerializer;
