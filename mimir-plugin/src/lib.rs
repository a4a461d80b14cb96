// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Plugin
//!
//! The plugin capability set ([`plugin`]) and the registry that indexes
//! plugin instances by `(type_tag, name)` ([`registry`]).

pub mod plugin;
pub mod registry;

pub use plugin::{plugin_key, plugin_type, Plugin, PluginKey, StepOutcome};
pub use registry::Registry;
