// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Storage
//!
//! Embedded SQLite persistence backend. [`store::Store`] owns the pool and
//! exposes the section 4.H contract across [`ontology`], [`twin`],
//! [`model`], and [`workflow`].

pub mod model;
pub mod ontology;
pub mod pool;
pub mod store;
#[cfg(test)]
mod test_support;
pub mod twin;
pub mod workflow;

pub use store::Store;
