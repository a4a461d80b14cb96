// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Executor
//!
//! Parses a declarative pipeline document ([`pipeline::PipelineDocument`])
//! and runs it ([`executor::Executor`]) against the plugin registry,
//! threading a shared context forward one step at a time.

pub mod executor;
pub mod pipeline;

pub use executor::{Executor, PipelineResult, StepTiming};
pub use pipeline::{PipelineDocument, RawStep};
