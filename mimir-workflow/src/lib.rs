// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Workflow
//!
//! The autonomous workflow engine: [`stage::Stage`] is the capability a
//! collaborator (schema inference, ontology building, ML training, ...)
//! implements; [`registry::StageRegistry`] indexes them by step name;
//! [`engine::Engine`] runs the fixed six-stage chain a
//! `mimir_domain::WorkflowJob` describes.

pub mod engine;
pub mod registry;
pub mod stage;

pub use engine::Engine;
pub use registry::StageRegistry;
pub use stage::{EmittedArtifact, Stage};
