// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Worker
//!
//! The worker process library: [`runtime::Worker`] owns the
//! `starting -> connecting -> ready -> draining -> stopped` lifecycle and
//! the bounded-concurrency dispatch loop; [`dispatch`] turns one task into
//! a result; [`state`] names the lifecycle and assigns the worker id.

pub mod dispatch;
pub mod runtime;
pub mod state;

pub use runtime::Worker;
pub use state::{worker_id, WorkerState};
