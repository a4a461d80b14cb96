// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker CLI
//!
//! The worker binary exposes no CLI surface beyond `--version`/`-v`
//! (handled automatically by `clap`) and an optional `--config <path>` for
//! an ambient configuration file. Everything else is the orchestrator's
//! concern, not the worker's.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "mimir-worker", version, about = "Mimir pipeline execution worker")]
pub struct Cli {
    /// Optional path to a TOML configuration file overriding compiled
    /// defaults before environment variables are applied.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
