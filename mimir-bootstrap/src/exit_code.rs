// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Mapping
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions,
//! covering the startup failures a worker process can hit (cannot connect
//! to the broker, cannot open the database, invalid configuration).

/// Exit codes the worker binary can terminate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    GeneralError = 1,
    /// Invalid CLI arguments or configuration (sysexits `EX_USAGE`).
    UsageError = 64,
    /// Malformed configuration value (sysexits `EX_DATAERR`).
    ConfigError = 65,
    /// Could not reach the broker (sysexits `EX_UNAVAILABLE`).
    BrokerUnavailable = 69,
    /// Could not open the persistence backend (sysexits `EX_IOERR`).
    StorageError = 74,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
