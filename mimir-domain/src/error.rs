// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Taxonomy
//!
//! A single, structured error type shared by every layer of the pipeline
//! execution substrate. Each variant corresponds to one of the error kinds of
//! the propagation policy: plugins classify failures into one of these
//! kinds, the executor attaches the failing step name, and the worker stores
//! the classified error on the `TaskResult` without ever panicking.
//!
//! Variants are deliberately string-carrying rather than nested structs: the
//! taxonomy is the contract, not the payload shape.

use thiserror::Error;

/// The kinds of failure the pipeline execution substrate can produce.
#[derive(Debug, Error, Clone)]
pub enum MimirError {
    #[error("invalid plugin configuration: {0}")]
    ConfigInvalid(String),

    #[error("missing context input: {0}")]
    InputMissing(String),

    #[error("unexpected input shape: {0}")]
    InputShape(String),

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("plugin failed: {0}")]
    PluginFailed(String),

    #[error("malformed value: {0}")]
    MalformedValue(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MimirError {
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    pub fn input_missing(key: impl Into<String>) -> Self {
        Self::InputMissing(key.into())
    }

    pub fn input_shape(msg: impl Into<String>) -> Self {
        Self::InputShape(msg.into())
    }

    pub fn plugin_not_found(plugin_ref: impl Into<String>) -> Self {
        Self::PluginNotFound(plugin_ref.into())
    }

    pub fn plugin_failed(msg: impl Into<String>) -> Self {
        Self::PluginFailed(msg.into())
    }

    pub fn malformed_value(msg: impl Into<String>) -> Self {
        Self::MalformedValue(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn constraint_violation(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    pub fn broker_unavailable(msg: impl Into<String>) -> Self {
        Self::BrokerUnavailable(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// A short machine-stable tag for the variant, used when classifying an
    /// error for a `TaskResult` or a failed-step report.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::ConfigInvalid(_) => "ConfigInvalid",
            Self::InputMissing(_) => "InputMissing",
            Self::InputShape(_) => "InputShape",
            Self::PluginNotFound(_) => "PluginNotFound",
            Self::PluginFailed(_) => "PluginFailed",
            Self::MalformedValue(_) => "MalformedValue",
            Self::NotFound(_) => "NotFound",
            Self::ConstraintViolation(_) => "ConstraintViolation",
            Self::BrokerUnavailable(_) => "BrokerUnavailable",
            Self::Cancelled(_) => "Cancelled",
            Self::Timeout(_) => "Timeout",
            Self::Internal(_) => "Internal",
        }
    }
}

pub type MimirResult<T> = Result<T, MimirError>;
