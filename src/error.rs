//! Errors raised while building a topology.
//!
//! Every error is fatal for the build: no partially wired system is ever
//! returned.

use thiserror::Error;

use crate::component::ComponentKind;
use crate::config::{ConfigError, TargetIsa};

/// Errors that abort a topology build.
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Incapable of building {0} full system")]
    UnsupportedTarget(TargetIsa),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown {kind} class: {class}")]
    UnknownClass { kind: ComponentKind, class: String },

    #[error("Class {class} provides a {found}, expected a {expected}")]
    ClassKindMismatch {
        class: String,
        expected: ComponentKind,
        found: ComponentKind,
    },
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
