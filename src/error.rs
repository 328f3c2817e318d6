//! Errors raised at the fallible edges: construction and configuration.
//!
//! Nothing on the per-tick path returns an error.

use crate::config::ConfigError;
use crate::types::EntityId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RespawnError {
    #[error("invalid respawn configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to encode vehicle template: {0}")]
    Template(#[from] serde_json::Error),
    #[error("unknown vehicle {0}")]
    UnknownVehicle(EntityId),
}

pub type Result<T> = std::result::Result<T, RespawnError>;
