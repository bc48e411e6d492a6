use crate::crypto::Address;
use crate::keys::KeyError;
use crate::permission::PermissionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenesisError {
    #[error("Key service error: {0}")]
    KeyService(#[from] KeyError),
    #[error("Template address {template} does not match public key derived address {derived}")]
    IdentityMismatch { template: Address, derived: Address },
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GenesisError {
    fn from(err: serde_json::Error) -> Self {
        GenesisError::Serialization(err.to_string())
    }
}

pub type Result<T, E = GenesisError> = std::result::Result<T, E>;
