//! Key management seam
//!
//! The resolver never touches private keys. It asks a [`KeyClient`] to mint a
//! keypair under a logical name, or to look up the public key behind an
//! address. Implementations own persistence and must be safe to call from
//! several threads at once.

pub mod local;
pub mod mock;

pub use local::LocalKeyClient;
pub use mock::MockKeyClient;

use crate::crypto::{Address, CurveType, PublicKey};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Unknown address {0}")]
    UnknownAddress(Address),
    #[error("Key generation failed for '{name}': {reason}")]
    Generation { name: String, reason: String },
    #[error("Key {address} is inconsistent: its public key derives {derived}")]
    InconsistentKey { address: Address, derived: Address },
    #[error("Key store error: {0}")]
    Storage(String),
    #[error("Wrong password or corrupted key file for {0}")]
    Decryption(Address),
}

pub trait KeyClient: Send + Sync {
    /// Create and persist a new keypair, returning its address
    fn generate(&self, name: &str, curve_type: CurveType) -> Result<Address, KeyError>;

    /// Public key for an address this client knows about
    fn public_key(&self, address: &Address) -> Result<PublicKey, KeyError>;
}
