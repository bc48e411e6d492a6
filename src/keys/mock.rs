//! Deterministic in-memory key client for tests and dry runs.

use super::{KeyClient, KeyError};
use crate::crypto::{Address, CurveType, KeyPair, PublicKey};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keys are derived from the requested name and a generation counter, so a
/// fresh mock hands out the same addresses on every run. Calls are counted.
#[derive(Default)]
pub struct MockKeyClient {
    keys: Mutex<HashMap<Address, PublicKey>>,
    generate_calls: AtomicUsize,
    public_key_calls: AtomicUsize,
    fail_generate: bool,
}

impl MockKeyClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose `generate` always fails
    pub fn failing_generate() -> Self {
        Self {
            fail_generate: true,
            ..Self::default()
        }
    }

    /// Make an existing public key known to the client
    pub fn with_key(mut self, public_key: PublicKey) -> Self {
        if let Ok(keys) = self.keys.get_mut() {
            keys.insert(public_key.address(), public_key);
        }
        self
    }

    /// Canned ed25519 key for `name`, independent of any client state
    pub fn canned_key(name: &str) -> PublicKey {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&Sha256::digest(name.as_bytes()));
        KeyPair::ed25519_from_seed(&seed).public_key
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn public_key_calls(&self) -> usize {
        self.public_key_calls.load(Ordering::SeqCst)
    }
}

impl KeyClient for MockKeyClient {
    fn generate(&self, name: &str, curve_type: CurveType) -> Result<Address, KeyError> {
        let n = self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_generate {
            return Err(KeyError::Generation {
                name: name.to_string(),
                reason: "mock generation disabled".to_string(),
            });
        }
        // Only ed25519 can be derived from a seed here; other curves get real randomness
        let public_key = match curve_type {
            CurveType::Ed25519 => Self::canned_key(&format!("{}/{}", name, n)),
            other => KeyPair::generate(other).public_key,
        };
        let address = public_key.address();
        self.keys
            .lock()
            .map_err(|_| KeyError::Storage("mock key store poisoned".to_string()))?
            .insert(address, public_key);
        Ok(address)
    }

    fn public_key(&self, address: &Address) -> Result<PublicKey, KeyError> {
        self.public_key_calls.fetch_add(1, Ordering::SeqCst);
        self.keys
            .lock()
            .map_err(|_| KeyError::Storage("mock key store poisoned".to_string()))?
            .get(address)
            .cloned()
            .ok_or(KeyError::UnknownAddress(*address))
    }
}
