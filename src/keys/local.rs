//! Local key store: keys kept in memory and, when a directory is given,
//! written out as one JSON file per address.

use super::{KeyClient, KeyError};
use crate::crypto::{Address, CurveType, KeyPair, PublicKey};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

const PBKDF2_ROUNDS: u32 = 100_000;
const NONCE_LEN: usize = 12;

/// On-disk form of a key. The private key is either hex (no password) or an
/// AES-256-GCM blob of nonce || ciphertext.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    name: String,
    address: Address,
    public_key: PublicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    encrypted_private_key: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    encryption_salt: Vec<u8>,
    created_at: String,
}

struct StoredKey {
    name: String,
    pair: KeyPair,
    created_at: String,
}

#[derive(Default)]
struct KeyStoreState {
    keys: HashMap<Address, StoredKey>,
    names: HashMap<String, Address>,
}

/// Summary of a stored key, without secret material
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct KeyInfo {
    pub name: String,
    pub address: Address,
    pub public_key: PublicKey,
}

pub struct LocalKeyClient {
    dir: Option<PathBuf>,
    password: Option<String>,
    state: Mutex<KeyStoreState>,
}

impl LocalKeyClient {
    /// A store that lives only as long as this value
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            password: None,
            state: Mutex::new(KeyStoreState::default()),
        }
    }

    /// Open (or create) a key directory, loading every key file in it
    pub fn open(dir: impl AsRef<Path>, password: Option<&str>) -> Result<Self, KeyError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| storage_err(&dir, e))?;

        let mut loaded = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| storage_err(&dir, e))? {
            let path = entry.map_err(|e| storage_err(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Key files are named by address; anything else is not ours
            let is_key_file = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.parse::<Address>().is_ok());
            if !is_key_file {
                warn!("Skipping {}: not a key file", path.display());
                continue;
            }
            loaded.push(read_key_file(&path, password)?);
        }
        // Oldest first so that the newest key wins a shared name
        loaded.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut state = KeyStoreState::default();
        for key in loaded {
            let address = key.pair.address();
            if !key.name.is_empty() {
                state.names.insert(key.name.clone(), address);
            }
            state.keys.insert(address, key);
        }
        info!("Loaded {} key(s) from {}", state.keys.len(), dir.display());

        Ok(Self {
            dir: Some(dir),
            password: password.map(str::to_string),
            state: Mutex::new(state),
        })
    }

    /// Address most recently generated under `name`
    pub fn address_of(&self, name: &str) -> Result<Option<Address>, KeyError> {
        Ok(self.lock()?.names.get(name).copied())
    }

    pub fn list(&self) -> Result<Vec<KeyInfo>, KeyError> {
        let state = self.lock()?;
        let mut keys: Vec<KeyInfo> = state
            .keys
            .iter()
            .map(|(address, stored)| KeyInfo {
                name: stored.name.clone(),
                address: *address,
                public_key: stored.pair.public_key.clone(),
            })
            .collect();
        keys.sort_by(|a, b| a.name.cmp(&b.name).then(a.address.cmp(&b.address)));
        Ok(keys)
    }

    fn lock(&self) -> Result<MutexGuard<'_, KeyStoreState>, KeyError> {
        self.state
            .lock()
            .map_err(|_| KeyError::Storage("key store lock poisoned".to_string()))
    }

    fn write_key_file(&self, dir: &Path, stored: &StoredKey) -> Result<(), KeyError> {
        let address = stored.pair.address();
        let mut file = KeyFile {
            name: stored.name.clone(),
            address,
            public_key: stored.pair.public_key.clone(),
            private_key: None,
            encrypted_private_key: Vec::new(),
            encryption_salt: Vec::new(),
            created_at: stored.created_at.clone(),
        };
        match &self.password {
            Some(password) => {
                let (blob, salt) = encrypt_secret(stored.pair.secret_bytes(), password)?;
                file.encrypted_private_key = blob;
                file.encryption_salt = salt;
            }
            None => file.private_key = Some(hex::encode(stored.pair.secret_bytes())),
        }

        let path = dir.join(format!("{}.json", address));
        let json = serde_json::to_string_pretty(&file).map_err(|e| KeyError::Storage(e.to_string()))?;
        fs::write(&path, json).map_err(|e| storage_err(&path, e))?;
        debug!("Wrote key file {}", path.display());
        Ok(())
    }
}

impl KeyClient for LocalKeyClient {
    fn generate(&self, name: &str, curve_type: CurveType) -> Result<Address, KeyError> {
        let stored = StoredKey {
            name: name.to_string(),
            pair: KeyPair::generate(curve_type),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let address = stored.pair.address();

        if let Some(dir) = &self.dir {
            self.write_key_file(dir, &stored)?;
        }

        let mut state = self.lock()?;
        if !name.is_empty() {
            if let Some(previous) = state.names.insert(name.to_string(), address) {
                warn!("Key name '{}' moved from {} to {}", name, previous, address);
            }
        }
        state.keys.insert(address, stored);
        info!("Generated {} key '{}' with address {}", curve_type, name, address);
        Ok(address)
    }

    fn public_key(&self, address: &Address) -> Result<PublicKey, KeyError> {
        self.lock()?
            .keys
            .get(address)
            .map(|stored| stored.pair.public_key.clone())
            .ok_or(KeyError::UnknownAddress(*address))
    }
}

fn storage_err(path: &Path, err: std::io::Error) -> KeyError {
    KeyError::Storage(format!("{}: {}", path.display(), err))
}

fn read_key_file(path: &Path, password: Option<&str>) -> Result<StoredKey, KeyError> {
    let content = fs::read_to_string(path).map_err(|e| storage_err(path, e))?;
    let file: KeyFile = serde_json::from_str(&content)
        .map_err(|e| KeyError::Storage(format!("{}: {}", path.display(), e)))?;

    let secret = match (&file.private_key, password) {
        (Some(hex_key), _) => hex::decode(hex_key)
            .map_err(|e| KeyError::Storage(format!("{}: {}", path.display(), e)))?,
        (None, Some(password)) => {
            decrypt_secret(&file.encrypted_private_key, &file.encryption_salt, password)
                .ok_or(KeyError::Decryption(file.address))?
        }
        (None, None) => {
            return Err(KeyError::Storage(format!(
                "{} is encrypted and no password was given",
                path.display()
            )))
        }
    };

    let pair = KeyPair::from_parts(file.public_key, secret)
        .map_err(|_| KeyError::Decryption(file.address))?;
    if pair.address() != file.address {
        return Err(KeyError::InconsistentKey {
            address: file.address,
            derived: pair.address(),
        });
    }

    Ok(StoredKey {
        name: file.name,
        pair,
        created_at: file.created_at,
    })
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

fn encrypt_secret(secret: &[u8], password: &str) -> Result<(Vec<u8>, Vec<u8>), KeyError> {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);

    let cipher = Aes256Gcm::new(&derive_key(password, &salt).into());
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, secret)
        .map_err(|e| KeyError::Storage(format!("Encryption error: {:?}", e)))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok((blob, salt.to_vec()))
}

fn decrypt_secret(blob: &[u8], salt: &[u8], password: &str) -> Option<Vec<u8>> {
    if blob.len() < NONCE_LEN {
        return None;
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(&derive_key(password, salt).into());
    cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_lookup() {
        let client = LocalKeyClient::in_memory();
        let address = client.generate("alice", CurveType::Ed25519).unwrap();

        let pk = client.public_key(&address).unwrap();
        assert_eq!(pk.address(), address);
        assert_eq!(client.address_of("alice").unwrap(), Some(address));
    }

    #[test]
    fn test_unknown_address() {
        let client = LocalKeyClient::in_memory();
        let stranger = KeyPair::generate(CurveType::Ed25519).address();
        assert_eq!(
            client.public_key(&stranger).unwrap_err(),
            KeyError::UnknownAddress(stranger)
        );
    }

    #[test]
    fn test_name_reuse_points_at_newest_key() {
        let client = LocalKeyClient::in_memory();
        let first = client.generate("val", CurveType::Ed25519).unwrap();
        let second = client.generate("val", CurveType::Secp256k1).unwrap();

        assert_ne!(first, second);
        assert_eq!(client.address_of("val").unwrap(), Some(second));
        // Old key is still resolvable by address
        assert!(client.public_key(&first).is_ok());
        assert_eq!(client.list().unwrap().len(), 2);
    }

    #[test]
    fn test_keys_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let address = {
            let client = LocalKeyClient::open(dir.path(), None).unwrap();
            client.generate("bob", CurveType::Secp256k1).unwrap()
        };

        let reopened = LocalKeyClient::open(dir.path(), None).unwrap();
        let pk = reopened.public_key(&address).unwrap();
        assert_eq!(pk.curve_type(), CurveType::Secp256k1);
        assert_eq!(reopened.address_of("bob").unwrap(), Some(address));
    }

    #[test]
    fn test_open_ignores_other_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let address = {
            let client = LocalKeyClient::open(dir.path(), None).unwrap();
            client.generate("dave", CurveType::Ed25519).unwrap()
        };
        fs::write(dir.path().join("participants.json"), r#"{"Accounts": []}"#).unwrap();

        let reopened = LocalKeyClient::open(dir.path(), None).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 1);
        assert_eq!(reopened.address_of("dave").unwrap(), Some(address));
    }

    #[test]
    fn test_encrypted_store_needs_right_password() {
        let dir = tempfile::tempdir().unwrap();
        let address = {
            let client = LocalKeyClient::open(dir.path(), Some("hunter22")).unwrap();
            client.generate("carol", CurveType::Ed25519).unwrap()
        };

        let content = fs::read_to_string(dir.path().join(format!("{}.json", address))).unwrap();
        assert!(!content.contains("\"private_key\""));

        assert!(LocalKeyClient::open(dir.path(), Some("hunter22")).is_ok());
        assert_eq!(
            LocalKeyClient::open(dir.path(), Some("wrong")).err(),
            Some(KeyError::Decryption(address))
        );
        assert!(matches!(
            LocalKeyClient::open(dir.path(), None).err(),
            Some(KeyError::Storage(_))
        ));
    }
}
