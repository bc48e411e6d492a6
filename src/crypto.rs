//! Curves, public keys and the addresses derived from them.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ADDRESS_LENGTH: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Unknown curve type: {0}. Allowed: ed25519, secp256k1")]
    UnknownCurve(String),
    #[error("Invalid {curve} public key: {reason}")]
    InvalidPublicKey { curve: CurveType, reason: String },
    #[error("Invalid address '{0}': expected 20 hex-encoded bytes")]
    InvalidAddress(String),
}

/// Signature scheme a keypair belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurveType {
    #[default]
    Ed25519,
    Secp256k1,
}

impl CurveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveType::Ed25519 => "ed25519",
            CurveType::Secp256k1 => "secp256k1",
        }
    }

    fn public_key_length(&self) -> usize {
        match self {
            CurveType::Ed25519 => ed25519_dalek::PUBLIC_KEY_LENGTH,
            CurveType::Secp256k1 => secp256k1::constants::PUBLIC_KEY_SIZE,
        }
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurveType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ed25519" => Ok(CurveType::Ed25519),
            "secp256k1" => Ok(CurveType::Secp256k1),
            _ => Err(CryptoError::UnknownCurve(s.to_string())),
        }
    }
}

impl Serialize for CurveType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CurveType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A ledger identity: 20 bytes derived from a public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidAddress(hex::encode_upper(bytes)))?;
        Ok(Address(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(trimmed).map_err(|_| CryptoError::InvalidAddress(s.to_string()))?;
        Address::from_bytes(&bytes).map_err(|_| CryptoError::InvalidAddress(s.to_string()))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PublicKeyRepr {
    curve_type: CurveType,
    public_key: String,
}

/// A validated public key tagged with its curve
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyRepr", into = "PublicKeyRepr")]
pub struct PublicKey {
    curve_type: CurveType,
    key: Vec<u8>,
}

impl PublicKey {
    /// Checks that `bytes` encode a point on `curve_type`
    pub fn from_bytes(curve_type: CurveType, bytes: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |reason: String| CryptoError::InvalidPublicKey {
            curve: curve_type,
            reason,
        };
        if bytes.len() != curve_type.public_key_length() {
            return Err(invalid(format!(
                "expected {} bytes, got {}",
                curve_type.public_key_length(),
                bytes.len()
            )));
        }
        match curve_type {
            CurveType::Ed25519 => {
                let mut arr = [0u8; ed25519_dalek::PUBLIC_KEY_LENGTH];
                arr.copy_from_slice(bytes);
                VerifyingKey::from_bytes(&arr).map_err(|e| invalid(e.to_string()))?;
            }
            CurveType::Secp256k1 => {
                secp256k1::PublicKey::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;
            }
        }
        Ok(PublicKey {
            curve_type,
            key: bytes.to_vec(),
        })
    }

    pub fn from_hex(curve_type: CurveType, key_hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(key_hex.trim()).map_err(|e| CryptoError::InvalidPublicKey {
            curve: curve_type,
            reason: e.to_string(),
        })?;
        Self::from_bytes(curve_type, &bytes)
    }

    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.key)
    }

    /// Ed25519 keys hash to the first 20 bytes of SHA-256, secp256k1 keys to
    /// RIPEMD-160 over SHA-256 of the compressed point.
    pub fn address(&self) -> Address {
        let sha = Sha256::digest(&self.key);
        let mut out = [0u8; ADDRESS_LENGTH];
        match self.curve_type {
            CurveType::Ed25519 => out.copy_from_slice(&sha[..ADDRESS_LENGTH]),
            CurveType::Secp256k1 => out.copy_from_slice(&Ripemd160::digest(sha)),
        }
        Address(out)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.curve_type, self.to_hex())
    }
}

impl TryFrom<PublicKeyRepr> for PublicKey {
    type Error = CryptoError;

    fn try_from(repr: PublicKeyRepr) -> Result<Self, Self::Error> {
        PublicKey::from_hex(repr.curve_type, &repr.public_key)
    }
}

impl From<PublicKey> for PublicKeyRepr {
    fn from(pk: PublicKey) -> Self {
        PublicKeyRepr {
            curve_type: pk.curve_type,
            public_key: pk.to_hex(),
        }
    }
}

/// Fresh key material. Only key stores hold on to these.
pub struct KeyPair {
    pub public_key: PublicKey,
    secret: Vec<u8>,
}

impl KeyPair {
    /// Generate a new keypair on `curve_type` using the OS RNG
    pub fn generate(curve_type: CurveType) -> Self {
        match curve_type {
            CurveType::Ed25519 => {
                let mut csprng = OsRng;
                Self::from_ed25519(SigningKey::generate(&mut csprng))
            }
            CurveType::Secp256k1 => {
                let secp = secp256k1::Secp256k1::new();
                let (secret, public) = secp.generate_keypair(&mut secp256k1::rand::thread_rng());
                KeyPair {
                    public_key: PublicKey {
                        curve_type,
                        key: public.serialize().to_vec(),
                    },
                    secret: secret.secret_bytes().to_vec(),
                }
            }
        }
    }

    /// Deterministic ed25519 keypair from a 32 byte seed
    pub fn ed25519_from_seed(seed: &[u8; 32]) -> Self {
        Self::from_ed25519(SigningKey::from_bytes(seed))
    }

    fn from_ed25519(signing_key: SigningKey) -> Self {
        KeyPair {
            public_key: PublicKey {
                curve_type: CurveType::Ed25519,
                key: signing_key.verifying_key().to_bytes().to_vec(),
            },
            secret: signing_key.to_bytes().to_vec(),
        }
    }

    /// Rebuilds a keypair from stored parts, checking they belong together
    pub fn from_parts(public_key: PublicKey, secret: Vec<u8>) -> Result<Self, CryptoError> {
        let mismatch = || CryptoError::InvalidPublicKey {
            curve: public_key.curve_type,
            reason: "does not match stored secret key".to_string(),
        };
        let derived = match public_key.curve_type {
            CurveType::Ed25519 => {
                let seed: [u8; 32] = secret.as_slice().try_into().map_err(|_| mismatch())?;
                SigningKey::from_bytes(&seed).verifying_key().to_bytes().to_vec()
            }
            CurveType::Secp256k1 => {
                let sk = secp256k1::SecretKey::from_slice(&secret).map_err(|_| mismatch())?;
                let secp = secp256k1::Secp256k1::signing_only();
                sk.public_key(&secp).serialize().to_vec()
            }
        };
        if derived != public_key.key {
            return Err(mismatch());
        }
        Ok(KeyPair { public_key, secret })
    }

    pub fn address(&self) -> Address {
        self.public_key.address()
    }

    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ed25519_address_is_truncated_sha256() {
        let pair = KeyPair::ed25519_from_seed(&[7u8; 32]);
        let sha = Sha256::digest(pair.public_key.as_bytes());
        assert_eq!(pair.address().as_bytes(), &sha[..20]);
    }

    #[test]
    fn test_secp256k1_generation_derives_ripemd_address() {
        let pair = KeyPair::generate(CurveType::Secp256k1);
        assert_eq!(pair.public_key.as_bytes().len(), 33);

        let expected = Ripemd160::digest(Sha256::digest(pair.public_key.as_bytes()));
        assert_eq!(pair.address().as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_address_parse_accepts_both_cases_and_prefix() {
        let addr = KeyPair::generate(CurveType::Ed25519).address();
        let upper = addr.to_string();
        assert_eq!(upper.parse::<Address>().unwrap(), addr);
        assert_eq!(upper.to_lowercase().parse::<Address>().unwrap(), addr);
        assert_eq!(format!("0x{}", upper).parse::<Address>().unwrap(), addr);

        assert!("ABCD".parse::<Address>().is_err());
        assert!("not hex at all".parse::<Address>().is_err());
    }

    #[test]
    fn test_public_key_rejects_wrong_length() {
        let err = PublicKey::from_bytes(CurveType::Ed25519, &[1u8; 31]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPublicKey { curve: CurveType::Ed25519, .. }));
        assert!(PublicKey::from_bytes(CurveType::Secp256k1, &[2u8; 32]).is_err());
    }

    #[test]
    fn test_public_key_json_shape() {
        let pk = KeyPair::ed25519_from_seed(&[1u8; 32]).public_key;
        let json = serde_json::to_value(&pk).unwrap();
        assert_eq!(json["CurveType"], "ed25519");
        assert_eq!(json["PublicKey"], pk.to_hex());

        let back: PublicKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn test_from_parts_rejects_foreign_secret() {
        let a = KeyPair::ed25519_from_seed(&[1u8; 32]);
        let b = KeyPair::ed25519_from_seed(&[2u8; 32]);
        assert!(KeyPair::from_parts(a.public_key.clone(), b.secret_bytes().to_vec()).is_err());
        assert!(KeyPair::from_parts(a.public_key.clone(), a.secret_bytes().to_vec()).is_ok());
    }

    #[test]
    fn test_curve_type_parse() {
        assert_eq!("ED25519".parse::<CurveType>().unwrap(), CurveType::Ed25519);
        assert_eq!("secp256k1".parse::<CurveType>().unwrap(), CurveType::Secp256k1);
        assert!("bls".parse::<CurveType>().is_err());
    }
}
