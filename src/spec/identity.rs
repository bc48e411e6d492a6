//! Reconciling a template's claimed public key and address

use super::TemplateAccount;
use crate::crypto::{Address, CurveType, PublicKey};
use crate::error::{GenesisError, Result};
use crate::keys::{KeyClient, KeyError};
use tracing::debug;

/// A public key and the address derived from it. There is no way to build
/// one whose address disagrees with its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    public_key: PublicKey,
    address: Address,
}

impl ResolvedIdentity {
    pub fn from_public_key(public_key: PublicKey) -> Self {
        let address = public_key.address();
        Self { public_key, address }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn into_parts(self) -> (PublicKey, Address) {
        (self.public_key, self.address)
    }
}

impl TemplateAccount {
    /// Settle on a (public key, address) pair for this template.
    ///
    /// With neither field set a keypair is generated under the template name,
    /// which is the only case that changes key store state. An address alone
    /// is looked up; a public key alone is trusted and its address derived.
    /// When both are given they must agree.
    pub fn realise_identity(
        &self,
        keys: &dyn KeyClient,
        curve_type: CurveType,
    ) -> Result<ResolvedIdentity> {
        match (&self.public_key, self.address) {
            (None, None) => {
                let address = keys.generate(&self.name, curve_type)?;
                debug!("Generated {} key for '{}': {}", curve_type, self.name, address);
                fetch_identity(keys, address)
            }
            (None, Some(address)) => fetch_identity(keys, address),
            (Some(public_key), None) => Ok(ResolvedIdentity::from_public_key(public_key.clone())),
            (Some(public_key), Some(address)) => {
                let identity = ResolvedIdentity::from_public_key(public_key.clone());
                if identity.address() != address {
                    return Err(GenesisError::IdentityMismatch {
                        template: address,
                        derived: identity.address(),
                    });
                }
                Ok(identity)
            }
        }
    }
}

fn fetch_identity(keys: &dyn KeyClient, address: Address) -> Result<ResolvedIdentity> {
    let identity = ResolvedIdentity::from_public_key(keys.public_key(&address)?);
    if identity.address() != address {
        return Err(KeyError::InconsistentKey {
            address,
            derived: identity.address(),
        }
        .into());
    }
    Ok(identity)
}
