//! Resolved genesis records. Every field is filled in; these are what a
//! genesis document assembler consumes.

use crate::crypto::{Address, PublicKey};
use crate::permission::{AccountPermissions, BasePermissions};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BasicAccount {
    pub address: Address,
    pub public_key: PublicKey,
    pub amount: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub address: Address,
    pub public_key: PublicKey,
    pub amount: u64,
    pub name: String,
    pub permissions: AccountPermissions,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Validator {
    pub address: Address,
    pub public_key: PublicKey,
    pub amount: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_address: Option<Address>,
    /// Account credited with the stake on unbonding
    pub unbond_to: Vec<BasicAccount>,
}

/// Everything a genesis spec resolves to
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GenesisParticipants {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chain_name: String,
    pub global_permissions: BasePermissions,
    pub accounts: Vec<Account>,
    pub validators: Vec<Validator>,
}

impl GenesisParticipants {
    pub fn total_amount(&self) -> u128 {
        self.accounts.iter().map(|a| a.amount as u128).sum()
    }

    pub fn total_power(&self) -> u128 {
        self.validators.iter().map(|v| v.amount as u128).sum()
    }
}
