//! Account permissions and the translation of permission names into flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[serde(transparent)]
    pub struct PermFlag: u64 {
        const ROOT = 1 << 0;
        const SEND = 1 << 1;
        const CALL = 1 << 2;
        const CREATE_CONTRACT = 1 << 3;
        const CREATE_ACCOUNT = 1 << 4;
        const BOND = 1 << 5;
        const NAME = 1 << 6;
        const PROPOSAL = 1 << 7;
        const INPUT = 1 << 8;
        const BATCH = 1 << 9;
        const IDENTIFY = 1 << 10;
        const HAS_BASE = 1 << 11;
        const SET_BASE = 1 << 12;
        const UNSET_BASE = 1 << 13;
        const SET_GLOBAL = 1 << 14;
        const HAS_ROLE = 1 << 15;
        const ADD_ROLE = 1 << 16;
        const REMOVE_ROLE = 1 << 17;
    }
}

/// What an ordinary account may do unless told otherwise
pub const DEFAULT_PERM_FLAGS: PermFlag = PermFlag::SEND
    .union(PermFlag::CALL)
    .union(PermFlag::CREATE_CONTRACT)
    .union(PermFlag::CREATE_ACCOUNT)
    .union(PermFlag::BOND)
    .union(PermFlag::NAME)
    .union(PermFlag::HAS_BASE)
    .union(PermFlag::HAS_ROLE)
    .union(PermFlag::PROPOSAL)
    .union(PermFlag::INPUT)
    .union(PermFlag::BATCH);

impl PermFlag {
    /// Flag for a single permission name. `all` selects every flag.
    pub fn from_permission_name(name: &str) -> Option<PermFlag> {
        let flag = match name {
            "root" => PermFlag::ROOT,
            "send" => PermFlag::SEND,
            "call" => PermFlag::CALL,
            "createContract" => PermFlag::CREATE_CONTRACT,
            "createAccount" => PermFlag::CREATE_ACCOUNT,
            "bond" => PermFlag::BOND,
            "name" => PermFlag::NAME,
            "proposal" => PermFlag::PROPOSAL,
            "input" => PermFlag::INPUT,
            "batch" => PermFlag::BATCH,
            "identify" => PermFlag::IDENTIFY,
            "hasBase" => PermFlag::HAS_BASE,
            "setBase" => PermFlag::SET_BASE,
            "unsetBase" => PermFlag::UNSET_BASE,
            "setGlobal" => PermFlag::SET_GLOBAL,
            "hasRole" => PermFlag::HAS_ROLE,
            "addRole" => PermFlag::ADD_ROLE,
            "removeRole" => PermFlag::REMOVE_ROLE,
            "all" => PermFlag::all(),
            _ => return None,
        };
        Some(flag)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Unknown permission name '{0}'")]
    UnknownName(String),
}

/// `perms` holds granted flags, `set_bit` marks which flags are decided at
/// this level at all (unset flags fall through to global permissions).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct BasePermissions {
    pub perms: PermFlag,
    pub set_bit: PermFlag,
}

impl BasePermissions {
    pub const ZERO: BasePermissions = BasePermissions {
        perms: PermFlag::empty(),
        set_bit: PermFlag::empty(),
    };

    pub const DEFAULT: BasePermissions = BasePermissions {
        perms: DEFAULT_PERM_FLAGS,
        set_bit: DEFAULT_PERM_FLAGS,
    };

    pub fn has(&self, flag: PermFlag) -> bool {
        self.set_bit.contains(flag) && self.perms.contains(flag)
    }

    pub fn set(&mut self, flag: PermFlag, value: bool) {
        self.set_bit.insert(flag);
        self.perms.set(flag, value);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct AccountPermissions {
    pub base: BasePermissions,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AccountPermissions {
    pub fn default_account() -> Self {
        AccountPermissions {
            base: BasePermissions::DEFAULT,
            roles: Vec::new(),
        }
    }
}

pub trait PermissionTranslator: Send + Sync {
    /// Fails on the first name it does not recognise
    fn translate(&self, names: &[String]) -> Result<BasePermissions, PermissionError>;
}

/// Translates the standard permission names (`send`, `createAccount`, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedPermissions;

impl PermissionTranslator for NamedPermissions {
    fn translate(&self, names: &[String]) -> Result<BasePermissions, PermissionError> {
        let mut base = BasePermissions::ZERO;
        for name in names {
            let flag = PermFlag::from_permission_name(name)
                .ok_or_else(|| PermissionError::UnknownName(name.clone()))?;
            base.set(flag, true);
        }
        Ok(base)
    }
}
