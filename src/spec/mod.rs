//! Genesis specs: the hand-written documents listing participant templates
//!
//! A spec is resolved into [`GenesisParticipants`] by building every template
//! into an account, and additionally into a validator when it carries a
//! `Power`. Building stops at the first template that fails.

mod identity;
mod template;

pub use identity::ResolvedIdentity;
pub use template::{BuildContext, TemplateAccount, NODE_KEY_PREFIX};

use crate::error::{GenesisError, Result};
use crate::genesis::GenesisParticipants;
use crate::permission::BasePermissions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct GenesisSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_permissions: Option<Vec<String>>,
    #[serde(default)]
    pub accounts: Vec<TemplateAccount>,
}

impl GenesisSpec {
    /// Read a spec from TOML (by `.toml` extension) or JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content)
                .map_err(|e| GenesisError::Serialization(format!("{}: {}", path.display(), e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| GenesisError::Serialization(format!("{}: {}", path.display(), e)))
        }
    }

    /// Fold several specs into one. Later chain names win; templates that
    /// share a non-empty name collapse into the first one's slot.
    pub fn merge(specs: &[GenesisSpec]) -> GenesisSpec {
        let mut merged = GenesisSpec::default();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for spec in specs {
            if !spec.chain_name.is_empty() {
                merged.chain_name = spec.chain_name.clone();
            }
            if let Some(globals) = &spec.global_permissions {
                let target = merged.global_permissions.get_or_insert_with(Vec::new);
                union_into(target, globals);
            }
            for template in &spec.accounts {
                if template.name.is_empty() {
                    merged.accounts.push(template.clone());
                    continue;
                }
                match slots.get(&template.name) {
                    Some(&slot) => merge_template(&mut merged.accounts[slot], template),
                    None => {
                        slots.insert(template.name.clone(), merged.accounts.len());
                        merged.accounts.push(template.clone());
                    }
                }
            }
        }
        merged
    }

    pub fn participants(&self, ctx: &BuildContext<'_>) -> Result<GenesisParticipants> {
        let global_permissions = match &self.global_permissions {
            None => BasePermissions::DEFAULT,
            Some(names) => ctx.permissions.translate(names)?,
        };

        let mut accounts = Vec::with_capacity(self.accounts.len());
        let mut validators = Vec::new();
        for (index, template) in self.accounts.iter().enumerate() {
            let account = template.account(ctx, index)?;
            if template.power.is_some() {
                // Bond the identity the account already resolved to
                let pinned = TemplateAccount {
                    address: Some(account.address),
                    public_key: Some(account.public_key.clone()),
                    ..template.clone()
                };
                validators.push(pinned.validator(ctx, index)?);
            }
            accounts.push(account);
            debug!("Resolved template {} ('{}')", index, template.name);
        }
        info!(
            "Resolved {} account(s) and {} validator(s) for chain '{}'",
            accounts.len(),
            validators.len(),
            self.chain_name
        );

        Ok(GenesisParticipants {
            chain_name: self.chain_name.clone(),
            global_permissions,
            accounts,
            validators,
        })
    }
}

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

fn merge_template(base: &mut TemplateAccount, other: &TemplateAccount) {
    if other.address.is_some() {
        base.address = other.address;
    }
    if other.node_address.is_some() {
        base.node_address = other.node_address;
    }
    if other.public_key.is_some() {
        base.public_key = other.public_key.clone();
    }
    if other.amount.is_some() {
        base.amount = other.amount;
    }
    if other.power.is_some() {
        base.power = other.power;
    }
    if let Some(perms) = &other.permissions {
        union_into(base.permissions.get_or_insert_with(Vec::new), perms);
    }
    union_into(&mut base.roles, &other.roles);
}
