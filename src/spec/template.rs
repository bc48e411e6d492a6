use crate::config::BuilderConfig;
use crate::crypto::{Address, CurveType, PublicKey};
use crate::error::Result;
use crate::genesis::{Account, BasicAccount, Validator};
use crate::keys::KeyClient;
use crate::permission::{AccountPermissions, PermissionTranslator};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NODE_KEY_PREFIX: &str = "nodekey-";

/// A partial description of a participant. Anything left out is filled in
/// when the template is built into an account or validator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateAccount {
    /// Templates sharing a name are merged when specs are merged
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u64>,
    /// `None` means default permissions; `Some(vec![])` means none at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// Collaborators and defaults shared by every template in one build
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub keys: &'a dyn KeyClient,
    pub permissions: &'a dyn PermissionTranslator,
    pub config: &'a BuilderConfig,
}

impl TemplateAccount {
    pub fn account(&self, ctx: &BuildContext<'_>, index: usize) -> Result<Account> {
        let (public_key, address) = self
            .realise_identity(ctx.keys, ctx.config.default_curve)?
            .into_parts();

        let amount = self.amount.unwrap_or_else(|| {
            debug!("Account {} has no amount, using default", index);
            ctx.config.default_amount
        });
        let name = if self.name.is_empty() {
            ctx.config.account_name(index)
        } else {
            self.name.clone()
        };
        let permissions = self.account_permissions(ctx.permissions)?;

        Ok(Account {
            address,
            public_key,
            amount,
            name,
            permissions,
        })
    }

    /// The default account permissions when the list is absent, otherwise
    /// the translated list together with the template's roles.
    pub fn account_permissions(
        &self,
        translator: &dyn PermissionTranslator,
    ) -> Result<AccountPermissions> {
        match &self.permissions {
            None => Ok(AccountPermissions::default_account()),
            Some(names) => Ok(AccountPermissions {
                base: translator.translate(names)?,
                roles: self.roles.clone(),
            }),
        }
    }

    pub fn validator(&self, ctx: &BuildContext<'_>, index: usize) -> Result<Validator> {
        let (public_key, address) = self
            .realise_identity(ctx.keys, ctx.config.default_curve)?
            .into_parts();

        let node_address = match self.node_address {
            None if ctx.config.generate_node_keys => {
                let node_key_name = format!("{}{}", NODE_KEY_PREFIX, self.name);
                let generated = ctx.keys.generate(&node_key_name, CurveType::Ed25519)?;
                debug!("Generated node key '{}': {}", node_key_name, generated);
                Some(generated)
            }
            other => other,
        };

        let amount = self.power.unwrap_or_else(|| {
            debug!("Validator {} has no power, using default", index);
            ctx.config.default_power
        });
        let name = if self.name.is_empty() {
            ctx.config.validator_name(index)
        } else {
            self.name.clone()
        };

        Ok(Validator {
            unbond_to: vec![BasicAccount {
                address,
                public_key: public_key.clone(),
                amount,
            }],
            address,
            public_key,
            amount,
            name,
            node_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_AMOUNT, DEFAULT_POWER};
    use crate::error::GenesisError;
    use crate::keys::{KeyError, MockKeyClient};
    use crate::permission::{BasePermissions, NamedPermissions, PermFlag, PermissionError};

    fn build<T>(
        config: &BuilderConfig,
        keys: &MockKeyClient,
        f: impl FnOnce(&BuildContext<'_>) -> T,
    ) -> T {
        let ctx = BuildContext {
            keys,
            permissions: &NamedPermissions,
            config,
        };
        f(&ctx)
    }

    fn named(name: &str) -> TemplateAccount {
        TemplateAccount {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_account_defaults() {
        let keys = MockKeyClient::new();
        let account = build(&BuilderConfig::default(), &keys, |ctx| {
            TemplateAccount::default().account(ctx, 4)
        })
        .unwrap();

        assert_eq!(account.amount, DEFAULT_AMOUNT);
        assert_eq!(account.name, "Account_4");
        assert_eq!(account.permissions, AccountPermissions::default_account());
        assert_eq!(account.public_key.address(), account.address);
    }

    #[test]
    fn test_account_keeps_explicit_fields() {
        let keys = MockKeyClient::new();
        let template = TemplateAccount {
            name: "treasury".to_string(),
            amount: Some(7),
            permissions: Some(vec!["root".to_string()]),
            roles: vec!["auditor".to_string()],
            ..Default::default()
        };
        let account = build(&BuilderConfig::default(), &keys, |ctx| template.account(ctx, 0)).unwrap();

        assert_eq!(account.amount, 7);
        assert_eq!(account.name, "treasury");
        assert!(account.permissions.base.has(PermFlag::ROOT));
        assert!(!account.permissions.base.has(PermFlag::SEND));
        assert_eq!(account.permissions.roles, vec!["auditor".to_string()]);
    }

    #[test]
    fn test_unnamed_accounts_get_distinct_names() {
        let keys = MockKeyClient::new();
        let config = BuilderConfig::default();
        let (a, b) = build(&config, &keys, |ctx| {
            (
                TemplateAccount::default().account(ctx, 0).unwrap(),
                TemplateAccount::default().account(ctx, 1).unwrap(),
            )
        });
        assert_eq!(a.name, "Account_0");
        assert_eq!(b.name, "Account_1");
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_empty_permission_list_is_not_default() {
        let keys = MockKeyClient::new();
        let template = TemplateAccount {
            permissions: Some(Vec::new()),
            ..named("locked")
        };
        let account = build(&BuilderConfig::default(), &keys, |ctx| template.account(ctx, 0)).unwrap();
        assert_eq!(account.permissions.base, BasePermissions::ZERO);
    }

    #[test]
    fn test_absent_permissions_give_defaults_even_with_roles() {
        let keys = MockKeyClient::new();
        let template = TemplateAccount {
            roles: vec!["ops".to_string()],
            ..named("operator")
        };
        let account = build(&BuilderConfig::default(), &keys, |ctx| template.account(ctx, 0)).unwrap();
        assert_eq!(account.permissions, AccountPermissions::default_account());
    }

    #[test]
    fn test_unknown_permission_yields_no_account() {
        let keys = MockKeyClient::new();
        let template = TemplateAccount {
            permissions: Some(vec!["unknownPerm".to_string()]),
            ..named("bad")
        };
        let err = build(&BuilderConfig::default(), &keys, |ctx| template.account(ctx, 0)).unwrap_err();
        assert!(matches!(
            err,
            GenesisError::Permission(PermissionError::UnknownName(ref n)) if n == "unknownPerm"
        ));
    }

    #[test]
    fn test_validator_defaults_and_unbond_mirror() {
        let keys = MockKeyClient::new();
        let validator = build(&BuilderConfig::default(), &keys, |ctx| {
            TemplateAccount::default().validator(ctx, 2)
        })
        .unwrap();

        assert_eq!(validator.amount, DEFAULT_POWER);
        assert_eq!(validator.name, "Validator_2");
        assert_eq!(validator.node_address, None);
        assert_eq!(
            validator.unbond_to,
            vec![BasicAccount {
                address: validator.address,
                public_key: validator.public_key.clone(),
                amount: validator.amount,
            }]
        );
    }

    #[test]
    fn test_validator_power_and_supplied_node_address() {
        let keys = MockKeyClient::new();
        let node = MockKeyClient::canned_key("node").address();
        let template = TemplateAccount {
            power: Some(100),
            node_address: Some(node),
            ..named("val")
        };
        let config = BuilderConfig {
            generate_node_keys: true,
            ..BuilderConfig::default()
        };
        let validator = build(&config, &keys, |ctx| template.validator(ctx, 0)).unwrap();

        assert_eq!(validator.amount, 100);
        assert_eq!(validator.unbond_to[0].amount, 100);
        assert_eq!(validator.node_address, Some(node));
        // Only the identity key was generated
        assert_eq!(keys.generate_calls(), 1);
    }

    #[test]
    fn test_validator_node_key_generation() {
        let keys = MockKeyClient::new();
        let config = BuilderConfig {
            generate_node_keys: true,
            ..BuilderConfig::default()
        };
        let template = named("val");
        let validator = build(&config, &keys, |ctx| template.validator(ctx, 0)).unwrap();

        assert_eq!(keys.generate_calls(), 2);
        let node = validator.node_address.unwrap();
        assert_ne!(node, validator.address);
        // The mock derives keys from name and call count
        let expected = MockKeyClient::canned_key(&format!("{}val/1", NODE_KEY_PREFIX)).address();
        assert_eq!(node, expected);
        // Input is untouched
        assert_eq!(template.node_address, None);
    }

    #[test]
    fn test_node_key_failure_is_fatal() {
        let pk = MockKeyClient::canned_key("val");
        let keys = MockKeyClient::failing_generate();
        let config = BuilderConfig {
            generate_node_keys: true,
            ..BuilderConfig::default()
        };
        let template = TemplateAccount {
            public_key: Some(pk),
            ..named("val")
        };
        let err = build(&config, &keys, |ctx| template.validator(ctx, 0)).unwrap_err();
        assert!(matches!(err, GenesisError::KeyService(KeyError::Generation { .. })));
    }

    #[test]
    fn test_validator_rejects_mismatched_identity() {
        let pk = MockKeyClient::canned_key("val");
        let claimed = MockKeyClient::canned_key("other").address();
        let template = TemplateAccount {
            public_key: Some(pk.clone()),
            address: Some(claimed),
            power: Some(10),
            ..named("val")
        };
        let keys = MockKeyClient::new();
        let err = build(&BuilderConfig::default(), &keys, |ctx| template.validator(ctx, 0)).unwrap_err();

        match err {
            GenesisError::IdentityMismatch { template, derived } => {
                assert_eq!(template, claimed);
                assert_eq!(derived, pk.address());
            }
            other => panic!("expected identity mismatch, got {:?}", other),
        }
        assert_eq!(keys.generate_calls(), 0);
    }

    #[test]
    fn test_template_json_preserves_absent_vs_empty_permissions() {
        let absent: TemplateAccount = serde_json::from_str(r#"{"Name": "a"}"#).unwrap();
        assert_eq!(absent.permissions, None);

        let empty: TemplateAccount =
            serde_json::from_str(r#"{"Name": "a", "Permissions": []}"#).unwrap();
        assert_eq!(empty.permissions, Some(Vec::new()));

        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["Permissions"], serde_json::json!([]));
        assert!(json.get("Address").is_none());
        assert!(serde_json::to_value(&absent).unwrap().get("Permissions").is_none());
    }
}
