use super::emit;
use crate::crypto::{Address, CurveType};
use crate::error::Result;
use crate::keys::{KeyClient, LocalKeyClient};
use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum KeysCommands {
    /// Generate a new keypair in the key store
    Gen {
        #[arg(long)]
        name: String,
        /// ed25519 or secp256k1
        #[arg(long, default_value = "ed25519")]
        curve: CurveType,
    },
    /// Print the public key for an address
    Pubkey {
        #[arg(long)]
        address: Address,
    },
    /// List stored keys
    List,
}

pub fn handle_keys_command(cmd: KeysCommands, keys: &LocalKeyClient) -> Result<()> {
    match cmd {
        KeysCommands::Gen { name, curve } => {
            let address = keys.generate(&name, curve)?;
            emit(&address.to_string(), None)
        }
        KeysCommands::Pubkey { address } => {
            let public_key = keys.public_key(&address)?;
            emit(&serde_json::to_string_pretty(&public_key)?, None)
        }
        KeysCommands::List => emit(&serde_json::to_string_pretty(&keys.list()?)?, None),
    }
}
