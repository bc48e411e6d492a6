pub mod keys;
pub mod make;

use crate::config::GenesisConfig;
use crate::error::{GenesisError, Result};
use crate::keys::LocalKeyClient;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "genesis-spec")]
#[command(about = "Resolve genesis spec templates into accounts and validators", long_about = None)]
pub struct Cli {
    /// Builder and key store configuration (TOML)
    #[arg(long, global = true, default_value = "genesis.toml")]
    pub config: PathBuf,

    /// Key store directory, overriding the config file
    #[arg(long, global = true)]
    pub keys_dir: Option<PathBuf>,

    /// Password protecting private keys in the key store
    #[arg(long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a genesis spec into accounts and validators
    Make {
        /// Spec file (.toml or .json)
        #[arg(long)]
        spec: PathBuf,
        /// Generate a node key for validators without a NodeAddress
        #[arg(long)]
        generate_node_keys: bool,
        /// Write the result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Merge several genesis specs into one
    Merge {
        #[arg(required = true)]
        specs: Vec<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Key store management
    Keys {
        #[command(subcommand)]
        cmd: keys::KeysCommands,
    },
}

/// Run a parsed command against an already loaded config
pub fn run(cli: Cli, config: GenesisConfig) -> Result<()> {
    let keys_dir = cli.keys_dir.clone().or_else(|| config.keys.dir.clone());
    let password = cli.password.as_deref();

    match cli.command {
        Commands::Make {
            spec,
            generate_node_keys,
            output,
        } => {
            let keys = open_key_store(keys_dir.as_deref(), password)?;
            let mut builder = config.builder;
            builder.generate_node_keys |= generate_node_keys;
            make::handle_make(&spec, &keys, &builder, output.as_deref())
        }
        Commands::Merge { specs, output } => make::handle_merge(&specs, output.as_deref()),
        Commands::Keys { cmd } => {
            let dir = keys_dir.ok_or_else(|| {
                GenesisError::Config("key commands need --keys-dir or [keys] dir".to_string())
            })?;
            let keys = LocalKeyClient::open(&dir, password)?;
            keys::handle_keys_command(cmd, &keys)
        }
    }
}

/// Without a directory, generated keys only live for this run
fn open_key_store(dir: Option<&Path>, password: Option<&str>) -> Result<LocalKeyClient> {
    match dir {
        Some(dir) => Ok(LocalKeyClient::open(dir, password)?),
        None => {
            tracing::warn!("No key store directory configured; generated keys will not be saved");
            Ok(LocalKeyClient::in_memory())
        }
    }
}

/// Print to stdout, or write to `output` when given
pub(crate) fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
