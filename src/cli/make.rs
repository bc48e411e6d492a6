use super::emit;
use crate::config::BuilderConfig;
use crate::error::Result;
use crate::keys::LocalKeyClient;
use crate::permission::NamedPermissions;
use crate::spec::{BuildContext, GenesisSpec};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn handle_make(
    spec_path: &Path,
    keys: &LocalKeyClient,
    builder: &BuilderConfig,
    output: Option<&Path>,
) -> Result<()> {
    let spec = GenesisSpec::load(spec_path)?;
    info!(
        "Loaded spec '{}' with {} template(s) from {}",
        spec.chain_name,
        spec.accounts.len(),
        spec_path.display()
    );

    let ctx = BuildContext {
        keys,
        permissions: &NamedPermissions,
        config: builder,
    };
    let participants = spec.participants(&ctx)?;
    info!(
        "Total balance {}, total power {}",
        participants.total_amount(),
        participants.total_power()
    );

    emit(&serde_json::to_string_pretty(&participants)?, output)
}

pub fn handle_merge(spec_paths: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let specs = spec_paths
        .iter()
        .map(GenesisSpec::load)
        .collect::<Result<Vec<_>>>()?;
    let merged = GenesisSpec::merge(&specs);
    info!(
        "Merged {} spec(s) into {} template(s)",
        specs.len(),
        merged.accounts.len()
    );
    emit(&serde_json::to_string_pretty(&merged)?, output)
}
