//! Command implementations, kept free of argument parsing.

use anyhow::{Context, Result};
use qc_channel_config::domain::{consenters, edit_consensus_metadata, ChangeKind};
use qc_channel_config::{compute_update as diff, ConfigTree, ConfigUpdate, ConsensusMetadataMutation, Consenter};
use std::fs;
use std::path::Path;
use tracing::info;

pub fn read_tree(path: &Path) -> Result<ConfigTree> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config tree {}", path.display()))
}

pub fn write_tree(path: &Path, tree: &ConfigTree) -> Result<()> {
    let text = serde_json::to_string_pretty(tree)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Writes the encoded update and returns a one-line summary.
pub fn compute_update(original: &Path, updated: &Path, output: &Path) -> Result<String> {
    let current = read_tree(original)?;
    let desired = read_tree(updated)?;
    let update = diff(&current, &desired)?;
    let bytes = update.to_bytes()?;
    fs::write(output, &bytes).with_context(|| format!("writing {}", output.display()))?;

    let changes = update.changes();
    info!(namespace = %update.namespace, changes = changes.len(), bytes = bytes.len(), "update written");
    if update.is_noop() {
        Ok("no changes".to_string())
    } else {
        let deleted = changes.iter().filter(|c| c.kind == ChangeKind::Deleted).count();
        Ok(format!(
            "{} change(s), {} deletion(s), {} bytes",
            changes.len(),
            deleted,
            bytes.len()
        ))
    }
}

pub fn decode_update(input: &Path) -> Result<String> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let update = ConfigUpdate::from_bytes(&bytes)?;
    Ok(serde_json::to_string_pretty(&update)?)
}

pub fn list_consenters(config: &Path) -> Result<Vec<String>> {
    let tree = read_tree(config)?;
    Ok(consenters(&tree)?
        .iter()
        .map(|c| format!("{} (client cert {} bytes)", c.endpoint(), c.client_tls_cert.len()))
        .collect())
}

pub fn add_consenter(
    config: &Path,
    host: String,
    port: u16,
    client_cert: &Path,
    server_cert: &Path,
    output: &Path,
) -> Result<()> {
    let tree = read_tree(config)?;
    let consenter = Consenter::new(
        host,
        port,
        fs::read(client_cert).with_context(|| format!("reading {}", client_cert.display()))?,
        fs::read(server_cert).with_context(|| format!("reading {}", server_cert.display()))?,
    );
    let edited = edit_consensus_metadata(&tree, &ConsensusMetadataMutation::AddConsenter(consenter))?;
    write_tree(output, &edited)
}

/// Returns how many consenters were removed.
pub fn remove_consenter(config: &Path, cert: &Path, output: &Path) -> Result<usize> {
    let tree = read_tree(config)?;
    let certificate = fs::read(cert).with_context(|| format!("reading {}", cert.display()))?;
    let before = consenters(&tree)?.len();
    let edited = edit_consensus_metadata(&tree, &ConsensusMetadataMutation::RemoveConsenter { certificate })?;
    let after = consenters(&edited)?.len();
    write_tree(output, &edited)?;
    Ok(before - after)
}
