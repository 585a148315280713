//! Ingester identity.
//!
//! Every daemon instance carries a stable UUID. It comes from
//! `[general] ingester_uuid` when set; otherwise it is read from
//! `<data_dir>/ingester.uuid`, which is created on first start.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Result;
use uuid::Uuid;

use oslog_core::config::GeneralConfig;

/// File name of the persisted ingester UUID inside `data_dir`.
pub const INGESTER_ID_FILE: &str = "ingester.uuid";

/// Resolve the ingester UUID, generating and persisting one if needed.
///
/// # Errors
///
/// - Configured or persisted UUID does not parse
/// - The UUID file cannot be read or written
pub fn resolve_ingester_id(config: &GeneralConfig) -> Result<Uuid> {
    if !config.ingester_uuid.is_empty() {
        return Uuid::parse_str(&config.ingester_uuid).map_err(|e| {
            anyhow::anyhow!("invalid ingester_uuid '{}': {}", config.ingester_uuid, e)
        });
    }

    let path = id_file_path(&config.data_dir);
    match std::fs::read_to_string(&path) {
        Ok(content) => Uuid::parse_str(content.trim()).map_err(|e| {
            anyhow::anyhow!("corrupt ingester UUID file {}: {}", path.display(), e)
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let id = Uuid::new_v4();
            persist(&path, id)?;
            tracing::info!(ingester_uuid = %id, path = %path.display(), "generated new ingester UUID");
            Ok(id)
        }
        Err(e) => Err(anyhow::anyhow!(
            "failed to read ingester UUID file {}: {}",
            path.display(),
            e
        )),
    }
}

/// Location of the persisted UUID for a data directory.
pub fn id_file_path(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join(INGESTER_ID_FILE)
}

fn persist(path: &Path, id: Uuid) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("failed to create data directory {}: {}", parent.display(), e)
        })?;
    }
    std::fs::write(path, format!("{id}\n"))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))
}
