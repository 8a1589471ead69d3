use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::model::RepositoryRecord;

/// Randomize presentation order so no repository is always listed first.
pub fn shuffle_records(records: &mut [RepositoryRecord]) {
    shuffle_records_with(records, &mut rand::rng());
}

pub fn shuffle_records_with<R: Rng + ?Sized>(records: &mut [RepositoryRecord], rng: &mut R) {
    records.shuffle(rng);
}

/// Replace the snapshot at `path` with `records` as a JSON array.
///
/// The data is written to a temporary file next to `path` and renamed over it,
/// so readers see either the previous snapshot or the complete new one. The
/// replacement keeps the permissions of the file it replaces; a new file is
/// world-readable.
pub fn write_snapshot(path: &Path, records: &[RepositoryRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, records).context("failed to serialize snapshot")?;
        writer.flush()?;
    }
    if let Some(permissions) = snapshot_permissions(path) {
        tmp.as_file()
            .set_permissions(permissions)
            .context("failed to set snapshot permissions")?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

// Temporary files are created owner-only.
fn snapshot_permissions(path: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Some(meta.permissions());
    }
    default_permissions()
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
