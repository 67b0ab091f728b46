//! SHA-256 sidecar files for distributable artifacts.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the artifact file name.
pub const CHECKSUM_SUFFIX: &str = "sha256";

/// Hex-encoded SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("hashing '{}'", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `<artifact>.sha256` next to `artifact`.
///
/// Format is `<hash>  <filename>` (two spaces) so users can verify with
/// `sha256sum -c` from the artifact's directory.
pub fn write_checksum(artifact: &Path) -> Result<PathBuf> {
    let hash = sha256_file(artifact)?;
    let filename = artifact
        .file_name()
        .context("artifact path has no file name")?
        .to_string_lossy();

    let mut checksum_name = artifact.as_os_str().to_os_string();
    checksum_name.push(".");
    checksum_name.push(CHECKSUM_SUFFIX);
    let checksum_path = PathBuf::from(checksum_name);

    fs::write(&checksum_path, format!("{hash}  {filename}\n"))
        .with_context(|| format!("writing '{}'", checksum_path.display()))?;
    tracing::info!("SHA256 {}...{} {}", &hash[..8], &hash[hash.len() - 8..], filename);
    Ok(checksum_path)
}
