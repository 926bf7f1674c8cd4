//! Bundle unpacking — gzip-compressed tarballs of agent and protocol
//! packages.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};

/// Unpack a `.tar.gz` bundle into `target_dir`, which must not yet exist.
///
/// # Errors
///
/// Returns an error if the bundle cannot be opened, is not a gzipped
/// tarball, or extraction fails.
pub fn unpack(bundle_path: &Path, target_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(bundle_path)
        .with_context(|| format!("opening bundle {}", bundle_path.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive
        .unpack(target_dir)
        .with_context(|| format!("unpacking bundle into {}", target_dir.display()))?;
    Ok(())
}

/// A bundle's base name with the archive suffix removed, used as the
/// decompression target name. It need not match the package's declared
/// name, but it must be unique among installed packages.
#[must_use]
pub fn bundle_stem(bundle_path: &Path) -> String {
    let name = bundle_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in [".tar.gz", ".tgz", ".tar"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    name
}

/// Compute the SHA-256 hex digest of a file.
///
/// Reads in 64 KB chunks to avoid loading large bundles into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Encode bytes as lowercase hex.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
