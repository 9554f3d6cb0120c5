//! Filesystem infrastructure — implements `TemplateStore` and
//! `CodeFingerprinter`.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::application::ports::{CodeFingerprinter, TemplateStore};

/// Production filesystem implementation of the template and asset ports.
pub struct LocalFs;

impl TemplateStore for LocalFs {
    fn write(&self, dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let target = dir.join(file_name);

        // Same directory as the target so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(contents.as_bytes())
            .with_context(|| format!("writing {}", tmp.path().display()))?;
        tmp.as_file().sync_all().context("flushing template")?;
        tmp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("renaming into {}", target.display()))?;

        tracing::debug!(path = %target.display(), "template persisted");
        Ok(target)
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }
}

impl CodeFingerprinter for LocalFs {
    fn fingerprint(&self, dir: &Path) -> Result<Option<String>> {
        if !dir.is_dir() {
            return Ok(None);
        }
        fingerprint_dir(dir).map(Some)
    }
}

/// SHA-256 over every regular file under `dir`: for each file in sorted
/// relative-path order, the path, a NUL, the content length and the content.
/// Symlinks are not followed and do not contribute.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked or a file read.
pub fn fingerprint_dir(dir: &Path) -> Result<String> {
    let mut files = collect_files(dir)?;
    files.sort();

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    for rel in &files {
        let path = dir.join(rel);
        let len = std::fs::metadata(&path)
            .with_context(|| format!("reading metadata of {}", path.display()))?
            .len();
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        hasher.update(len.to_be_bytes());

        let mut file =
            std::fs::File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        loop {
            let n = file.read(&mut buf).context("reading file")?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    }
    tracing::debug!(dir = %dir.display(), files = files.len(), "code directory fingerprinted");
    Ok(hex::encode(hasher.finalize()))
}

/// Relative paths with `/` separators, independent of the host platform.
fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking directory {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        out.push(parts.join("/"));
    }
    Ok(out)
}
