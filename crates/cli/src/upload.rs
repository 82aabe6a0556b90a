use anyhow::{bail, Context, Result};
use lanshare_core::models::UploadedFile;
use std::path::Path;

/// Describes a local file the way a browser upload would: name, byte size
/// and an extension-derived type.
pub fn uploaded_file(path: &Path) -> Result<UploadedFile> {
    let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());
    Ok(UploadedFile {
        name,
        size: meta.len(),
        mime,
    })
}
