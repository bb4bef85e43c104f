use docpress_core::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copy the public directory verbatim into the output directory.
///
/// Returns the number of files copied. A missing public directory copies
/// nothing.
pub fn copy_public_dir(public_dir: &Path, out_dir: &Path) -> Result<usize> {
    if !public_dir.exists() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(public_dir).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(public_dir)
            .unwrap_or(entry.path());
        let dst = out_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dst)?;
            copied += 1;
        }
    }

    tracing::debug!(copied, from = %public_dir.display(), "Copied public assets");
    Ok(copied)
}
