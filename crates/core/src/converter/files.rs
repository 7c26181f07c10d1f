//! Filename handling and output placement.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::ConversionError;

/// Name used when sanitizing leaves nothing behind.
const FALLBACK_NAME: &str = "upload";

/// Reduces an uploaded filename to a safe, flat name.
///
/// Path separators become spaces, whitespace runs become `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped and leading/trailing `.`/`_` are stripped, so
/// the result can never climb out of the directory it is joined onto.
pub fn sanitize_filename(name: &str) -> String {
    let flattened = name.replace(['/', '\\'], " ");

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Swaps the extension of `name` for `extension`.
pub fn output_file_name(name: &str, extension: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_NAME);
    format!("{}.{}", stem, extension)
}

/// Prefix of the per-request directories created under the output directory.
pub const REQUEST_DIR_PREFIX: &str = "out-";

/// Writes a file named `file_name` into a fresh directory under `dir`.
///
/// Every call gets its own directory, so two requests deriving the same name
/// never touch each other's output. The directory is removed again if `write`
/// fails. Returns the final path and its size.
pub fn write_output<F>(
    dir: &Path,
    file_name: &str,
    write: F,
) -> Result<(PathBuf, u64), ConversionError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    fs::create_dir_all(dir).map_err(|e| ConversionError::from_io(e, dir))?;

    let request_dir = tempfile::Builder::new()
        .prefix(REQUEST_DIR_PREFIX)
        .tempdir_in(dir)
        .map_err(|e| ConversionError::from_io(e, dir))?;

    let target = request_dir.path().join(file_name);
    let mut file = File::create(&target).map_err(|e| ConversionError::from_io(e, &target))?;
    write(&mut file).map_err(|e| ConversionError::from_io(e, &target))?;
    file.flush().map_err(|e| ConversionError::from_io(e, &target))?;

    let size = file
        .metadata()
        .map_err(|e| ConversionError::from_io(e, &target))?
        .len();

    let _ = request_dir.keep();
    Ok((target, size))
}

/// Whether `path` sits in a directory created by [`write_output`].
pub fn in_request_dir(path: &Path) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(REQUEST_DIR_PREFIX))
}
