//! Logo path lookup.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Find the logo file.
///
/// `override_logo` takes precedence over the specification's `logo_path`.
/// An absolute path is used as is. A relative one is tried against the
/// working directory, the specification's directory and that directory's
/// parent, in that order.
pub fn resolve_logo_path(
    spec_path: &Path,
    logo_path: &str,
    override_logo: Option<&str>,
    working_dir: &Path,
) -> CoreResult<PathBuf> {
    let requested = override_logo.unwrap_or(logo_path);
    let candidate = Path::new(requested);

    let mut checked = Vec::new();
    if candidate.is_absolute() {
        checked.push(candidate.to_path_buf());
    } else {
        checked.push(working_dir.join(candidate));
        if let Some(spec_dir) = spec_path.parent() {
            checked.push(spec_dir.join(candidate));
            if let Some(parent) = spec_dir.parent() {
                checked.push(parent.join(candidate));
            }
        }
    }

    for path in &checked {
        debug!("Looking for logo at {:?}", path);
        if path.is_file() {
            return Ok(fs::canonicalize(path).unwrap_or_else(|_| path.clone()));
        }
    }

    Err(CoreError::LogoNotFound {
        requested: requested.to_string(),
        checked,
    })
}
