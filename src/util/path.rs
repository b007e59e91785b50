use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::infrastructure::{InfraError, InfraResult};

pub trait PathExt {
    fn is_scenario_file(&self) -> bool;
    fn to_canonical(&self) -> InfraResult<PathBuf>;
    fn to_string_lossy_cached(&self) -> String;
}

impl PathExt for Path {
    fn is_scenario_file(&self) -> bool {
        self.extension() == Some(OsStr::new("toml"))
    }

    fn to_canonical(&self) -> InfraResult<PathBuf> {
        self.canonicalize().map_err(|e| InfraError::PathResolution {
            path: self.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn to_string_lossy_cached(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

pub fn ensure_file_exists(path: &Path) -> InfraResult<()> {
    if !path.exists() {
        Err(InfraError::FileNotFound(path.to_path_buf()))
    } else if !path.is_file() {
        Err(InfraError::PathResolution {
            path: path.to_path_buf(),
            reason: "Not a file".to_string(),
        })
    } else {
        Ok(())
    }
}

pub fn get_relative_path(from: &Path, to: &Path) -> InfraResult<PathBuf> {
    pathdiff::diff_paths(to, from).ok_or_else(|| InfraError::PathResolution {
        path: to.to_path_buf(),
        reason: "Could not compute relative path".to_string(),
    })
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
///
/// Uses shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
