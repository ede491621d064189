use crate::utils::errors::{CertshipError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CertshipPaths;

const PROJECT_DIR_NAME: &str = ".certship";

impl CertshipPaths {
    /// Get the default project directory: ~/.certship/
    pub fn project_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|dir| dir.join(PROJECT_DIR_NAME))
            .ok_or_else(|| CertshipError::Config("Cannot determine home directory".to_string()))
    }

    /// Create a directory with owner-only permissions if it does not exist
    pub fn ensure_private_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }
}
