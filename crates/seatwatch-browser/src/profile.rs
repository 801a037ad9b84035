use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Owns the Chrome user-data directory for one run.
///
/// A temporary profile keeps runs independent of each other and of the
/// operator's own browser state; a named profile persists cookies between
/// runs, which the target form sometimes rewards with fewer interstitials.
pub struct ProfileManager {
    path: PathBuf,
    is_temporary: bool,
}

impl ProfileManager {
    /// Create a throwaway profile, deleted when this manager drops.
    pub fn temporary() -> Result<Self> {
        let temp_dir = tempfile::tempdir().map_err(Error::Io)?;
        let path = temp_dir.keep();

        Ok(Self {
            path,
            is_temporary: true,
        })
    }

    /// Use (and create if needed) a persistent profile at the given path.
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(Error::Io)?;
        }

        Ok(Self {
            path,
            is_temporary: false,
        })
    }

    /// A persistent profile under `~/.seatwatch/profiles/<name>`.
    pub fn named(name: &str) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Launch("No home directory for a named profile".to_string()))?;
        Self::persistent(home.join(".seatwatch").join("profiles").join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

impl Drop for ProfileManager {
    fn drop(&mut self) {
        if self.is_temporary && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_profile_cleans_up_on_drop() {
        let profile = ProfileManager::temporary().unwrap();
        let path = profile.path().to_path_buf();

        assert!(path.is_dir());
        assert!(profile.is_temporary());

        drop(profile);
        assert!(!path.exists());
    }

    #[test]
    fn test_persistent_profile_survives_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("watch-profile");

        let profile = ProfileManager::persistent(profile_path.clone()).unwrap();
        assert!(profile_path.is_dir());
        assert!(!profile.is_temporary());

        drop(profile);
        assert!(profile_path.exists());
    }

    #[test]
    fn test_persistent_profile_creates_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile_path = temp_dir.path().join("fresh");
        assert!(!profile_path.exists());

        let _profile = ProfileManager::persistent(profile_path.clone()).unwrap();
        assert!(profile_path.is_dir());
    }
}
