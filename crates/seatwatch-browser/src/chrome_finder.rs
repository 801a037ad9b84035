use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Locates a Chrome or Chromium binary on the system.
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// Find a usable browser binary. A custom path short-circuits the search
    /// and must be valid; otherwise the platform defaults are tried, then a
    /// PATH lookup.
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.custom_path {
            return validate_executable(path);
        }

        for path in Self::default_paths() {
            if let Ok(valid) = validate_executable(&path) {
                return Ok(valid);
            }
        }

        for name in Self::binary_names() {
            if let Ok(found) = which::which(name) {
                if let Ok(valid) = validate_executable(&found) {
                    return Ok(valid);
                }
            }
        }

        Err(Error::Launch(format!(
            "Chrome not found. Checked: {}. Use --chrome-path to specify location.",
            Self::default_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    fn default_paths() -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        return vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ];

        #[cfg(target_os = "linux")]
        return vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
        ];

        #[cfg(target_os = "windows")]
        return vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return vec![];
    }

    fn binary_names() -> &'static [&'static str] {
        &["google-chrome", "chromium", "chromium-browser", "chrome"]
    }
}

fn validate_executable(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::Launch(format!(
            "Chrome not found at: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path).map_err(Error::Io)?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::Launch(format!(
                "Chrome binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
