use crate::{Error, Result};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Builds the Chrome command line and spawns the process.
///
/// The watcher drives the page over CDP, so Chrome runs headless unless the
/// caller opts into a visible window for debugging a selector chain.
pub struct ChromeLauncher {
    chrome_path: PathBuf,
    profile_path: PathBuf,
    initial_url: Option<String>,
    headless: bool,
    debugging_port: u16,
}

impl ChromeLauncher {
    pub fn new(chrome_path: PathBuf, profile_path: PathBuf, initial_url: Option<String>) -> Self {
        Self {
            chrome_path,
            profile_path,
            initial_url,
            headless: true,
            debugging_port: 9222,
        }
    }

    /// Run with a visible browser window.
    pub fn with_headful(mut self) -> Self {
        self.headless = false;
        self
    }

    pub fn launch(&self) -> Result<Child> {
        let args = self.build_args();
        tracing::debug!("Launching {} {}", self.chrome_path.display(), args.join(" "));

        Command::new(&self.chrome_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Launch(format!("Failed to launch Chrome: {}", e)))
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debugging_port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            format!("--user-data-dir={}", self.profile_path.display()),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
            args.push("--window-size=1280,960".to_string());
        }

        // Bare hostnames get the https scheme; the target form is TLS-only.
        if let Some(url) = &self.initial_url {
            let url = if !url.starts_with("http://") && !url.starts_with("https://") {
                format!("https://{}", url)
            } else {
                url.clone()
            };
            args.push(url);
        } else {
            args.push("about:blank".to_string());
        }

        args
    }

    pub fn debugging_port(&self) -> u16 {
        self.debugging_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(initial_url: Option<&str>) -> ChromeLauncher {
        ChromeLauncher::new(
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/tmp/profile"),
            initial_url.map(str::to_string),
        )
    }

    #[test]
    fn test_launcher_defaults_to_headless() {
        let args = launcher(Some("https://example.com")).build_args();

        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));
        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.contains(&"--no-first-run".to_string()));
        assert!(args.contains(&"--no-default-browser-check".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-data-dir=")));
        assert!(args.contains(&"https://example.com".to_string()));
    }

    #[test]
    fn test_launcher_headful_drops_headless_flags() {
        let args = launcher(Some("https://example.com"))
            .with_headful()
            .build_args();

        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(!args.contains(&"--disable-gpu".to_string()));
    }

    #[test]
    fn test_launcher_defaults_scheme_to_https() {
        let args = launcher(Some("example.com/form.aspx")).build_args();
        assert!(args.contains(&"https://example.com/form.aspx".to_string()));
    }

    #[test]
    fn test_launcher_opens_blank_page_without_url() {
        let args = launcher(None).build_args();
        assert!(args.contains(&"about:blank".to_string()));
    }
}
