use anyhow::Result;
use seatwatch_browser::ChromeFinder;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Report which Chrome binary a check run would launch.
pub fn execute(chrome_path: Option<PathBuf>) -> Result<()> {
    println!("🔍 Locating Chrome...");
    let chrome_binary = ChromeFinder::new(chrome_path).find()?;
    println!("✅ Chrome binary: {}", chrome_binary.display());

    match Command::new(&chrome_binary).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("   {}", version.trim());
        }
        Ok(output) => {
            debug!(
                "--version exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Err(e) => debug!("--version did not run: {e}"),
    }

    Ok(())
}
