use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Side-effect failure surfaced to the dispatcher. The display form is
/// embedded verbatim in failure response texts.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl From<std::io::Error> for ActionError {
    fn from(e: std::io::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

/// Process-launch and URL-open capability consumed by the dispatcher.
///
/// Launching is fire-and-forget: success means the process started; nothing
/// waits on or verifies it afterwards.
pub trait Launcher: Send + Sync {
    fn launch(&self, app_name: &str) -> Result<(), ActionError>;
    fn open_url(&self, url: &str) -> Result<(), ActionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

/// OS-specific launcher backend, selected once at startup rather than
/// branching at each call site.
pub struct PlatformLauncher {
    platform: Platform,
}

impl PlatformLauncher {
    pub fn detect() -> Self {
        let platform = if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        };
        Self { platform }
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self { platform }
    }
}

impl Launcher for PlatformLauncher {
    fn launch(&self, app_name: &str) -> Result<(), ActionError> {
        debug!("Launching application: {}", app_name);
        match self.platform {
            Platform::Windows => Command::new("cmd")
                .args(["/C", "start", "", app_name])
                .spawn(),
            Platform::MacOs => Command::new("open").args(["-a", app_name]).spawn(),
            Platform::Linux => Command::new(app_name).spawn(),
        }?;
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), ActionError> {
        debug!("Opening URL: {}", url);
        match self.platform {
            Platform::Windows => Command::new("cmd").args(["/C", "start", "", url]).spawn(),
            Platform::MacOs => Command::new("open").arg(url).spawn(),
            Platform::Linux => Command::new("xdg-open").arg(url).spawn(),
        }?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_failure_carries_the_os_message() {
        let launcher = PlatformLauncher::with_platform(Platform::Linux);
        let err = launcher
            .launch("definitely-not-a-real-binary-7f3a")
            .unwrap_err();
        assert!(!err.message.is_empty());
    }
}
