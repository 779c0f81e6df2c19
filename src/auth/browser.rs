//! Browser-launch helpers for the authorization step.

use std::process::{Command, Stdio};

/// Opens a URL for the user. Failure is non-fatal: the URL is also printed.
pub trait BrowserLauncher: Send + Sync {
    /// Returns `true` when a launcher accepted the URL.
    fn open(&self, url: &str) -> bool;
}

/// Launches the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> bool {
        let opened = try_open_browser(url);
        if !opened {
            tracing::debug!("no browser launcher accepted the authorization url");
        }
        opened
    }
}

/// Never opens anything. Used with `--no-browser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn open(&self, _url: &str) -> bool {
        false
    }
}

/// Best-effort attempt to open a URL in the system browser.
///
/// The launcher is spawned, not awaited: console browsers started by
/// `xdg-open` would otherwise hold the login until they exit.
fn try_open_browser(url: &str) -> bool {
    let Some(mut command) = launcher_command(url) else {
        return false;
    };
    match command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            // Reap the launcher in the background so it does not linger as a zombie.
            std::thread::spawn(move || {
                let _ = child.wait();
            });
            true
        }
        Err(err) => {
            tracing::debug!(error = %err, "failed to spawn browser launcher");
            false
        }
    }
}

/// Platform launcher invocation for `url`.
///
/// Windows goes through `rundll32` rather than `cmd /C start` because cmd
/// splits an unquoted URL at every `&`.
fn launcher_command(url: &str) -> Option<Command> {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url);
        Some(command)
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("rundll32");
        command.args(["url.dll,FileProtocolHandler", url]);
        Some(command)
    } else if cfg!(unix) {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        Some(command)
    } else {
        None
    }
}
