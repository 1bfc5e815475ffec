//! Browser launch configuration: turns typed options into the Chromium
//! command-line flag list, discovers an executable on the host, and manages
//! profile directories and unpacked extensions.
//!
//! This crate is glue around the navigation core — it holds no state machine
//! and performs no protocol work.

use std::io;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use which::which;

/// Errors emitted by the configuration surface.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find a chrome/chromium executable; install one or set the path explicitly")]
    ExecutableNotFound,
    #[error("no extension manifest found under {0}")]
    ExtensionNotFound(PathBuf),
    #[error("extension archives are not supported; unpack {0} into a directory first")]
    UnsupportedExtension(PathBuf),
    #[error("argument {0:?} must be set through its config field")]
    ReservedArgument(String),
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
}

/// Proxy settings forwarded to the browser command line.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProxySettings {
    pub server: String,
    pub bypass: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Flags every launch carries regardless of options.
const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--remote-allow-origins=*",
    "--no-first-run",
    "--no-service-autorun",
    "--no-default-browser-check",
    "--homepage=about:blank",
    "--no-pings",
    "--password-store=basic",
    "--disable-infobars",
    "--disable-breakpad",
    "--disable-component-update",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-background-networking",
    "--disable-dev-shm-usage",
    "--disable-features=IsolateOrigins,site-per-process",
    "--disable-session-crashed-bubble",
    "--disable-search-engine-choice-screen",
];

// Flag fragments that must be set through a typed field instead of a raw
// argument, so one option cannot be configured two contradictory ways.
const RESERVED_FRAGMENTS: &[&str] = &[
    "headless",
    "data-dir",
    "data_dir",
    "no-sandbox",
    "no_sandbox",
    "lang",
];

/// Launch configuration for a Chromium-family browser.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Explicit executable; discovery runs when unset.
    pub browser_executable_path: Option<PathBuf>,
    /// Profile directory; a fresh temp profile is created when unset.
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    pub sandbox: bool,
    pub lang: String,
    pub proxy: Option<ProxySettings>,
    /// Remote debugging bind host.
    pub host: Option<String>,
    /// Remote debugging port.
    pub port: Option<u16>,
    /// Expert mode: disables web security and site isolation for debugging.
    pub expert: bool,
    extra_args: Vec<String>,
    extensions: Vec<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser_executable_path: None,
            user_data_dir: None,
            headless: false,
            sandbox: true,
            lang: "en-US".to_string(),
            proxy: None,
            host: None,
            port: None,
            expert: false,
            extra_args: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

impl BrowserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the executable: the explicit path when set, host discovery
    /// otherwise.
    pub fn executable(&self) -> Result<PathBuf, ConfigError> {
        match &self.browser_executable_path {
            Some(path) => Ok(path.clone()),
            None => find_chrome_executable(),
        }
    }

    /// Effective profile directory, creating a temp profile on first use
    /// when none was configured.
    pub fn ensure_user_data_dir(&mut self) -> Result<PathBuf, ConfigError> {
        match &self.user_data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let dir = temp_profile_dir()?;
                debug!(target: "browser-config", dir = %dir.display(), "created temp profile dir");
                self.user_data_dir = Some(dir.clone());
                Ok(dir)
            }
        }
    }

    pub fn uses_custom_data_dir(&self) -> bool {
        self.user_data_dir.is_some()
    }

    /// Append a raw browser argument. Flags covered by typed fields are
    /// rejected.
    pub fn add_argument(&mut self, arg: impl Into<String>) -> Result<(), ConfigError> {
        let arg = arg.into();
        let lowered = arg.to_ascii_lowercase();
        if RESERVED_FRAGMENTS
            .iter()
            .any(|fragment| lowered.contains(fragment))
        {
            return Err(ConfigError::ReservedArgument(arg));
        }
        self.extra_args.push(arg);
        Ok(())
    }

    /// Register an unpacked extension. `path` may be the directory holding
    /// `manifest.json` or a parent of it; archive files are rejected.
    pub fn add_extension(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.is_file() {
            return Err(ConfigError::UnsupportedExtension(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(ConfigError::ExtensionNotFound(path.to_path_buf()));
        }
        let root = find_manifest_dir(path)?
            .ok_or_else(|| ConfigError::ExtensionNotFound(path.to_path_buf()))?;
        debug!(target: "browser-config", dir = %root.display(), "registered extension");
        self.extensions.push(root);
        Ok(())
    }

    /// Assemble the full command-line flag list for the current options.
    ///
    /// User-supplied arguments are deduplicated against the defaults; the
    /// debugging host and port are included only when configured, since the
    /// launcher usually binds them at start time.
    pub fn browser_args(&self) -> Vec<String> {
        let mut args: Vec<String> = DEFAULT_BROWSER_ARGS
            .iter()
            .map(|arg| arg.to_string())
            .collect();

        if let Some(dir) = &self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        args.push(format!("--lang={}", self.lang));
        if self.expert {
            args.push("--disable-web-security".to_string());
            args.push("--disable-site-isolation-trials".to_string());
        }
        for arg in &self.extra_args {
            if !args.contains(arg) {
                args.push(arg.clone());
            }
        }
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
        }
        if let Some(host) = &self.host {
            args.push(format!("--remote-debugging-host={host}"));
        }
        if let Some(port) = self.port {
            args.push(format!("--remote-debugging-port={port}"));
        }
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={}", proxy.server));
            if let Some(bypass) = &proxy.bypass {
                args.push(format!("--proxy-bypass-list={bypass}"));
            }
        }
        if !self.extensions.is_empty() {
            let joined = self
                .extensions
                .iter()
                .map(|ext| ext.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            args.push(format!("--load-extension={joined}"));
        }
        args
    }
}

/// Generate a fresh throwaway profile directory.
pub fn temp_profile_dir() -> io::Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix("navwatch_profile_")
        .tempdir()?;
    Ok(dir.keep())
}

/// Find a Chrome/Chromium executable on this host.
///
/// Order: the `NAVWATCH_CHROME` env override, then the per-OS executable
/// names on `PATH`, then well-known install locations (skipped when
/// `NAVWATCH_SKIP_OS_PATHS` is set, mainly for tests).
pub fn find_chrome_executable() -> Result<PathBuf, ConfigError> {
    if let Ok(raw) = env::var("NAVWATCH_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Ok(candidate);
            }
            debug!(
                target: "browser-config",
                path = %candidate.display(),
                "NAVWATCH_CHROME points at a missing file"
            );
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Ok(path);
        }
    }

    let skip_defaults = env::var("NAVWATCH_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    Err(ConfigError::ExecutableNotFound)
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe"]
    }

    #[cfg(any(target_os = "macos", target_os = "linux"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        &["chrome"]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA", "PROGRAMW6432"] {
            if let Ok(value) = env::var(key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    let root = PathBuf::from(trimmed);
                    paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                    paths.push(root.join("Google/Chrome Beta/Application/chrome.exe"));
                    paths.push(root.join("Chromium/Application/chrome.exe"));
                }
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(target_os = "linux")]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}

/// Locate the directory holding an extension manifest under `root`.
fn find_manifest_dir(root: &Path) -> io::Result<Option<PathBuf>> {
    let mut has_manifest = false;
    let mut sub_dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            sub_dirs.push(path);
        } else if path.file_stem().map_or(false, |stem| stem == "manifest") {
            has_manifest = true;
        }
    }
    if has_manifest {
        return Ok(Some(root.to_path_buf()));
    }
    for dir in sub_dirs {
        if let Some(found) = find_manifest_dir(&dir)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
