//! Where MCP clients keep their server configuration.
//!
//! The order of [`list_config_locations`] is the search order: project-level
//! files come before user-level ones, and the first file that declares a
//! profile for the requested server wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::env::{EnvProvider, SystemEnv};
use crate::platform::{OsFamily, Platform};

const CLINE_SETTINGS: [&str; 6] = [
    "Code",
    "User",
    "globalStorage",
    "saoudrizwan.claude-dev",
    "settings",
    "cline_mcp_settings.json",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub client: String,
}

impl ConfigLocation {
    fn new(path: PathBuf, client: &str) -> Self {
        Self {
            path,
            client: client.to_string(),
        }
    }
}

/// Inputs the catalog depends on, captured at one instant.
#[derive(Debug, Clone)]
pub struct LocationContext {
    pub cwd: PathBuf,
    pub home: PathBuf,
    pub family: OsFamily,
    /// `APPDATA`, if set and non-empty.
    pub app_data: Option<PathBuf>,
    /// `XDG_CONFIG_HOME`, if set and non-empty.
    pub xdg_config_home: Option<PathBuf>,
}

impl LocationContext {
    /// Home is `HOME` from `env` when set, otherwise the OS-reported home directory.
    pub fn capture(env: &dyn EnvProvider, platform: &Platform) -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            home: env
                .get_non_empty("HOME")
                .map(PathBuf::from)
                .or_else(dirs::home_dir)
                .unwrap_or_default(),
            family: platform.family,
            app_data: env.get_non_empty("APPDATA").map(PathBuf::from),
            xdg_config_home: env.get_non_empty("XDG_CONFIG_HOME").map(PathBuf::from),
        }
    }

    fn app_data_dir(&self) -> PathBuf {
        self.app_data
            .clone()
            .unwrap_or_else(|| self.home.join("AppData").join("Roaming"))
    }

    fn xdg_config_dir(&self) -> PathBuf {
        self.xdg_config_home
            .clone()
            .unwrap_or_else(|| self.home.join(".config"))
    }
}

/// All known config locations for `ctx`, in search order.
pub fn list_config_locations(ctx: &LocationContext) -> Vec<ConfigLocation> {
    let cwd = ctx.cwd.as_path();
    let home = ctx.home.as_path();
    let parent = cwd.parent().unwrap_or(cwd);

    let mut locations = vec![
        // Claude Code
        ConfigLocation::new(cwd.join(".mcp.json"), "Claude Code"),
        ConfigLocation::new(parent.join(".mcp.json"), "Claude Code"),
        ConfigLocation::new(home.join(".mcp.json"), "Claude Code"),
        // Cursor
        ConfigLocation::new(cwd.join(".cursor").join("mcp.json"), "Cursor"),
        ConfigLocation::new(home.join(".cursor").join("mcp.json"), "Cursor"),
        // VS Code
        ConfigLocation::new(cwd.join(".vscode").join("mcp.json"), "VS Code"),
        // Gemini CLI
        ConfigLocation::new(cwd.join(".gemini").join("settings.json"), "Gemini CLI"),
        ConfigLocation::new(home.join(".gemini").join("settings.json"), "Gemini CLI"),
        // GitHub Copilot CLI
        ConfigLocation::new(home.join(".copilot").join("mcp-config.json"), "Copilot CLI"),
        // Amazon Q Developer
        ConfigLocation::new(
            home.join(".aws").join("amazonq").join("mcp.json"),
            "Amazon Q",
        ),
    ];

    let app_config_root = match ctx.family {
        OsFamily::MacOs => home.join("Library").join("Application Support"),
        OsFamily::Windows => ctx.app_data_dir(),
        OsFamily::Other => ctx.xdg_config_dir(),
    };
    locations.extend(desktop_app_locations(&app_config_root));

    locations
}

fn desktop_app_locations(root: &Path) -> [ConfigLocation; 2] {
    let cline = CLINE_SETTINGS
        .iter()
        .fold(root.to_path_buf(), |path, part| path.join(part));
    [
        ConfigLocation::new(
            root.join("Claude").join("claude_desktop_config.json"),
            "Claude Desktop",
        ),
        ConfigLocation::new(cline, "Cline"),
    ]
}

/// Source of candidate config locations, re-evaluated on every lookup.
pub trait ConfigCatalog: Send + Sync {
    fn locations(&self) -> Vec<ConfigLocation>;
}

/// Catalog built from the live working directory, home and environment.
#[derive(Clone)]
pub struct SystemCatalog {
    env: Arc<dyn EnvProvider>,
    platform: &'static Platform,
}

impl SystemCatalog {
    pub fn new(env: Arc<dyn EnvProvider>) -> Self {
        Self {
            env,
            platform: Platform::current(),
        }
    }
}

impl Default for SystemCatalog {
    fn default() -> Self {
        Self::new(Arc::new(SystemEnv))
    }
}

impl ConfigCatalog for SystemCatalog {
    fn locations(&self) -> Vec<ConfigLocation> {
        list_config_locations(&LocationContext::capture(self.env.as_ref(), self.platform))
    }
}

impl ConfigCatalog for Vec<ConfigLocation> {
    fn locations(&self) -> Vec<ConfigLocation> {
        self.clone()
    }
}
