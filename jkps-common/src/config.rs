//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`JKPS_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "JKPS_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "jkps.db";

/// Image directory name inside the root folder
pub const IMAGES_DIR: &str = "images";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "jkps_sg=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// TOML configuration file contents
///
/// Every field is optional; a missing file is equivalent to `TomlConfig::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and uploaded images
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    /// HTTP port override
    #[serde(default)]
    pub port: Option<u16>,
    /// Locale used until one is selected and persisted ("en" or "tr")
    #[serde(default)]
    pub default_locale: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Default config file location for the platform (`<config dir>/jkps/jkps.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jkps").join("jkps.toml"))
}

/// Load the TOML config
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but cannot be read or parsed is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file not found: {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded config: {}", path.display());
    Ok(config)
}

/// Resolves the root folder from CLI, environment, TOML and platform default
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    toml_config: Option<&'a TomlConfig>,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self {
            cli_arg,
            toml_config: None,
        }
    }

    pub fn with_toml(mut self, toml_config: &'a TomlConfig) -> Self {
        self.toml_config = Some(toml_config);
        self
    }

    /// Resolve using the priority order documented at module level
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = self.toml_config.and_then(|c| c.root_folder.as_ref()) {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        default_root_folder()
    }
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/jkps
        dirs::data_local_dir()
            .map(|d| d.join("jkps"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/jkps"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/jkps
        dirs::data_dir()
            .map(|d| d.join("jkps"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/jkps"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\jkps
        dirs::data_local_dir()
            .map(|d| d.join("jkps"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\jkps"))
    } else {
        PathBuf::from("./jkps_data")
    }
}

/// Creates the root folder layout on first run
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder and its image directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!("Creating root folder: {}", self.root_folder.display());
        }
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.images_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn images_path(&self) -> PathBuf {
        self.root_folder.join(IMAGES_DIR)
    }
}
