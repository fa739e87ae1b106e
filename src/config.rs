use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static SETTINGS_FILE_NAME: &str = "settings.json";

pub struct ProjectConfig {
    pub settings: Settings,
    pub project_dirs: ProjectDirs,
    pub settings_path: PathBuf,
}

impl ProjectConfig {
    /// Loads settings from the default location, or from `settings_override`
    /// when given.
    pub fn new(settings_override: Option<&Path>) -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "clouddrive-fuse", "clouddrive-fuse")
            .ok_or_else(|| anyhow!("Failed to get project directories"))?;
        for x in [proj_dirs.config_dir(), proj_dirs.data_dir()] {
            if !x.exists() {
                fs::create_dir_all(x).context("Failed to create project directory")?;
            }
        }

        let settings_path = settings_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| proj_dirs.config_dir().join(SETTINGS_FILE_NAME));
        let settings = Settings::new(&settings_path)?;
        Ok(Self {
            settings,
            project_dirs: proj_dirs,
            settings_path,
        })
    }

    pub fn config_dir(&self) -> &Path {
        self.project_dirs.config_dir()
    }

    pub fn data_dir(&self) -> &Path {
        self.project_dirs.data_dir()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    /// Application (client) id registered with the identity provider
    pub client_id: String,
    /// Tenant used for sign in, `organizations` for work/school accounts
    pub tenant: String,
    pub cache_config: CacheConfig,
    /// How long the kernel may cache attributes and entries
    pub attr_ttl: Duration,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tenant: "organizations".to_string(),
            cache_config: CacheConfig::default(),
            attr_ttl: Duration::from_secs(1),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of cached volume statistics
    pub statfs_ttl: Duration,
    /// Maximum number of cached metadata keys
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            statfs_ttl: Duration::from_secs(600),
            capacity: 10,
        }
    }
}

impl Settings {
    pub fn new(config_file_path: &Path) -> Result<Self> {
        match Self::load_settings_from_file(config_file_path) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Error loading settings from file - creating default config: {}", e);
                if config_file_path.exists() {
                    let backup = config_file_path.with_extension("json.bak");
                    fs::rename(config_file_path, &backup)
                        .context("Failed to back up unreadable settings")?;
                    // Settings load before logging is set up
                    eprintln!(
                        "Unreadable settings ({}), moved to {} and replaced with defaults",
                        e,
                        backup.display()
                    );
                }
                let default = Self::default();
                default.save_to_file(config_file_path)?;
                Ok(default)
            }
        }
    }

    pub fn load_settings_from_file(config_file_path: &Path) -> Result<Self> {
        if !config_file_path.exists() {
            return Err(anyhow!("Config file not found"));
        }
        let data = fs::read_to_string(config_file_path)?;
        let settings: Self = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, config_file_path: &Path) -> Result<()> {
        if let Some(parent_path) = config_file_path.parent() {
            fs::create_dir_all(parent_path).context("Failed to create config directory")?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, data)?;
        Ok(())
    }

    /// Parsed log level, `Info` when the configured value is unknown
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
