use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use registry_core::calendar::DEFAULT_TIMEZONE;
use registry_core::pagination::DEFAULT_PAGE_SIZE;
use registry_core::storage::sqlite::DEFAULT_BUSY_TIMEOUT;
use registry_core::storage::StorageOptions;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub registry: RegistrySection,
    #[serde(default)]
    pub calendar: CalendarSection,
    #[serde(default)]
    pub listing: ListingSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrySection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarSection {
    pub timezone: String,
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingSection {
    pub page_size: usize,
}

impl Default for ListingSection {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageSection {
    pub busy_timeout_ms: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT.as_millis() as u64,
        }
    }
}

impl StorageSection {
    pub fn options(&self) -> StorageOptions {
        StorageOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

impl RegistryConfig {
    pub fn new(registry_path: PathBuf, timezone: String, page_size: usize) -> Self {
        Self {
            registry: RegistrySection {
                path: registry_path.to_string_lossy().to_string(),
            },
            calendar: CalendarSection { timezone },
            listing: ListingSection { page_size },
            storage: StorageSection::default(),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_registry_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("registry.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<RegistryConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &RegistryConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("registry"));
        }
    }
    Ok(home_dir()?.join(".config").join("registry"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("registry"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("registry"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
