use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Backend;

/// Root application configuration, loaded from `~/.config/libris/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub covers: CoverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub library_path: String,
    pub backend: Backend,
    pub json_file: String,
    pub database_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    /// Cover directory; relative paths are resolved against `core.library_path`.
    pub directory: String,
    /// Genre used when a book's genre has no entry in `defaults`.
    pub fallback_genre: String,
    /// Genre → default cover file name inside the cover directory.
    pub defaults: BTreeMap<String, String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("libris");

        Self {
            library_path: data_dir.to_string_lossy().to_string(),
            backend: Backend::Json,
            json_file: "library.json".to_string(),
            database_file: "library.db".to_string(),
        }
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        let defaults = [
            ("Fiction", "default_fiction.jpg"),
            ("Non-Fiction", "default_nonfiction.jpg"),
            ("Mystery", "default_mystery.jpg"),
            ("Fantasy", "default_fantasy.jpg"),
            ("Science", "default_science.jpg"),
            ("Other", "default_other.jpg"),
        ]
        .into_iter()
        .map(|(genre, file)| (genre.to_string(), file.to_string()))
        .collect();

        Self {
            directory: "covers".to_string(),
            fallback_genre: "Other".to_string(),
            defaults,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/libris/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LIBRIS_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("libris")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn set_library_path(&mut self, path: PathBuf) {
        self.core.library_path = path.to_string_lossy().to_string();
    }

    // ─── Derived paths ─────────────────────────────────────

    pub fn library_path(&self) -> PathBuf {
        PathBuf::from(&self.core.library_path)
    }

    /// Path to the JSON library file.
    pub fn library_file(&self) -> PathBuf {
        self.library_path().join(&self.core.json_file)
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.library_path().join(&self.core.database_file)
    }

    /// Path to the cover image directory.
    pub fn covers_dir(&self) -> PathBuf {
        let dir = Path::new(&self.covers.directory);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.library_path().join(dir)
        }
    }

    /// Flat `key = value` view used by `libris config`.
    pub fn key_values(&self) -> BTreeMap<&'static str, String> {
        let mut map = BTreeMap::new();
        map.insert("library_path", self.core.library_path.clone());
        map.insert("backend", self.core.backend.to_string());
        map.insert("library_file", self.library_file().to_string_lossy().to_string());
        map.insert("database_path", self.database_path().to_string_lossy().to_string());
        map.insert("covers_dir", self.covers_dir().to_string_lossy().to_string());
        map.insert("fallback_genre", self.covers.fallback_genre.clone());
        map
    }
}
