//! Build configuration.
//!
//! One immutable [`BuildConfig`] is assembled up front and threaded through
//! the whole pipeline. Sources, highest priority first:
//! 1. CLI flags (applied by the caller through [`ConfigOverrides`])
//! 2. `kiln.toml` in the vault root
//! 3. `<config dir>/kiln/config.toml`
//! 4. Built-in defaults

use crate::error::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-vault config file.
pub const VAULT_CONFIG_FILE: &str = "kiln.toml";

/// Default transclusion depth before an embed renders as broken.
pub const DEFAULT_MAX_EMBED_DEPTH: usize = 8;

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    /// Vault root.
    pub input_dir: PathBuf,
    /// Where generated files land.
    pub output_dir: PathBuf,
    /// Public site URL. Only its path part prefixes addresses.
    pub base_url: String,
    /// Write pages as `page/index.html` instead of `page.html`.
    pub flat_urls: bool,
    /// Maximum nesting of transcluded notes.
    pub max_embed_depth: usize,
    pub site_name: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("public"),
            base_url: String::new(),
            flat_urls: false,
            max_embed_depth: DEFAULT_MAX_EMBED_DEPTH,
            site_name: "Kiln".to_string(),
        }
    }
}

/// A config file as written on disk. Every key is optional, unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub output_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub flat_urls: Option<bool>,
    pub max_embed_depth: Option<usize>,
    pub site_name: Option<String>,
}

impl ConfigFile {
    /// Read a config file, or `None` if it doesn't exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| KilnError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Ok(Some(file))
    }

    fn apply_to(self, config: &mut BuildConfig) {
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(flat_urls) = self.flat_urls {
            config.flat_urls = flat_urls;
        }
        if let Some(depth) = self.max_embed_depth {
            config.max_embed_depth = depth;
        }
        if let Some(site_name) = self.site_name {
            config.site_name = site_name;
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub flat_urls: bool,
}

impl BuildConfig {
    /// Path of the global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kiln").join("config.toml"))
    }

    /// Load the config for a vault, layering global, vault and CLI settings.
    pub fn load(input_dir: impl Into<PathBuf>, overrides: &ConfigOverrides) -> Result<Self> {
        let global = match Self::global_config_path() {
            Some(path) => ConfigFile::read(&path)?,
            None => None,
        };
        Self::load_with_global(input_dir, global, overrides)
    }

    /// Same as [`BuildConfig::load`] with an explicit global layer.
    pub fn load_with_global(
        input_dir: impl Into<PathBuf>,
        global: Option<ConfigFile>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let input_dir = input_dir.into();
        if !input_dir.is_dir() {
            return Err(KilnError::VaultNotFound(input_dir));
        }

        let mut config = BuildConfig {
            input_dir: input_dir.clone(),
            ..BuildConfig::default()
        };

        if let Some(global) = global {
            global.apply_to(&mut config);
        }

        let vault_file = input_dir.join(VAULT_CONFIG_FILE);
        if let Some(local) = ConfigFile::read(&vault_file)? {
            log::debug!("Loaded vault config from {}", vault_file.display());
            local.apply_to(&mut config);
        }

        if let Some(ref output_dir) = overrides.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(ref base_url) = overrides.base_url {
            config.base_url = base_url.clone();
        }
        if overrides.flat_urls {
            config.flat_urls = true;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config =
            BuildConfig::load_with_global(dir.path(), None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.input_dir, dir.path());
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.max_embed_depth, DEFAULT_MAX_EMBED_DEPTH);
        assert!(!config.flat_urls);
    }

    #[test]
    fn test_vault_file_beats_global() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(VAULT_CONFIG_FILE),
            "base_url = \"https://example.com/notes\"\nunknown_key = 3\n",
        )
        .unwrap();
        let global = ConfigFile {
            base_url: Some("https://global.example".to_string()),
            site_name: Some("Global".to_string()),
            ..ConfigFile::default()
        };

        let config =
            BuildConfig::load_with_global(dir.path(), Some(global), &ConfigOverrides::default())
                .unwrap();
        assert_eq!(config.base_url, "https://example.com/notes");
        assert_eq!(config.site_name, "Global");
    }

    #[test]
    fn test_overrides_win() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(VAULT_CONFIG_FILE), "flat_urls = false\n").unwrap();
        let overrides = ConfigOverrides {
            output_dir: Some(PathBuf::from("out")),
            base_url: Some("/docs".to_string()),
            flat_urls: true,
        };
        let config = BuildConfig::load_with_global(dir.path(), None, &overrides).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.base_url, "/docs");
        assert!(config.flat_urls);
    }

    #[test]
    fn test_missing_vault() {
        let result = BuildConfig::load_with_global(
            "/definitely/not/a/vault",
            None,
            &ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(KilnError::VaultNotFound(_))));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(VAULT_CONFIG_FILE), "flat_urls = [").unwrap();
        let result = BuildConfig::load_with_global(dir.path(), None, &ConfigOverrides::default());
        assert!(matches!(result, Err(KilnError::ConfigError(_))));
    }
}
