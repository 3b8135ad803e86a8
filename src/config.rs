//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILEMBED_CONFIG` (environment variable)
//! 2. `~/.config/mailembed/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailembed\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::embed::generate::HasherKind;
use crate::error::{EmbedError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Body reference matching.
    pub matching: MatchingConfig,
    /// Which MIME types count as inlineable.
    pub policy: PolicyConfig,
    /// Content identifier generation.
    pub cid: CidConfig,
    /// Blob fetching.
    pub fetch: FetchConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Body reference matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Provider-specific attribute holding a pending `cid:` reference.
    pub vendor_attribute: String,
}

/// MIME policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// MIME types rendered inline when referenced from the body.
    pub embeddable_types: Vec<String>,
}

/// Content identifier generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CidConfig {
    /// Hash used for the local part: "rolling" or "sha256".
    pub hasher: HasherKind,
    /// Bits per rendered digit (4 = hexadecimal).
    pub radix_shift: u32,
}

/// Blob fetching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Optional `User-Agent`. No header is sent when unset.
    pub user_agent: Option<String>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            vendor_attribute: "proton-src".to_string(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            embeddable_types: ["image/gif", "image/jpeg", "image/png", "image/bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for CidConfig {
    fn default() -> Self {
        Self {
            hasher: HasherKind::Rolling,
            radix_shift: 4,
        }
    }
}

impl Config {
    /// Reject values that would make the resolver misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.cid.radix_shift) {
            return Err(EmbedError::InvalidConfig(format!(
                "cid.radix_shift must be between 1 and 5, got {}",
                self.cid.radix_shift
            )));
        }
        let attr = self.matching.vendor_attribute.trim();
        if attr.is_empty() || attr.contains(char::is_whitespace) {
            return Err(EmbedError::InvalidConfig(format!(
                "matching.vendor_attribute is not a valid attribute name: '{}'",
                self.matching.vendor_attribute
            )));
        }
        Ok(())
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found, on parse error,
/// or when the file fails validation.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => match cfg.validate() {
                        Ok(()) => {
                            tracing::info!(path = %path.display(), "Loaded config");
                            return cfg;
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %path.display(),
                                error = %e,
                                "Config rejected, using defaults"
                            );
                        }
                    },
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILEMBED_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailembed").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailembed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.matching.vendor_attribute, "proton-src");
        assert_eq!(cfg.cid.hasher, HasherKind::Rolling);
        assert_eq!(cfg.cid.radix_shift, 4);
        assert!(cfg
            .policy
            .embeddable_types
            .contains(&"image/png".to_string()));
        assert!(cfg.fetch.user_agent.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[matching]
vendor_attribute = "acme-src"

[cid]
hasher = "sha256"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.matching.vendor_attribute, "acme-src");
        assert_eq!(cfg.cid.hasher, HasherKind::Sha256);
        // Other fields use defaults
        assert_eq!(cfg.cid.radix_shift, 4);
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.policy.embeddable_types.len(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_radix() {
        let mut cfg = Config::default();
        cfg.cid.radix_shift = 0;
        assert!(matches!(cfg.validate(), Err(EmbedError::InvalidConfig(_))));
        cfg.cid.radix_shift = 6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_vendor_attribute() {
        let mut cfg = Config::default();
        cfg.matching.vendor_attribute = "  ".to_string();
        assert!(cfg.validate().is_err());
        cfg.matching.vendor_attribute = "a b".to_string();
        assert!(cfg.validate().is_err());
    }

    // ─── Loading through $MAILEMBED_CONFIG ──────────────────────────

    /// Tests below share the process environment.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_config_env<T>(path: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("MAILEMBED_CONFIG", path);
        let result = f();
        std::env::remove_var("MAILEMBED_CONFIG");
        result
    }

    #[test]
    fn test_env_var_selects_config_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.toml");
        let found = with_config_env(&path, config_file_path);
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_load_config_from_env_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[matching]\nvendor_attribute = \"legacy-src\"\n\n[cid]\nradix_shift = 5\n",
        )
        .unwrap();

        let cfg = with_config_env(&path, load_config);
        assert_eq!(cfg.matching.vendor_attribute, "legacy-src");
        assert_eq!(cfg.cid.radix_shift, 5);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_load_config_malformed_toml_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[matching\nvendor_attribute = ").unwrap();

        let cfg = with_config_env(&path, load_config);
        assert_eq!(cfg.matching.vendor_attribute, "proton-src");
        assert_eq!(cfg.cid.radix_shift, 4);
    }

    #[test]
    fn test_load_config_invalid_values_fall_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[matching]\nvendor_attribute = \"legacy-src\"\n\n[cid]\nradix_shift = 9\n",
        )
        .unwrap();

        let cfg = with_config_env(&path, load_config);
        // The whole file is rejected, not just the bad key.
        assert_eq!(cfg.cid.radix_shift, 4);
        assert_eq!(cfg.matching.vendor_attribute, "proton-src");
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.toml");
        let cfg = with_config_env(&path, load_config);
        assert_eq!(cfg.matching.vendor_attribute, "proton-src");
    }

    #[test]
    fn test_save_then_load_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.matching.vendor_attribute = "acme-src".to_string();
        cfg.cid.hasher = HasherKind::Sha256;
        cfg.policy.embeddable_types = vec!["image/webp".to_string()];
        cfg.fetch.user_agent = Some("mailembed-test".to_string());

        let loaded = with_config_env(&path, || {
            save_config(&cfg).unwrap();
            load_config()
        });
        assert!(path.exists());
        assert_eq!(loaded.matching.vendor_attribute, "acme-src");
        assert_eq!(loaded.cid.hasher, HasherKind::Sha256);
        assert_eq!(loaded.policy.embeddable_types, ["image/webp"]);
        assert_eq!(loaded.fetch.user_agent.as_deref(), Some("mailembed-test"));
    }

    #[test]
    fn test_cache_dir_override() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/mailembed-test"));
        assert_eq!(cache_dir(&cfg), PathBuf::from("/tmp/mailembed-test"));
    }
}
