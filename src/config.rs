use crate::error::ModError;
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

pub const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub game_root: PathBuf,
    #[serde(default)]
    pub mod_descriptions: HashMap<String, String>,
    #[serde(default)]
    pub mod_links: HashMap<String, String>,
}

pub struct ConfigLoad {
    pub config: ManagerConfig,
    pub warning: Option<String>,
}

impl ManagerConfig {
    pub fn load_or_default() -> ConfigLoad {
        match config_path() {
            Ok(path) => Self::load_from(&path),
            Err(err) => ConfigLoad {
                config: Self::default(),
                warning: Some(format!("config location unavailable: {err}")),
            },
        }
    }

    // Never errors past this boundary: missing, empty and corrupt files all
    // fall back to the default store, corruption with a warning attached.
    pub fn load_from(path: &Path) -> ConfigLoad {
        if !path.exists() {
            return ConfigLoad {
                config: Self::default(),
                warning: None,
            };
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                return ConfigLoad {
                    config: Self::default(),
                    warning: Some(format!("could not read {path:?}: {err}")),
                }
            }
        };
        if raw.trim().is_empty() {
            return ConfigLoad {
                config: Self::default(),
                warning: None,
            };
        }
        match serde_json::from_str(&raw) {
            Ok(config) => ConfigLoad {
                config,
                warning: None,
            },
            Err(err) => ConfigLoad {
                config: Self::default(),
                warning: Some(format!("{path:?} is corrupt, resetting settings ({err})")),
            },
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path.parent().context("config path has no parent")?;
        fs::create_dir_all(dir).context("create config dir")?;
        let raw = serde_json::to_string_pretty(self).context("serialize config")?;
        // Write-then-rename so readers never observe a partial document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).context("write config")?;
        fs::rename(&tmp, path).context("replace config")?;
        Ok(())
    }

    pub fn description_for(&self, name: &str) -> &str {
        self.mod_descriptions
            .get(name)
            .map(String::as_str)
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_DESCRIPTION)
    }

    pub fn link_for(&self, name: &str) -> Option<&str> {
        self.mod_links
            .get(name)
            .map(String::as_str)
            .filter(|link| !link.is_empty())
    }
}

pub fn resolve_game_root(
    config: &mut ManagerConfig,
    pick_root: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf> {
    if !config.game_root.as_os_str().is_empty() && config.game_root.exists() {
        return Ok(config.game_root.clone());
    }

    let picked = pick_root().unwrap_or_default();
    if picked.as_os_str().is_empty() || !picked.exists() {
        return Err(ModError::InvalidRoot(picked).into());
    }

    config.game_root = picked.clone();
    config.save()?;
    Ok(picked)
}

fn config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("plugsmith").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_default_without_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let load = ManagerConfig::load_from(&tmp.path().join("config.json"));
        assert!(load.warning.is_none());
        assert!(load.config.game_root.as_os_str().is_empty());
        assert!(load.config.mod_descriptions.is_empty());
    }

    #[test]
    fn corrupt_file_loads_default_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{not valid json!").unwrap();
        let load = ManagerConfig::load_from(&path);
        assert!(load.warning.is_some());
        assert!(load.config.mod_links.is_empty());
    }

    #[test]
    fn empty_file_loads_default_silently() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "  \n").unwrap();
        let load = ManagerConfig::load_from(&path);
        assert!(load.warning.is_none());
    }

    #[test]
    fn save_round_trips_and_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        let mut config = ManagerConfig::default();
        config.game_root = PathBuf::from("/games/dwno");
        config
            .mod_descriptions
            .insert("ModA.dll".to_string(), "Adds things".to_string());
        config
            .mod_links
            .insert("ModA.dll".to_string(), "https://example.com/moda".to_string());
        config.save_to(&path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let load = ManagerConfig::load_from(&path);
        assert!(load.warning.is_none());
        assert_eq!(load.config.game_root, PathBuf::from("/games/dwno"));
        assert_eq!(load.config.description_for("ModA.dll"), "Adds things");
        assert_eq!(load.config.link_for("ModA.dll"), Some("https://example.com/moda"));
    }

    #[test]
    fn metadata_is_independent_of_file_presence() {
        // Entries are keyed by filename only; nothing requires the file on
        // disk, so a deleted mod keeps its description for a later re-import.
        let mut config = ManagerConfig::default();
        config
            .mod_descriptions
            .insert("Gone.dll".to_string(), "Still described".to_string());
        assert_eq!(config.description_for("Gone.dll"), "Still described");
        assert_eq!(config.description_for("NeverSeen.dll"), NO_DESCRIPTION);
        assert_eq!(config.link_for("NeverSeen.dll"), None);
    }

    #[test]
    fn resolve_prefers_existing_configured_root() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = ManagerConfig::default();
        config.game_root = tmp.path().to_path_buf();
        let root = resolve_game_root(&mut config, || panic!("prompt must not run")).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn resolve_rejects_cancelled_prompt() {
        let mut config = ManagerConfig::default();
        let err = resolve_game_root(&mut config, || None).unwrap_err();
        assert!(err.downcast_ref::<ModError>().is_some());
    }

    #[test]
    fn resolve_rejects_nonexistent_pick() {
        let mut config = ManagerConfig::default();
        let err =
            resolve_game_root(&mut config, || Some(PathBuf::from("/no/such/dir"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModError>(),
            Some(ModError::InvalidRoot(_))
        ));
    }
}
