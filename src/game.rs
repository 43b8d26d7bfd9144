use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const GAME_NAME: &str = "Digimon World Next Order";

pub const PLUGIN_EXT: &str = "dll";
pub const ARCHIVE_EXT: &str = "zip";

// Occupancy of these two directories encodes whether a mod is loaded:
// plugins/ is what BepInEx picks up, staging/ is parked next to it.
#[derive(Debug, Clone)]
pub struct GamePaths {
    pub game_root: PathBuf,
    pub plugins_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl GamePaths {
    pub fn resolve(game_root: &Path) -> Self {
        let loader_dir = game_root.join("BepInEx");
        Self {
            game_root: game_root.to_path_buf(),
            plugins_dir: loader_dir.join("plugins"),
            staging_dir: loader_dir.join("staging"),
        }
    }

    pub fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.plugins_dir).context("create plugins dir")?;
        fs::create_dir_all(&self.staging_dir).context("create staging dir")?;
        Ok(())
    }

    pub fn dir_for(&self, active: bool) -> &Path {
        if active {
            &self.plugins_dir
        } else {
            &self.staging_dir
        }
    }
}

pub fn is_plugin_file(path: &Path) -> bool {
    has_extension(path, PLUGIN_EXT)
}

pub fn is_archive_file(path: &Path) -> bool {
    has_extension(path, ARCHIVE_EXT)
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}
