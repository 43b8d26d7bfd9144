use crate::error::ModError;
use crate::game::{self, GamePaths};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub name: String,
    pub active: bool,
}

// Read-side only: state is derived from which directory holds the file,
// never stored. A name present in both directories yields two entries.
pub fn scan_mods(paths: &GamePaths) -> Result<Vec<ModEntry>, ModError> {
    let mut mods = Vec::new();
    for (dir, active) in [(&paths.plugins_dir, true), (&paths.staging_dir, false)] {
        collect_plugins(dir, active, &mut mods)?;
    }
    mods.sort_by(|a, b| a.name.cmp(&b.name).then(b.active.cmp(&a.active)));
    Ok(mods)
}

fn collect_plugins(dir: &Path, active: bool, out: &mut Vec<ModEntry>) -> Result<(), ModError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if !game::is_plugin_file(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        out.push(ModEntry {
            name: name.to_string(),
            active,
        });
    }
    Ok(())
}
