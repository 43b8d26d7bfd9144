use crate::error::ModError;
use crate::game::GamePaths;
use std::{fs, io, path::Path};

#[derive(Debug, Default)]
pub struct ToggleReport {
    pub moved: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<ToggleFailure>,
}

#[derive(Debug)]
pub struct ToggleFailure {
    pub name: String,
    pub error: ModError,
}

impl ToggleReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// Trusts the caller's desired-state snapshot: each entry says where the file
// should end up, and a missing source just means the snapshot was stale.
pub fn apply_desired_states(paths: &GamePaths, desired: &[(String, bool)]) -> ToggleReport {
    let mut report = ToggleReport::default();
    for (name, want_active) in desired {
        let src = paths.dir_for(!*want_active).join(name);
        let dst = paths.dir_for(*want_active).join(name);
        if !src.exists() {
            report.skipped.push(name.clone());
            continue;
        }
        match move_file(&src, &dst) {
            Ok(()) => report.moved.push(name.clone()),
            Err(error) => report.failures.push(ToggleFailure {
                name: name.clone(),
                error,
            }),
        }
    }
    report
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed { active: bool },
    NotFound,
}

// Active directory takes precedence when the same name exists in both.
// Confirmation is the caller's concern; this removes unconditionally.
pub fn delete_mod(paths: &GamePaths, name: &str) -> Result<DeleteOutcome, ModError> {
    for (dir, active) in [(&paths.plugins_dir, true), (&paths.staging_dir, false)] {
        let candidate = dir.join(name);
        if candidate.is_file() {
            fs::remove_file(&candidate)?;
            return Ok(DeleteOutcome::Removed { active });
        }
    }
    Ok(DeleteOutcome::NotFound)
}

pub(crate) fn move_file(src: &Path, dst: &Path) -> Result<(), ModError> {
    if dst.exists() {
        if file_digest(src)? == file_digest(dst)? {
            // Identical bytes already in place; dropping the source copy
            // completes the move without overwriting anything.
            fs::remove_file(src)?;
            return Ok(());
        }
        return Err(ModError::Conflict {
            dest: dst.to_path_buf(),
        });
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            // Cross-device rename fails; degrade to copy + delete.
            fs::copy(src, dst)?;
            fs::remove_file(src)?;
            Ok(())
        }
    }
}

pub(crate) fn file_digest(path: &Path) -> Result<blake3::Hash, ModError> {
    let mut hasher = blake3::Hasher::new();
    let mut file = fs::File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize())
}
