use crate::error::ModError;
use crate::game::{self, GamePaths};
use crate::toggle::{file_digest, move_file};
use filetime::{set_file_mtime, FileTime};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use time::{Date, Month, PrimitiveDateTime, Time as TimeOfDay};
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub archives: usize,
    pub failures: Vec<ImportFailure>,
}

#[derive(Debug)]
pub struct ImportFailure {
    pub archive: String,
    pub error: ModError,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// Each archive extracts into staging/<stem>/, then every plugin file found
// anywhere under it is flattened into the staging top level. Whatever else
// the archive shipped stays behind in the extraction folder.
pub fn import_archives(paths: &GamePaths, source_dir: &Path) -> Result<ImportReport, ModError> {
    let mut archives = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if game::is_archive_file(&path) {
            archives.push(path);
        }
    }
    archives.sort();

    let mut report = ImportReport::default();
    for archive in archives {
        match import_one(paths, &archive, &mut report) {
            Ok(()) => report.archives += 1,
            Err(error) => report.failures.push(ImportFailure {
                archive: display_label(&archive),
                error,
            }),
        }
    }
    Ok(report)
}

fn import_one(
    paths: &GamePaths,
    archive: &Path,
    report: &mut ImportReport,
) -> Result<(), ModError> {
    let stem = archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let extract_dir = paths.staging_dir.join(stem);
    fs::create_dir_all(&extract_dir)?;
    extract_zip(archive, &extract_dir)?;

    let mut payloads: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(&extract_dir).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && game::is_plugin_file(entry.path()) {
            payloads.push(entry.path().to_path_buf());
        }
    }
    payloads.sort();

    for path in payloads {
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            continue;
        };
        let dest = paths.staging_dir.join(&name);
        move_file(&path, &dest)?;
        report.imported.push(name);
    }
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ModError> {
    let zip_err = |err: zip::result::ZipError| ModError::Archive {
        archive: archive.to_path_buf(),
        reason: err.to_string(),
    };

    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(zip_err)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(zip_err)?;
        let Some(rel_path) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest.join(rel_path);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if out_path.exists() {
            // Re-extracting the same archive is harmless; anything else
            // stops before clobbering what is already there.
            let mut hasher = blake3::Hasher::new();
            io::copy(&mut entry, &mut hasher)?;
            if hasher.finalize() == file_digest(&out_path)? {
                continue;
            }
            return Err(ModError::Conflict { dest: out_path });
        }
        let mut out_file = fs::File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
        if let Some(dt) = entry.last_modified() {
            if let Some(mtime) = zip_time_to_unix(dt) {
                let _ = set_file_mtime(&out_path, FileTime::from_unix_time(mtime, 0));
            }
        }
    }

    Ok(())
}

fn zip_time_to_unix(dt: zip::DateTime) -> Option<i64> {
    let month = Month::try_from(dt.month()).ok()?;
    let date = Date::from_calendar_date(dt.year() as i32, month, dt.day()).ok()?;
    let time = TimeOfDay::from_hms(dt.hour(), dt.minute(), dt.second()).ok()?;
    let datetime = PrimitiveDateTime::new(date, time).assume_utc();
    Some(datetime.unix_timestamp())
}

fn display_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
