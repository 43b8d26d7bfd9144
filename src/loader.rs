use anyhow::{Context, Result};
use std::{fs, io, path::Path, time::Duration};

const BEPINEX_URL: &str = "https://builds.bepinex.dev/projects/bepinex_be/666/BepInEx-Unity.IL2CPP-win-x64-6.0.0-be.666%2Bc8aedd5.zip";
const USER_AGENT: &str = "PlugSmith";

// One-shot loader install: fetch the pinned BepInEx build and unpack it over
// the game folder. The game has to run once afterwards to finish setup.
pub fn install_loader(game_root: &Path) -> Result<()> {
    fs::create_dir_all(game_root).context("create game folder")?;
    let archive_path = game_root.join("BepInEx.zip");
    download(BEPINEX_URL, &archive_path)?;
    let result = extract_in_place(&archive_path, game_root);
    let _ = fs::remove_file(&archive_path);
    result
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(Duration::from_secs(60))
        .timeout_write(Duration::from_secs(60))
        .build();
    let response = agent
        .get(url)
        .set("User-Agent", USER_AGENT)
        .call()
        .context("download loader archive")?;
    let mut reader = response.into_reader();
    let mut file = fs::File::create(dest).context("create loader archive")?;
    io::copy(&mut reader, &mut file).context("write loader archive")?;
    Ok(())
}

// Reinstalls are expected, so existing files are overwritten here.
fn extract_in_place(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive).context("open loader archive")?;
    let mut zip = zip::ZipArchive::new(file).context("read loader archive")?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).context("read loader entry")?;
        let Some(rel_path) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest.join(rel_path);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).context("create loader dir")?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).context("create loader dir")?;
        }
        let mut out_file = fs::File::create(&out_path).context("write loader entry")?;
        io::copy(&mut entry, &mut out_file).context("extract loader entry")?;
    }

    Ok(())
}
