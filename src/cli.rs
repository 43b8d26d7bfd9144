use crate::{
    config::{self, ConfigLoad, ManagerConfig},
    game::{self, GamePaths},
    importer, loader,
    registry::{self, ModEntry},
    toggle::{self, DeleteOutcome},
};
use anyhow::{bail, Result};
use serde::Serialize;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

enum CliCommand {
    List,
    Enable(Vec<String>),
    Disable(Vec<String>),
    Import(PathBuf),
    Delete { name: String, assume_yes: bool },
    Describe {
        name: String,
        description: Option<String>,
        link: Option<String>,
    },
    InstallLoader(Option<PathBuf>),
    Help,
    Version,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (format, tokens) = parse_global_options(&args);
    run_command(parse_command(&tokens)?, format)
}

fn run_command(command: CliCommand, format: OutputFormat) -> Result<()> {
    match command {
        CliCommand::Help => {
            print_help();
            return Ok(());
        }
        CliCommand::Version => {
            println!("PlugSmith v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let ConfigLoad {
        mut config,
        warning,
    } = ManagerConfig::load_or_default();
    if let Some(warning) = warning {
        eprintln!("warning: {warning}");
    }

    if let CliCommand::InstallLoader(Some(path)) = &command {
        return loader::install_loader(path);
    }

    let game_root = config::resolve_game_root(&mut config, prompt_game_root)?;
    let paths = GamePaths::resolve(&game_root);
    paths.ensure_layout()?;

    match command {
        CliCommand::List => {
            let mods = registry::scan_mods(&paths)?;
            render_mods(&mods, &config, format)
        }
        CliCommand::Enable(names) => run_toggle(&paths, names, true),
        CliCommand::Disable(names) => run_toggle(&paths, names, false),
        CliCommand::Import(dir) => {
            let report = importer::import_archives(&paths, &dir)?;
            for name in &report.imported {
                println!("imported {name}");
            }
            println!(
                "{} archive(s) processed, {} plugin(s) staged",
                report.archives,
                report.imported.len()
            );
            for failure in &report.failures {
                eprintln!("{}: {}", failure.archive, failure.error);
            }
            if !report.is_clean() {
                bail!("{} archive(s) failed", report.failures.len());
            }
            Ok(())
        }
        CliCommand::Delete { name, assume_yes } => {
            if !assume_yes && !confirm(&format!("Permanently delete {name}?")) {
                println!("aborted");
                return Ok(());
            }
            match toggle::delete_mod(&paths, &name)? {
                DeleteOutcome::Removed { active } => {
                    let where_ = if active { "plugins" } else { "staging" };
                    println!("deleted {name} from {where_}");
                }
                DeleteOutcome::NotFound => println!("{name} not found, nothing deleted"),
            }
            Ok(())
        }
        CliCommand::Describe {
            name,
            description,
            link,
        } => run_describe(&mut config, name, description, link),
        CliCommand::InstallLoader(None) => loader::install_loader(&game_root),
        // `InstallLoader(Some(_))` is handled by the early return above.
        CliCommand::InstallLoader(Some(_)) => unreachable!(),
        CliCommand::Help | CliCommand::Version => Ok(()),
    }
}

fn run_toggle(paths: &GamePaths, names: Vec<String>, want_active: bool) -> Result<()> {
    let desired: Vec<(String, bool)> = names
        .into_iter()
        .map(|name| (name, want_active))
        .collect();
    let report = toggle::apply_desired_states(paths, &desired);

    let verb = if want_active { "enabled" } else { "disabled" };
    for name in &report.moved {
        println!("{verb} {name}");
    }
    for name in &report.skipped {
        println!("skipped {name} (no file to move)");
    }
    for failure in &report.failures {
        eprintln!("{}: {}", failure.name, failure.error);
    }
    if !report.is_clean() {
        bail!("{} mod(s) failed", report.failures.len());
    }
    Ok(())
}

fn run_describe(
    config: &mut ManagerConfig,
    name: String,
    description: Option<String>,
    link: Option<String>,
) -> Result<()> {
    if description.is_none() && link.is_none() {
        println!("{name}");
        println!("  {}", config.description_for(&name));
        if let Some(link) = config.link_for(&name) {
            println!("  {link}");
        }
        return Ok(());
    }

    if let Some(description) = description {
        config.mod_descriptions.insert(name.clone(), description);
    }
    if let Some(link) = link {
        config.mod_links.insert(name.clone(), link);
    }
    config.save()?;
    println!("updated metadata for {name}");
    Ok(())
}

#[derive(Serialize)]
struct ModRow<'a> {
    name: &'a str,
    active: bool,
    description: &'a str,
    link: Option<&'a str>,
}

fn render_mods(mods: &[ModEntry], config: &ManagerConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<ModRow<'_>> = mods
                .iter()
                .map(|entry| ModRow {
                    name: &entry.name,
                    active: entry.active,
                    description: config.description_for(&entry.name),
                    link: config.link_for(&entry.name),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            if mods.is_empty() {
                println!("no mods found");
                return Ok(());
            }
            for entry in mods {
                let glyph = if entry.active { "✔" } else { "✖" };
                println!("{glyph} {}", entry.name);
                let description = config.description_for(&entry.name);
                if description != config::NO_DESCRIPTION {
                    println!("    {description}");
                }
                if let Some(link) = config.link_for(&entry.name) {
                    println!("    {link}");
                }
            }
        }
    }
    Ok(())
}

// Path-selection collaborator: env override first so headless runs never
// block, then a single stderr prompt.
fn prompt_game_root() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("PLUGSMITH_ROOT") {
        if !value.is_empty() {
            return Some(PathBuf::from(value));
        }
    }
    eprint!("Select the {} game folder: ", game::GAME_NAME);
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn confirm(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    io::stderr().flush().ok();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_global_options(args: &[String]) -> (OutputFormat, Vec<String>) {
    let mut format = OutputFormat::Text;
    let mut tokens = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--format=") {
            if let Some(parsed) = OutputFormat::parse(value) {
                format = parsed;
            }
            continue;
        }
        if arg == "--format" {
            if let Some(value) = iter.next() {
                if let Some(parsed) = OutputFormat::parse(value) {
                    format = parsed;
                }
            }
            continue;
        }
        tokens.push(arg.to_string());
    }
    (format, tokens)
}

fn parse_command(tokens: &[String]) -> Result<CliCommand> {
    let Some(head) = tokens.first() else {
        return Ok(CliCommand::Help);
    };
    match head.as_str() {
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "--version" | "-V" | "version" => Ok(CliCommand::Version),
        "list" | "ls" => Ok(CliCommand::List),
        "enable" => parse_names(&tokens[1..], "enable").map(CliCommand::Enable),
        "disable" => parse_names(&tokens[1..], "disable").map(CliCommand::Disable),
        "import" => {
            let Some(dir) = tokens.get(1) else {
                bail!("import requires a download folder path");
            };
            Ok(CliCommand::Import(PathBuf::from(dir)))
        }
        "delete" => {
            let mut name = None;
            let mut assume_yes = false;
            for token in &tokens[1..] {
                match token.as_str() {
                    "--yes" | "-y" => assume_yes = true,
                    other if name.is_none() => name = Some(other.to_string()),
                    other => bail!("unexpected argument: {other}"),
                }
            }
            let Some(name) = name else {
                bail!("delete requires a mod name");
            };
            Ok(CliCommand::Delete { name, assume_yes })
        }
        "describe" => {
            let mut name = None;
            let mut description = None;
            let mut link = None;
            let mut iter = tokens[1..].iter();
            while let Some(token) = iter.next() {
                match token.as_str() {
                    "--set" => {
                        description = Some(
                            iter.next()
                                .map(|value| value.to_string())
                                .ok_or_else(|| anyhow::anyhow!("--set requires a value"))?,
                        );
                    }
                    "--link" => {
                        link = Some(
                            iter.next()
                                .map(|value| value.to_string())
                                .ok_or_else(|| anyhow::anyhow!("--link requires a value"))?,
                        );
                    }
                    other if name.is_none() => name = Some(other.to_string()),
                    other => bail!("unexpected argument: {other}"),
                }
            }
            let Some(name) = name else {
                bail!("describe requires a mod name");
            };
            Ok(CliCommand::Describe {
                name,
                description,
                link,
            })
        }
        "install-loader" => Ok(CliCommand::InstallLoader(
            tokens.get(1).map(PathBuf::from),
        )),
        other => bail!("unknown command: {other} (try --help)"),
    }
}

fn parse_names(tokens: &[String], command: &str) -> Result<Vec<String>> {
    if tokens.is_empty() {
        bail!("{command} requires at least one mod name");
    }
    Ok(tokens.to_vec())
}

fn print_help() {
    println!("PlugSmith - BepInEx plugin manager for {}", game::GAME_NAME);
    println!();
    println!("Usage: plugsmith [--format text|json] <command>");
    println!();
    println!("Commands:");
    println!("  list                          Show all mods and their state");
    println!("  enable <mod>...               Move mods into BepInEx/plugins");
    println!("  disable <mod>...              Move mods into BepInEx/staging");
    println!("  import <folder>               Extract downloaded archives into staging");
    println!("  delete <mod> [--yes]          Permanently remove a mod file");
    println!("  describe <mod> [--set <text>] [--link <url>]");
    println!("                                Show or update a mod's metadata");
    println!("  install-loader [<folder>]     Download and unpack BepInEx");
    println!("  help, version");
    println!();
    println!("The game folder is read from the config, the PLUGSMITH_ROOT");
    println!("environment variable, or an interactive prompt, in that order.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_format_flag_is_extracted() {
        let args = vec![
            "--format".to_string(),
            "json".to_string(),
            "list".to_string(),
        ];
        let (format, tokens) = parse_global_options(&args);
        assert!(format == OutputFormat::Json);
        assert_eq!(tokens, vec!["list".to_string()]);
    }

    #[test]
    fn delete_parses_yes_flag() {
        let tokens = vec![
            "delete".to_string(),
            "Mod.dll".to_string(),
            "--yes".to_string(),
        ];
        match parse_command(&tokens).unwrap() {
            CliCommand::Delete { name, assume_yes } => {
                assert_eq!(name, "Mod.dll");
                assert!(assume_yes);
            }
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn describe_parses_set_and_link() {
        let tokens = vec![
            "describe".to_string(),
            "Mod.dll".to_string(),
            "--set".to_string(),
            "A mod".to_string(),
            "--link".to_string(),
            "https://example.com".to_string(),
        ];
        match parse_command(&tokens).unwrap() {
            CliCommand::Describe {
                name,
                description,
                link,
            } => {
                assert_eq!(name, "Mod.dll");
                assert_eq!(description.as_deref(), Some("A mod"));
                assert_eq!(link.as_deref(), Some("https://example.com"));
            }
            _ => panic!("expected describe"),
        }
    }

    #[test]
    fn empty_args_fall_back_to_help() {
        assert!(matches!(parse_command(&[]).unwrap(), CliCommand::Help));
    }

    #[test]
    fn enable_requires_names() {
        let tokens = vec!["enable".to_string()];
        assert!(parse_command(&tokens).is_err());
    }
}
