//! locally CLI - fetch, verify and unpack pinned dependencies
//!
//! Usage:
//!   locally [bootstrap]               Fetch, unpack and run build stages
//!   locally fetch                     Fetch and verify only
//!   locally unpack                    Fetch and unpack, no build stages
//!   locally hash <file>               Print a file's integrity record
//!   locally verify <file> <record>    Check a file against a record
//!   locally run <command>             Run a command, keeping the output tail

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use locally::core::config::{self, Config, SettingsToml};
use locally::core::output;
use locally::helpers::internal::hash::{self, HashAlgorithm, IntegrityRecord};
use locally::{FetchOutcome, Manifest, Orchestrator, ProcessRunner, UnpackOutcome};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "locally")]
#[command(about = "Fetch, verify and unpack pinned binary dependencies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the manifest
    #[arg(short, long, global = true, env = "LOCALLY_MANIFEST", default_value = "locally.toml")]
    manifest: PathBuf,

    /// Cache root (overrides the manifest setting)
    #[arg(long, global = true, env = "LOCALLY_CACHE")]
    cache: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Reject archive entries that would escape their target directory
    #[arg(long, global = true)]
    strict_paths: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, unpack and run every build stage (default)
    Bootstrap,

    /// Fetch and verify dependencies only
    Fetch,

    /// Fetch and unpack dependencies, no build stages
    Unpack,

    /// Print the integrity record of a file
    Hash {
        file: PathBuf,

        /// sha1, sha256 or sha512
        #[arg(short, long, default_value = "sha1")]
        algorithm: String,
    },

    /// Verify a file against an integrity record
    Verify {
        file: PathBuf,

        /// "<hex-digest> <size>"
        record: String,
    },

    /// Run a shell command, keeping only the last lines of its output
    Run {
        /// Lines of output to keep
        #[arg(long, default_value_t = 20000)]
        max_lines: usize,

        command: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Bootstrap) {
        Commands::Bootstrap => {
            let (config, manifest) = load(&cli)?;
            Orchestrator::new(&config, &manifest).bootstrap()?;
        }

        Commands::Fetch => {
            let (config, manifest) = load(&cli)?;
            let outcomes = Orchestrator::new(&config, &manifest).fetch()?;
            if !config.quiet {
                let downloaded = outcomes
                    .iter()
                    .filter(|o| matches!(o, FetchOutcome::Downloaded | FetchOutcome::DownloadedUnchecked))
                    .count();
                output::success(&format!(
                    "{} dependencies ready, {} downloaded",
                    outcomes.len(),
                    downloaded
                ));
            }
        }

        Commands::Unpack => {
            let (config, manifest) = load(&cli)?;
            let outcomes = Orchestrator::new(&config, &manifest).unpack()?;
            if !config.quiet {
                let extracted = outcomes
                    .iter()
                    .filter(|o| **o == UnpackOutcome::Extracted)
                    .count();
                output::success(&format!(
                    "{} dependencies unpacked, {} already in place",
                    extracted,
                    outcomes.len() - extracted
                ));
            }
        }

        Commands::Hash { file, algorithm } => {
            let algorithm: HashAlgorithm = algorithm.parse().map_err(anyhow::Error::msg)?;
            let record = hash::compute_with(file, algorithm, cli.quiet)
                .with_context(|| format!("Failed to hash {}", file.display()))?;
            println!("{}", record);
        }

        Commands::Verify { file, record } => {
            let expected: IntegrityRecord = record.parse().map_err(anyhow::Error::msg)?;
            hash::verify(file, &expected)?;
            if !cli.quiet {
                output::success(&format!("{} hash/size ok", file.display()));
            }
        }

        Commands::Run { max_lines, command } => {
            let result = ProcessRunner::new(command.as_str()).run_capture_limited(*max_lines)?;
            print!("{}", result.output);
            if !result.success {
                bail!("command exited with code {}: {}", result.exit_code, result.command);
            }
        }
    }

    Ok(())
}

/// Load the manifest and merge every settings layer into a `Config`.
fn load(cli: &Cli) -> Result<(Config, Manifest)> {
    let manifest_path = std::path::absolute(&cli.manifest)
        .with_context(|| format!("Failed to resolve {}", cli.manifest.display()))?;
    let manifest = Manifest::load(&manifest_path)?;

    let mut settings = match config::user_settings_path() {
        Some(path) => config::load_settings_file(&path)?,
        None => SettingsToml::default(),
    };
    settings.merge(manifest.settings.clone());

    let mut config = Config::from_settings(manifest.workspace_root(), settings);
    apply_overrides(&mut config, cli, &std::env::current_dir()?);
    Ok((config, manifest))
}

/// Command-line flags win over every settings file.
fn apply_overrides(config: &mut Config, cli: &Cli, cwd: &Path) {
    if let Some(cache) = &cli.cache {
        config.cache_root = cwd.join(cache);
    }
    if cli.quiet {
        config.quiet = true;
    }
    if cli.strict_paths {
        config.strict_paths = true;
    }
}
