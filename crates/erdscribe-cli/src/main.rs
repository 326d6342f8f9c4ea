use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use erdscribe_core::{
    to_dbml, to_ddl, to_summary_markdown, Config, DialectConfig, ExtractionMode, NormalizeReport, Schema,
};
use erdscribe_engine::{Extractor, Refiner};

mod scanner;
mod watch;

use scanner::{ScanResult, Scanner};
use watch::SourceWatcher;

const DEFAULT_CONFIG_FILE: &str = "erdscribe.toml";
const DEFAULT_DDL_FILE: &str = "schema.sql";
const JSON_FILE: &str = "schema.json";

/// erdscribe - ER diagrams from JPA entity sources
#[derive(Parser)]
#[command(name = "erdscribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: erdscribe.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the schema of a repository and write DBML and Markdown
    Erd {
        /// Repository root
        repo: PathBuf,

        /// Extraction mode: static or oracle
        #[arg(short, long)]
        mode: Option<ExtractionMode>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write SQL DDL
        #[arg(long)]
        ddl: bool,

        /// DDL dialect: ansi, postgres or mysql
        #[arg(short, long)]
        dialect: Option<DialectConfig>,

        /// Also dump the normalized schema as JSON
        #[arg(long)]
        json: bool,

        /// Send the extracted schema through the oracle for correction
        #[arg(long)]
        refine: bool,

        /// Keep running and regenerate when Java sources change
        #[arg(short, long)]
        watch: bool,
    },

    /// List the candidate files of a repository
    Scan {
        /// Repository root
        repo: PathBuf,

        /// Print the candidates as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::InitConfig { output, force } = &cli.command {
        return init_config_command(output, *force, cli.verbose);
    }

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Erd {
            repo,
            mode,
            out,
            ddl,
            dialect,
            json,
            refine,
            watch,
        } => {
            let mut config = config;
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if let Some(out) = out {
                config.output.dir = out;
            }
            if let Some(dialect) = dialect {
                config.dialect = dialect;
            }
            if ddl && config.output.ddl_file.is_none() {
                config.output.ddl_file = Some(DEFAULT_DDL_FILE.to_string());
            }
            let options = ErdOptions { json, refine };
            if watch {
                watch_command(&config, &repo, options, cli.verbose).await
            } else {
                erd_command(&config, &repo, options, cli.verbose).await
            }
        }
        Commands::Scan { repo, json } => scan_command(&config, &repo, json, cli.verbose),
        Commands::InitConfig { .. } => Ok(()),
    }
}

/// Log to stderr; `RUST_LOG` wins over the verbosity default
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Explicit path, then `erdscribe.toml` in the working directory, then defaults.
/// Environment variables are applied on top.
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    config.apply_env()?;

    if verbose {
        eprintln!("{} mode: {:?}, dialect: {:?}", "Using".cyan(), config.mode, config.dialect);
    }

    Ok(config)
}

/// Per-run switches of the erd command
#[derive(Debug, Clone, Copy, Default)]
struct ErdOptions {
    json: bool,
    refine: bool,
}

/// Erd command - scan, extract, refine, normalize, write artifacts
async fn erd_command(config: &Config, repo: &Path, options: ErdOptions, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Scanning repository:".cyan(), repo.display());
    }

    let scanner = Scanner::open(repo, &config.scan)?;
    let scan = scanner.scan();
    if scan.is_empty() {
        eprintln!("{}", "No JPA entity candidates found".yellow());
    }

    let files = scanner.load(&scan.all());
    if verbose {
        eprintln!(
            "{} {} files ({} entities, {} enums, {} embeddables, {} superclasses)",
            "Extracting from".cyan(),
            files.len(),
            scan.entities.len(),
            scan.enums.len(),
            scan.embeddables.len(),
            scan.superclasses.len()
        );
    }

    // Fails before any network call when the oracle is needed but not configured
    let extractor = Extractor::from_config(config)?;
    let (schema, report) = if options.refine {
        let refiner = Refiner::from_config(config)?;
        extractor.run_refined(&files, &refiner).await?
    } else {
        extractor.run(&files).await?
    };

    let written = write_artifacts(config, &schema, options.json)?;
    print_run_summary(&schema, &report, extractor.name(), &written);

    Ok(())
}

/// Watch command - run once, then again after every burst of Java changes
///
/// Failures after the first run are reported and the watch continues.
async fn watch_command(config: &Config, repo: &Path, options: ErdOptions, verbose: bool) -> Result<()> {
    let mut watcher = SourceWatcher::start(repo)?;
    erd_command(config, repo, options, verbose).await?;
    println!("{} {} (Ctrl-C to stop)", "Watching".cyan().bold(), repo.display());

    loop {
        tokio::select! {
            changed = watcher.next_change() => {
                let Some(paths) = changed else { break };
                println!("{} {} Java file(s) changed", "↻".cyan(), paths.len());
                if verbose {
                    for path in &paths {
                        eprintln!("  {}", path.display());
                    }
                }
                if let Err(e) = erd_command(config, repo, options, verbose).await {
                    eprintln!("{} {:#}", "Error:".red().bold(), e);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Write every configured artifact; returns the paths written
fn write_artifacts(config: &Config, schema: &Schema, json: bool) -> Result<Vec<PathBuf>> {
    let dir = &config.output.dir;
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut artifacts = vec![
        (dir.join(&config.output.dbml_file), to_dbml(schema)),
        (dir.join(&config.output.summary_file), to_summary_markdown(schema)),
    ];
    if let Some(ddl_file) = &config.output.ddl_file {
        artifacts.push((dir.join(ddl_file), to_ddl(schema, config.dialect)));
    }
    if json {
        artifacts.push((dir.join(JSON_FILE), schema.to_json()?));
    }

    let mut written = Vec::with_capacity(artifacts.len());
    for (path, contents) in artifacts {
        std::fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

/// Scan command - list candidate files without extracting
fn scan_command(config: &Config, repo: &Path, json: bool, verbose: bool) -> Result<()> {
    let scanner = Scanner::open(repo, &config.scan)?;
    if verbose {
        eprintln!("{} {} Java files", "Indexed".cyan(), scanner.file_count());
    }
    let scan = scanner.scan();

    if json {
        let paths: Vec<String> = scanner.load(&scan.all()).iter().map(|f| f.display_path()).collect();
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    print_scan_summary(&scanner, &scan);
    Ok(())
}

/// Init config command - write the default configuration
fn init_config_command(output: &Path, force: bool, verbose: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    Config::default().save_to_file(output)?;

    if verbose {
        eprintln!("{} {}", "Wrote".cyan(), output.display());
    }
    println!("{} {}", "✓ Created".green().bold(), output.display());
    Ok(())
}

fn print_scan_summary(scanner: &Scanner, scan: &ScanResult) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Candidate Files".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    let groups = [
        ("Entities", &scan.entities),
        ("Enums", &scan.enums),
        ("Embeddables", &scan.embeddables),
        ("Mapped superclasses", &scan.superclasses),
    ];

    for (title, paths) in groups {
        println!("{} ({})", title.bold(), paths.len());
        for file in scanner.load(paths) {
            println!("  - {}", file.display_path());
        }
        println!();
    }

    if scan.is_empty() {
        println!("{}", "No JPA entity candidates found".yellow());
    }
    println!("{}", "=".repeat(60).bright_blue());
}

fn print_run_summary(schema: &Schema, report: &NormalizeReport, extractor: &str, written: &[PathBuf]) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "ERD Extraction Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Extractor: {}", extractor);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Tables: {}", schema.table_count());
    println!("  Refs:   {}", schema.ref_count());
    println!("  Enums:  {}", schema.enum_count());
    println!();

    if !report.created_tables.is_empty() {
        println!(
            "  {} {}",
            "Placeholder tables:".yellow(),
            report.created_tables.join(", ")
        );
    }
    if !report.injected_keys.is_empty() {
        println!("  {} {}", "Synthetic keys:".yellow(), report.injected_keys.join(", "));
    }

    println!("{}", "Artifacts:".bold());
    for path in written {
        println!("  {} {}", "✓".green().bold(), path.display());
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_erd_arguments() {
        let cli = Cli::try_parse_from([
            "erdscribe", "erd", "./shop", "--mode", "oracle", "--dialect", "postgres", "--ddl", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Erd {
                repo,
                mode,
                dialect,
                ddl,
                json,
                refine,
                watch,
                ..
            } => {
                assert_eq!(repo, PathBuf::from("./shop"));
                assert_eq!(mode, Some(ExtractionMode::Oracle));
                assert_eq!(dialect, Some(DialectConfig::Postgres));
                assert!(ddl);
                assert!(!json);
                assert!(!refine && !watch);
            }
            _ => panic!("expected erd command"),
        }

        let cli = Cli::try_parse_from(["erdscribe", "erd", "./shop", "--refine", "--watch"]).unwrap();
        match cli.command {
            Commands::Erd { refine, watch, .. } => assert!(refine && watch),
            _ => panic!("expected erd command"),
        }

        assert!(Cli::try_parse_from(["erdscribe", "erd", "./shop", "--mode", "guess"]).is_err());
    }

    #[tokio::test]
    async fn test_erd_writes_artifacts() {
        let repo = TempDir::new().unwrap();
        let model = repo.path().join("model");
        std::fs::create_dir_all(&model).unwrap();
        std::fs::write(
            model.join("Book.java"),
            "@Entity class Book { @Id @GeneratedValue Long id; @ManyToOne Author author; }",
        )
        .unwrap();

        let out = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.dir = out.path().to_path_buf();
        config.output.ddl_file = Some(DEFAULT_DDL_FILE.to_string());

        let options = ErdOptions {
            json: true,
            refine: false,
        };
        erd_command(&config, repo.path(), options, false).await.unwrap();

        let dbml = std::fs::read_to_string(out.path().join("database.dbml")).unwrap();
        assert!(dbml.contains("Table book"));
        assert!(dbml.contains("Ref: book.author_id > author.id"));
        assert!(out.path().join("erd_summary.md").exists());
        assert!(std::fs::read_to_string(out.path().join(DEFAULT_DDL_FILE))
            .unwrap()
            .contains("CREATE TABLE"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.path().join(JSON_FILE)).unwrap()).unwrap();
        assert!(json.is_object());
    }

    #[tokio::test]
    async fn test_oracle_mode_without_credentials_writes_nothing() {
        let repo = TempDir::new().unwrap();
        std::fs::write(repo.path().join("UserEntity.java"), "class UserEntity {}").unwrap();

        let out = TempDir::new().unwrap();
        let mut config = Config::default();
        config.mode = ExtractionMode::Oracle;
        config.output.dir = out.path().join("erd");

        assert!(erd_command(&config, repo.path(), ErdOptions::default(), false).await.is_err());
        assert!(!config.output.dir.exists());
    }

    #[tokio::test]
    async fn test_refine_without_credentials_writes_nothing() {
        let repo = TempDir::new().unwrap();
        std::fs::write(repo.path().join("Tag.java"), "@Entity class Tag { String label; }").unwrap();

        let out = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.dir = out.path().join("erd");

        let options = ErdOptions {
            json: false,
            refine: true,
        };
        assert!(erd_command(&config, repo.path(), options, false).await.is_err());
        assert!(!config.output.dir.exists());
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        init_config_command(&path, false, false).unwrap();
        let written = Config::from_file(&path).unwrap();
        assert_eq!(written.output, Config::default().output);

        assert!(init_config_command(&path, false, false).is_err());
        assert!(init_config_command(&path, true, false).is_ok());
    }
}
