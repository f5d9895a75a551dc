//! CLI command definitions, routing, and tracing setup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docsetbuilder_core::assembler::DocsetLayout;
use docsetbuilder_core::pipeline::{BuildReport, BuildState, ProgressReporter};
use docsetbuilder_plugins::PluginRegistry;
use docsetbuilder_shared::{BuildConfig, DocsetConfig, init_config, load_config, load_config_from};
use docsetbuilder_storage::SearchIndex;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docsetbuilder — assemble Dash/Zeal docsets from plugin output.
#[derive(Parser)]
#[command(
    name = "docsetbuilder",
    version,
    about = "Assemble searchable Dash/Zeal docsets from documentation plugins.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the configured plugins and assemble the docset.
    Build {
        /// Config file (defaults to ./docset.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run every step except copying plugin content.
        #[arg(long)]
        dry_run: bool,

        /// Argument passed through to plugins (key=value, repeatable).
        #[arg(long = "arg", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },

    /// Look up entries in a built docset's search index.
    Search {
        /// Path to a `.docset` directory or a `docSet.dsidx` file.
        docset: PathBuf,

        /// Entry name.
        name: String,

        /// Restrict to one entry type.
        #[arg(short = 't', long = "type")]
        entry_type: Option<String>,
    },

    /// List the available plugins.
    Plugins,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a starter docset.toml into the current directory.
    Init,
    /// Show the resolved build configuration.
    Show {
        /// Config file (defaults to ./docset.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docsetbuilder=info",
        1 => "docsetbuilder=debug",
        _ => "docsetbuilder=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            config,
            dry_run,
            args,
        } => cmd_build(config.as_deref(), dry_run, args.into_iter().collect()).await,
        Command::Search {
            docset,
            name,
            entry_type,
        } => cmd_search(&docset, &name, entry_type.as_deref()).await,
        Command::Plugins => cmd_plugins(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
        },
    }
}

fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| eyre!("cannot determine working directory: {e}"))
}

fn read_config(working_dir: &Path, path: Option<&Path>) -> Result<DocsetConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config(working_dir)?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(
    config_path: Option<&Path>,
    dry_run: bool,
    cli_args: BTreeMap<String, String>,
) -> Result<()> {
    let cwd = working_dir()?;
    let config = read_config(&cwd, config_path)?;
    let registry = PluginRegistry::new();
    let plugins = registry.instantiate(&config.plugins)?;
    let build = BuildConfig::resolve(&config, &cwd)?
        .with_dry_run(dry_run)
        .with_cli_args(cli_args);

    info!(
        identifier = %build.identifier,
        plugins = plugins.len(),
        dry_run,
        "building docset"
    );

    let reporter = CliProgress::new(plugins.len());
    let report = docsetbuilder_core::build_docset(&build, &plugins, &reporter).await?;

    println!();
    if report.dry_run {
        println!("  Dry run complete (plugin content was not copied).");
    } else {
        println!("  Docset built successfully!");
    }
    println!("  Path:       {}", report.docset_path.display());
    println!("  Index:      {}", report.index_path);
    println!("  Entries:    {}", report.entry_count);
    println!("  Rows:       {}", report.search_rows.inserted);
    println!("  References: {}", report.references);
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_search(docset: &Path, name: &str, entry_type: Option<&str>) -> Result<()> {
    let db_path = if docset.is_file() {
        docset.to_path_buf()
    } else {
        DocsetLayout::from_root(docset).search_index
    };

    let index = SearchIndex::open_readonly(&db_path).await?;
    let rows = index.lookup(name, entry_type).await?;
    info!(name, entry_type = entry_type.unwrap_or("*"), matches = rows.len(), "search complete");

    if rows.is_empty() {
        return Err(eyre!("no entry named '{name}' in {}", db_path.display()));
    }
    for row in rows {
        println!("{:<12} {:<32} {}", row.entry_type, row.name, row.path);
    }
    Ok(())
}

fn cmd_plugins() -> Result<()> {
    let registry = PluginRegistry::new();
    for (name, description) in registry.describe() {
        println!("  {name:<10} {description}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config(&working_dir()?)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let cwd = working_dir()?;
    let config = read_config(&cwd, config_path)?;
    let build = BuildConfig::resolve(&config, &cwd)?;
    println!("{}", serde_json::to_string_pretty(&build)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    plugin_count: usize,
}

impl CliProgress {
    fn new(plugin_count: usize) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            plugin_count,
        }
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, state: &BuildState) {
        match state {
            BuildState::Pending => {}
            BuildState::Running { index, plugin } => {
                self.spinner.set_message(format!(
                    "Running plugin [{}/{}] {plugin}",
                    index + 1,
                    self.plugin_count
                ));
            }
            BuildState::Completed | BuildState::Failed => self.spinner.finish_and_clear(),
        }
    }

    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_args() {
        assert_eq!(
            parse_key_val("version=1.2.3").unwrap(),
            ("version".to_string(), "1.2.3".to_string())
        );
        assert_eq!(
            parse_key_val("flag=").unwrap(),
            ("flag".to_string(), String::new())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::try_parse_from([
            "docsetbuilder",
            "-vv",
            "build",
            "--dry-run",
            "--arg",
            "a=1",
            "--arg",
            "b=2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Build { dry_run, args, config } => {
                assert!(dry_run);
                assert!(config.is_none());
                assert_eq!(args.len(), 2);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn cli_parses_search() {
        let cli = Cli::try_parse_from([
            "docsetbuilder",
            "search",
            "out/mylib.docset",
            "Foo",
            "--type",
            "Class",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        match cli.command {
            Command::Search { entry_type, name, .. } => {
                assert_eq!(name, "Foo");
                assert_eq!(entry_type.as_deref(), Some("Class"));
            }
            _ => panic!("expected search"),
        }
    }
}
