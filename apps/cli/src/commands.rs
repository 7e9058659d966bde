//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use wikiscribe_core::{IndexProgress, IndexReport, ToolOutput, WikiTools, index_site};
use wikiscribe_shared::{AppConfig, WikiConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// wikiscribe: read shelves, books and pages from a wiki as structured data.
#[derive(Parser)]
#[command(
    name = "wikiscribe",
    version,
    about = "Browse, search and index a BookStack-style wiki as JSON and Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Wiki base URL (overrides [wiki] base_url).
    #[arg(long, env = "WIKISCRIBE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum concurrent requests while indexing.
    #[arg(long, global = true)]
    pub concurrency: Option<u32>,

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
    /// Open any wiki URL with the matching extractor.
    Route {
        /// Shelf, book or page URL.
        url: String,
    },

    /// Read a page as Markdown.
    Read {
        /// Page URL (`{base}/books/<book>/page/<page>`).
        url: String,
    },

    /// List the pages of a book.
    Books {
        /// Book URL (`{base}/books/<book>`).
        url: String,
    },

    /// List a shelf's entries (defaults to the root shelves).
    Shelves {
        /// Shelf URL (`{base}/shelves...`).
        url: Option<String>,
    },

    /// Full-text search (at most five hits).
    Search {
        /// Search query.
        query: String,
    },

    /// Index every shelf and its books.
    Index,

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
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Target prefix match covers the binary and every wikiscribe_* crate.
    let filter = match cli.verbose {
        0 => "wikiscribe=warn",
        1 => "wikiscribe=info",
        2 => "wikiscribe=debug",
        _ => "wikiscribe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays valid JSON.
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
    match &cli.command {
        Command::Route { url } => print_output(&tools(&cli)?.route(url).await),
        Command::Read { url } => print_output(&tools(&cli)?.read_page(url).await),
        Command::Books { url } => print_output(&tools(&cli)?.list_books(url).await),
        Command::Shelves { url } => {
            print_output(&tools(&cli)?.get_shelves(url.as_deref()).await)
        }
        Command::Search { query } => print_output(&tools(&cli)?.search(query).await),
        Command::Index => cmd_index(&tools(&cli)?).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli),
        },
    }
}

fn tools(cli: &Cli) -> Result<WikiTools> {
    let config = resolved_config(cli)?;
    let config = WikiConfig::try_from(&config)?;
    info!(base = %config.base(), "using wiki");
    Ok(WikiTools::from_config(config)?)
}

/// Config file values with CLI overrides applied.
fn resolved_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = load_config()?;

    if let Some(base_url) = &cli.base_url {
        config.wiki.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.wiki.timeout_secs = timeout;
    }
    if let Some(concurrency) = cli.concurrency {
        config.wiki.concurrency = concurrency;
    }

    Ok(config)
}

fn print_output(output: &ToolOutput) -> Result<()> {
    match output {
        // Markdown reads better unquoted.
        ToolOutput::Page(markdown) => println!("{markdown}"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_index(tools: &WikiTools) -> Result<()> {
    let reporter = CliProgress::new();

    let report = index_site(tools.client(), &reporter)
        .await
        .map_err(|e| eyre!("indexing failed: {e}"))?;

    for failure in &report.errors {
        eprintln!("  skipped {}: {}", failure.url, failure.message);
    }

    print_output(&ToolOutput::Index(report.index))
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = resolved_config(cli)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl IndexProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn fetched(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetched [{current}/{total}] {url}"));
    }

    fn done(&self, report: &IndexReport) {
        self.spinner.finish_and_clear();
        eprintln!(
            "  Indexed {} entries ({} skipped)",
            report.index.len(),
            report.errors.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_shelves_without_url() {
        let cli = Cli::try_parse_from(["wikiscribe", "shelves"]).unwrap();
        assert!(matches!(cli.command, Command::Shelves { url: None }));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wikiscribe",
            "search",
            "deploy guide",
            "--base-url",
            "https://wiki.example.com",
            "--timeout",
            "5",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("https://wiki.example.com"));
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Search { ref query } if query == "deploy guide"));
    }
}
