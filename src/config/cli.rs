use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "fare-scout")]
#[command(about = "Search flight offers across date combinations and report the cheapest ones")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "fare-scout.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// List the search combinations without calling any API
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report to stdout instead of sending it
    #[arg(long)]
    pub no_notify: bool,
}
