//! oni-sitemap - build and publish sitemaps for a newspaper archive.

use anyhow::Result;
use clap::{Parser, Subcommand};
use oni_sitemap::cli::{build_cmd, output, status_cmd};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oni-sitemap", version, about = "Sitemap generator for digitized-newspaper archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only print errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Print per-file detail and debug logs.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Machine-readable output on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild every sitemap and publish the new tree.
    Build(build_cmd::BuildArgs),
    /// Show what is currently published.
    Status(status_cmd::StatusArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Output helpers read these flags from the environment.
    if cli.quiet {
        std::env::set_var(output::ENV_QUIET, "1");
    }
    if cli.verbose {
        std::env::set_var(output::ENV_VERBOSE, "1");
    }
    if cli.json {
        std::env::set_var(output::ENV_JSON, "1");
    }
    if cli.no_color {
        std::env::set_var(output::ENV_NO_COLOR, "1");
    }

    init_tracing(&cli);

    match cli.command {
        Command::Build(args) => build_cmd::run(args).await,
        Command::Status(args) => status_cmd::run(args).await,
    }
}

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("oni_sitemap={level}")
}

fn init_tracing(cli: &Cli) {
    // RUST_LOG, when set, replaces the default entirely.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(cli.verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
