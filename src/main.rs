use anyhow::Result;
use clap::{Parser, Subcommand};

mod charm;
mod cmd;
mod store;
mod utils;

use cmd::ShowArgs;

/// charm - inspect charms and bundles published to the charm store
///
/// Command layout:
///   charm show <id> [FIELD ...] [--channel C] [--format tabular|yaml|json]
///   charm show <id> --all
///   charm show --list
///
/// Global flags / env:
///   -v / -vv          Increase verbosity (logs go to stderr)
///   -q / --quiet      Errors only
///   --server URL      Charm store URL (or JUJU_CHARMSTORE env)
///   JUJU_COOKIEFILE   Cookie file (default: ~/.charm-cookies.json)
///
/// Examples:
///   charm show trusty/wordpress
///   charm show wordpress --channel edge
///   charm show wordpress charm-metadata charm-config
///   charm show cs:~bob/xenial/haproxy-12 --all --format json
#[derive(Parser, Debug)]
#[command(
    name = "charm",
    version,
    author,
    about = "charm - inspect charms and bundles published to the charm store",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Charm store URL
    #[arg(long = "server", global = true, value_name = "URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print information on a charm or bundle
    Show(ShowArgs),
}

/// Non-empty environment variable.
fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    // Effective store URL (CLI flag > JUJU_CHARMSTORE env > default)
    let server = cli.server.clone().or_else(|| env_nonempty("JUJU_CHARMSTORE"));
    let cookie_file = store::jar::CookieJar::default_path(env_nonempty("JUJU_COOKIEFILE"));

    match cli.command {
        Commands::Show(mut args) => {
            args.server_url = server;
            args.cookie_file = cookie_file;
            cmd::execute_show(args)
        }
    }
}
