use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "assetsync", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file (default: ./assetsync.toml if present)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log fetch diagnostics at info level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run one pass: full refresh if requested, then periodic assets
    #[command(alias = "s", name = "sync")]
    Sync,
    /// Fetch every manifest entry and reconcile the mirror
    #[command(alias = "r", name = "refresh")]
    Refresh,
    /// Conditionally fetch a single file
    #[command(alias = "f", name = "fetch")]
    Fetch(FetchArg),
    /// Delete files the manifest does not name
    #[command(name = "reconcile")]
    Reconcile,
    /// Print the persisted fetch records
    #[command(alias = "st", name = "status")]
    Status,
}

#[derive(Args, Clone, Debug)]
pub struct FetchArg {
    /// Local file to keep up to date
    pub local: PathBuf,
    /// Remote URL to fetch from
    pub url: String,
    /// Minimum time between checks, e.g. "1 week"; empty checks every time
    #[arg(long, short, default_value = "")]
    pub max_age: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_valid() {
        App::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let app = App::parse_from([
            "assetsync",
            "--verbose",
            "fetch",
            "/www/rb_srvrs.json",
            "https://example.com/servers.json",
            "--max-age",
            "4 weeks",
        ]);
        assert!(app.verbose);
        match app.cmd {
            Commands::Fetch(arg) => {
                assert_eq!(arg.local, PathBuf::from("/www/rb_srvrs.json"));
                assert_eq!(arg.max_age, "4 weeks");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
