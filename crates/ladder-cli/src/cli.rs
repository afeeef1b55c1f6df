use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use ladder_types::{SetScore, TransactionId};

#[derive(Parser)]
#[command(
    name = "ladder",
    about = "Squash ladder: standings, matches, and the transaction log behind them",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Transaction log file [default: data/transaction_log.jsonl]
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the current standings
    Players,
    /// Add a player at the bottom of the ladder
    Add(AddArgs),
    /// Remove a player
    Remove(RemoveArgs),
    /// Record a finished match
    Match(MatchArgs),
    /// Withdraw a recorded match
    Invalidate(InvalidateArgs),
    /// List recent matches, newest first
    Recent(RecentArgs),
    /// Show raw transactions, newest first
    Log(LogArgs),
    /// Check every record in the log against the ranking rules
    Verify,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct AddArgs {
    pub name: String,
    /// Player id; generated when omitted
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Args)]
pub struct MatchArgs {
    pub side_a: String,
    pub side_b: String,
    #[arg(long)]
    pub winner: String,
    /// Set scores as `A-B`, with `D` marking a default (e.g. `11-5 4-D`)
    #[arg(required = true)]
    pub sets: Vec<SetScore>,
}

#[derive(Args)]
pub struct InvalidateArgs {
    pub transaction: TransactionId,
}

#[derive(Args)]
pub struct RecentArgs {
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_players() {
        let cli = Cli::try_parse_from(["ladder", "players"]).unwrap();
        assert!(matches!(cli.command, Command::Players));
        assert!(cli.log.is_none());
    }

    #[test]
    fn parse_add_with_id() {
        let cli = Cli::try_parse_from(["ladder", "add", "Alice Smith", "--id", "alice"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.name, "Alice Smith");
            assert_eq!(args.id.as_deref(), Some("alice"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_match() {
        let cli = Cli::try_parse_from([
            "ladder", "match", "alice", "bob", "--winner", "bob", "5-11", "11-9", "4-D",
        ])
        .unwrap();
        if let Command::Match(args) = cli.command {
            assert_eq!(args.side_a, "alice");
            assert_eq!(args.winner, "bob");
            assert_eq!(args.sets.len(), 3);
            assert!(args.sets[2].b_default);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn match_needs_sets() {
        assert!(Cli::try_parse_from(["ladder", "match", "a", "b", "--winner", "a"]).is_err());
        assert!(Cli::try_parse_from(["ladder", "match", "a", "b", "--winner", "a", "eleven"]).is_err());
    }

    #[test]
    fn parse_invalidate_rejects_bad_id() {
        assert!(Cli::try_parse_from(["ladder", "invalidate", "nope"]).is_err());
        let id = TransactionId::new().to_string();
        assert!(Cli::try_parse_from(["ladder", "invalidate", id.as_str()]).is_ok());
    }

    #[test]
    fn parse_recent_limit() {
        let cli = Cli::try_parse_from(["ladder", "recent", "-n", "3"]).unwrap();
        if let Command::Recent(args) = cli.command {
            assert_eq!(args.limit, 3);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["ladder", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "ladder", "--verbose", "--format", "json", "--log", "/tmp/l.jsonl", "verify",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.log, Some(PathBuf::from("/tmp/l.jsonl")));
    }
}
