use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;

use ladder_engine::{AuditReport, Ladder, LogAuditor, RecordedMatch};
use ladder_log::{LogConfig, Transaction, TransactionKind, TransactionLog};
use ladder_server::{LadderServer, ServerConfig};
use ladder_types::{MatchOutcome, Player};

use crate::cli::*;

const DEFAULT_LOG: &str = "data/transaction_log.jsonl";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let open = || open_ladder(cli.log.as_deref());
    match cli.command {
        Command::Players => cmd_players(&open()?, format),
        Command::Add(args) => cmd_add(&open()?, args, format),
        Command::Remove(args) => cmd_remove(&open()?, args, format),
        Command::Match(args) => cmd_match(&open()?, args, format),
        Command::Invalidate(args) => cmd_invalidate(&open()?, args, format),
        Command::Recent(args) => cmd_recent(&open()?, args, format),
        Command::Log(args) => cmd_log(&open()?, args, format),
        Command::Verify => cmd_verify(log_path(cli.log.as_deref()), format),
        Command::Serve(args) => cmd_serve(args, cli.log.clone()),
    }
}

fn log_path(log: Option<&Path>) -> &Path {
    log.unwrap_or(Path::new(DEFAULT_LOG))
}

fn open_ladder(log: Option<&Path>) -> anyhow::Result<Ladder> {
    let path = log_path(log);
    Ladder::open(path, LogConfig::default())
        .with_context(|| format!("failed to open ladder log {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_players(ladder: &Ladder, format: OutputFormat) -> anyhow::Result<()> {
    let players = ladder.list_players()?;
    match format {
        OutputFormat::Json => print_json(&players),
        OutputFormat::Text => {
            if players.is_empty() {
                println!("The ladder is empty.");
            }
            for p in &players {
                print_player(p);
            }
            Ok(())
        }
    }
}

fn print_player(p: &Player) {
    let rank = format!("{:>3}.", p.rank);
    let rank = if p.rank == 1 { rank.yellow().bold() } else { rank.bold() };
    println!("{} {}  {}", rank, p.name, p.id.to_string().dimmed());
}

fn cmd_add(ladder: &Ladder, args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let player = ladder.add_player(&args.name, args.id.map(Into::into))?;
    match format {
        OutputFormat::Json => print_json(&player),
        OutputFormat::Text => {
            println!(
                "{} Added {} at rank {}",
                "✓".green().bold(),
                player.name.bold(),
                player.rank
            );
            println!("  Id: {}", player.id.to_string().cyan());
            Ok(())
        }
    }
}

fn cmd_remove(ladder: &Ladder, args: RemoveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let tx = ladder.remove_player(&args.id.as_str().into())?;
    match format {
        OutputFormat::Json => print_json(&json!({ "transaction_id": tx })),
        OutputFormat::Text => {
            println!("{} Removed {}", "✓".green().bold(), args.id.bold());
            println!("  Transaction: {}", tx.to_string().yellow());
            Ok(())
        }
    }
}

fn cmd_match(ladder: &Ladder, args: MatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = MatchOutcome {
        side_a: args.side_a.into(),
        side_b: args.side_b.into(),
        winner: args.winner.into(),
        set_scores: args.sets,
    };
    let summary = describe_match(&outcome);
    let tx = ladder.record_match(outcome)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "transaction_id": tx })),
        OutputFormat::Text => {
            println!("{} Match recorded: {}", "✓".green().bold(), summary);
            println!("  Transaction: {}", tx.to_string().yellow());
            Ok(())
        }
    }
}

fn cmd_invalidate(
    ladder: &Ladder,
    args: InvalidateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let tx = ladder.invalidate_match(args.transaction)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "target": args.transaction,
            "transaction_id": tx,
        })),
        OutputFormat::Text => {
            println!(
                "{} Match {} invalidated",
                "✓".green().bold(),
                args.transaction.short_id().yellow()
            );
            println!("  Transaction: {}", tx.to_string().yellow());
            Ok(())
        }
    }
}

fn cmd_recent(ladder: &Ladder, args: RecentArgs, format: OutputFormat) -> anyhow::Result<()> {
    let matches = ladder.list_recent_matches(args.limit)?;
    match format {
        OutputFormat::Json => print_json(&matches),
        OutputFormat::Text => {
            if matches.is_empty() {
                println!("No matches recorded.");
            }
            for m in &matches {
                print_recorded_match(m);
            }
            Ok(())
        }
    }
}

fn print_recorded_match(m: &RecordedMatch) {
    println!(
        "{}  {}  {}",
        m.transaction_id.short_id().yellow(),
        m.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        describe_match(&m.outcome)
    );
}

fn describe_match(outcome: &MatchOutcome) -> String {
    let loser = outcome
        .loser()
        .map(ToString::to_string)
        .unwrap_or_else(|| "?".into());
    let sets: Vec<String> = outcome.set_scores.iter().map(ToString::to_string).collect();
    format!(
        "{} beat {} ({})",
        outcome.winner.to_string().bold(),
        loser,
        sets.join(", ")
    )
}

fn cmd_log(ladder: &Ladder, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let history = ladder.history(args.limit)?;
    match format {
        OutputFormat::Json => print_json(&history),
        OutputFormat::Text => {
            for tx in &history {
                print_transaction(tx);
            }
            Ok(())
        }
    }
}

fn print_transaction(tx: &Transaction) {
    let detail = match &tx.kind {
        TransactionKind::AddPlayer(p) => format!("{} ({})", p.name, p.player_id),
        TransactionKind::RemovePlayer(p) => p.player_id.to_string(),
        TransactionKind::MatchResult(m) => describe_match(m),
        TransactionKind::InvalidateMatch(p) => format!("withdraws {}", p.target.short_id()),
    };
    println!(
        "{}  {}  {:<16} {}",
        tx.id.short_id().yellow(),
        tx.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        tx.tx_type().to_string().cyan(),
        detail
    );
}

/// Audits the raw log rather than going through [`Ladder`], which refuses
/// to open a log whose tail is unreadable.
fn cmd_verify(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let log = TransactionLog::open(path, LogConfig::default())
        .with_context(|| format!("failed to open ladder log {}", path.display()))?;
    let report = LogAuditor::audit(&log)?;
    match format {
        OutputFormat::Json => print_json(&audit_json(&report))?,
        OutputFormat::Text => print_audit(&report),
    }
    if !report.is_valid() {
        bail!("transaction log failed verification");
    }
    Ok(())
}

fn audit_json(report: &AuditReport) -> serde_json::Value {
    json!({
        "valid": report.is_valid(),
        "records": report.record_count,
        "matches": report.match_count,
        "invalidations": report.invalidation_count,
        "holes": report.holes,
        "tail_error": report.tail_error,
        "violations": report.violations.iter().map(|v| json!({
            "offset": v.offset,
            "transaction": v.transaction,
            "kind": format!("{:?}", v.kind),
            "description": v.description,
        })).collect::<Vec<_>>(),
    })
}

fn print_audit(report: &AuditReport) {
    if report.is_valid() {
        println!("{} Transaction log verified", "✓".green().bold());
    } else {
        println!("{} Transaction log has problems", "✗".red().bold());
    }
    println!(
        "  Records: {} ({} matches, {} invalidations)",
        report.record_count.to_string().bold(),
        report.match_count,
        report.invalidation_count
    );
    if let Some(err) = &report.tail_error {
        println!("  Tail: {}", err.red());
    } else {
        println!("  Tail: {}", "readable".green());
    }
    for offset in &report.holes {
        println!("  {} unreadable line at byte {}", "!".yellow(), offset);
    }
    for v in &report.violations {
        println!(
            "  {} {:?} at byte {}: {}",
            "✗".red(),
            v.kind,
            v.offset,
            v.description
        );
    }
}

fn cmd_serve(args: ServeArgs, log: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(path) = log {
        config.log.path = path;
    }

    let server = LadderServer::open(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}
