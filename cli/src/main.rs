//! tollgate: automated allow / deny / ask decisions for an AI agent's tool
//! calls, learned from how the user answers.
//!
//! Wired into the host as hooks:
//!
//!   tollgate pre-tool-use    < event.json   # decide
//!   tollgate post-tool-use   < event.json   # record outcome, maybe learn
//!   tollgate stop            < event.json   # session summary
//!
//! and managed by hand:
//!
//!   tollgate pending list | approve <id> | project <id> | dismiss <id>
//!   tollgate rules
//!   tollgate learn
//!
//! Logs go to stderr (filter with `TOLLGATE_LOG`, default `warn`); stdout
//! belongs to the hook protocol.

mod commands;
mod hook;
mod paths;
mod session;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tollgate_contracts::error::GateResult;
use tollgate_learn::Resolution;

use paths::Paths;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "tollgate",
    version,
    about = "Rule-based, self-learning approval gate for agent tool calls"
)]
struct Cli {
    /// Home directory holding the global memory bank and state.
    #[arg(long, env = "TOLLGATE_HOME", global = true)]
    home: Option<PathBuf>,

    /// Project directory holding the project memory bank.
    #[arg(long, env = "TOLLGATE_PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hook: decide on a proposed tool call read from stdin.
    PreToolUse,
    /// Hook: record that a tool call ran, and run learning every Nth call.
    PostToolUse,
    /// Hook: summarize the finished session.
    Stop,
    /// Review globally-scoped rules awaiting confirmation.
    #[command(subcommand)]
    Pending(PendingCommand),
    /// List every loaded rule in evaluation order.
    Rules,
    /// Mine the feedback log now.
    Learn,
}

#[derive(Subcommand)]
enum PendingCommand {
    /// Show the queue.
    List,
    /// Save the rule to the global learned rules.
    Approve { id: String },
    /// Save the rule to this project's learned rules only.
    Project { id: String },
    /// Drop the rule.
    Dismiss { id: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TOLLGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let is_hook = matches!(
        cli.command,
        Command::PreToolUse | Command::PostToolUse | Command::Stop
    );

    if let Err(e) = run(cli) {
        if is_hook {
            // Hooks never block the host.
            tracing::warn!(error = %e, "hook failed");
        } else {
            eprintln!("tollgate: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> GateResult<()> {
    let paths = Paths::resolve(cli.home, cli.project_dir)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::PreToolUse => commands::pre_tool_use(&paths, &read_stdin(), &mut out),
        Command::PostToolUse => commands::post_tool_use(&paths, &read_stdin(), &mut out),
        Command::Stop => commands::stop(&paths, &read_stdin()),
        Command::Pending(PendingCommand::List) => commands::pending_list(&paths, &mut out),
        Command::Pending(PendingCommand::Approve { id }) => {
            commands::pending_resolve(&paths, &id, Resolution::Global, &mut out)
        }
        Command::Pending(PendingCommand::Project { id }) => {
            commands::pending_resolve(&paths, &id, Resolution::ProjectOnly, &mut out)
        }
        Command::Pending(PendingCommand::Dismiss { id }) => {
            commands::pending_resolve(&paths, &id, Resolution::Dismiss, &mut out)
        }
        Command::Rules => commands::rules(&paths, &mut out),
        Command::Learn => commands::learn(&paths, &mut out),
    }
}

/// All of stdin; an unreadable stream reads as empty, which the hooks
/// treat as a malformed event.
fn read_stdin() -> String {
    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        tracing::debug!(error = %e, "could not read stdin");
    }
    raw
}
