mod cache;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::board::{self as board_cmd, BoardCommandArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::ticket::{self as ticket_cmd, MoveCommandArgs, ParentCommandArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::board::ContainerId;
use crate::domain::ids::TicketId;
use crate::error::AppResult;
use crate::infra::rest::RestClient;

#[derive(Parser)]
#[command(name = "grind", author, version, about = "Daily Grind backlog board client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the backlog board grouped by column and swimlane.
    Board(RefreshArgs),
    /// Move a ticket to another column or swimlane.
    Move(MoveArgs),
    /// Set or clear a ticket's parent.
    Parent(ParentArgs),
    /// List workflow states and where they appear on the board.
    States(RefreshArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct RefreshArgs {
    /// Refetch workflow states instead of using the local cache.
    #[arg(long)]
    refresh: bool,
}

#[derive(Args)]
struct MoveArgs {
    /// Ticket to move.
    ticket: String,
    /// Destination: backlog, todo, inprogress, done, done-completed, done-wontfix, done-duplicate.
    #[arg(short, long)]
    to: ContainerId,
    /// Position in the destination; defaults to the end.
    #[arg(short, long)]
    index: Option<usize>,
    #[command(flatten)]
    refresh: RefreshArgs,
}

#[derive(Args)]
struct ParentArgs {
    /// Ticket to update.
    ticket: String,
    /// New parent ticket; omit to clear.
    #[arg(short, long)]
    parent: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GRIND_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
        Commands::Board(args) => {
            let ctx = build_context()?;
            let rendered = board_cmd::run(
                &ctx,
                BoardCommandArgs {
                    refresh: args.refresh,
                },
            )
            .await?;
            print!("{rendered}");
            Ok(())
        }
        Commands::States(args) => {
            let ctx = build_context()?;
            let rendered = board_cmd::run_states(
                &ctx,
                BoardCommandArgs {
                    refresh: args.refresh,
                },
            )
            .await?;
            print!("{rendered}");
            Ok(())
        }
        Commands::Move(args) => {
            let ctx = build_context()?;
            let report = ticket_cmd::run_move(
                &ctx,
                MoveCommandArgs {
                    ticket: TicketId::new(args.ticket),
                    destination: args.to,
                    index: args.index,
                    refresh: args.refresh.refresh,
                },
            )
            .await?;
            println!("{}", ticket_cmd::describe_report(&report));
            Ok(())
        }
        Commands::Parent(args) => {
            let ctx = build_context()?;
            let outcome = ticket_cmd::run_parent(
                &ctx,
                ParentCommandArgs {
                    ticket: TicketId::new(args.ticket),
                    parent: args.parent.map(TicketId::new),
                },
            )
            .await?;
            match outcome.parent {
                Some(parent) => println!("Ticket {} now belongs to {parent}.", outcome.ticket),
                None => println!("Ticket {} no longer has a parent.", outcome.ticket),
            }
            Ok(())
        }
    }
}

fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;

    if config.api_base_url.is_none() {
        eprintln!("Warning: API URL not configured; run `grind config init` or set GRIND_API_URL.");
    }

    let issue_tracker = Arc::new(RestClient::new(
        config.api_base_url.clone(),
        config.api_user.clone(),
        config.api_token.clone(),
    ));

    Ok(AppContext::new(config, issue_tracker))
}
