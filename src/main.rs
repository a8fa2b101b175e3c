mod commands;
mod context;
mod oauth;
mod render;
mod utils;

use anyhow::Result;
use chosei_core::calendar::VisibleMonth;
use chosei_core::duration::MeetingDuration;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::invite::{InviteArgs, parse_datetime};

#[derive(Parser)]
#[command(name = "chosei")]
#[command(about = "Pick a date range, check attendee availability and send Outlook meeting invites")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a Microsoft work account
    Login,
    /// Forget the signed-in account and its cached tokens
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Create the config file if missing and show where files live
    Config,
    /// Show a month calendar, optionally selecting a range by drag
    Calendar {
        /// Month to show (YYYY-MM). Defaults to the month of --from, then the current month
        #[arg(short, long)]
        month: Option<VisibleMonth>,

        /// Day the drag starts on (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Days the pointer passes over, in order (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        over: Vec<NaiveDate>,
    },
    /// List users in your organization's directory
    Users {
        /// Only show users whose name or address contains this text
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Search attendee availability and show the grid
    Search,
    /// Send a meeting invite for an explicit time
    Invite {
        /// Start date/time (e.g. "2025-03-31T16:00")
        #[arg(short, long, value_parser = parse_datetime)]
        start: NaiveDateTime,

        /// End date/time
        #[arg(short, long, value_parser = parse_datetime, conflicts_with = "duration")]
        end: Option<NaiveDateTime>,

        /// Meeting length (e.g. "1時間", "90m", "1h 30m")
        #[arg(short, long, conflicts_with = "end")]
        duration: Option<MeetingDuration>,

        #[arg(long)]
        subject: Option<String>,

        /// HTML body
        #[arg(long)]
        body: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// Attendee email address (repeatable)
        #[arg(short, long = "attendee", required = true)]
        attendees: Vec<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "chosei=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        None => commands::app::run().await,
        Some(Commands::Login) => commands::login::run().await,
        Some(Commands::Logout) => commands::logout::run(),
        Some(Commands::Whoami) => commands::whoami::run(),
        Some(Commands::Config) => commands::config::run(),
        Some(Commands::Calendar { month, from, over }) => commands::calendar::run(month, from, over),
        Some(Commands::Users { query }) => commands::users::run(query).await,
        Some(Commands::Search) => commands::search::run().await,
        Some(Commands::Invite {
            start,
            end,
            duration,
            subject,
            body,
            location,
            attendees,
        }) => {
            commands::invite::run(InviteArgs {
                start,
                end,
                duration,
                subject,
                body,
                location,
                attendees,
            })
            .await
        }
    }
}
