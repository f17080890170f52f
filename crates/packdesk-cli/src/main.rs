//! `packdesk` - ship course delivery packs and file support tickets from
//! the terminal.

mod commands;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use packdesk_core::config::Config;
use packdesk_core::models::{OrderStatus, TicketCategory, TicketPriority};

/// Log file name prefix; the appender adds the date.
const LOG_FILE: &str = "packdesk.log";

#[derive(Parser, Debug)]
#[command(name = "packdesk", version, about = "Delivery orders and support tickets for course batches")]
struct Cli {
    /// Preference profile (overrides PACKDESK_PROFILE and the config file).
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store an API token for a portal user.
    Login {
        /// Portal username.
        #[arg(long)]
        username: Option<String>,
        /// Avatar URL attached to tickets you create.
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Forget the stored token and session.
    Logout,

    /// List course batches.
    Courses,

    /// List the students of a batch with their delivery order.
    Students {
        /// Course code or id.
        course: String,
        /// Filter by username or full name.
        #[arg(long, short = 's', default_value = "")]
        search: String,
        #[arg(long, short = 'p', default_value_t = 1)]
        page: usize,
    },

    /// Create a delivery order for one student.
    CreateOrder {
        /// Course code or id.
        course: String,
        /// Student username.
        student: String,
        /// Delivery setting id. Defaults to the remembered pack, then the
        /// batch's first pack.
        #[arg(long)]
        pack: Option<String>,
        /// Tracking number. Blank is sent as PENDING.
        #[arg(long)]
        tracking: Option<String>,
        /// Status code (1-4) or label.
        #[arg(long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        notes: Option<String>,
        /// Remember pack, status and tracking for the next order.
        #[arg(long, conflicts_with = "forget")]
        remember: bool,
        /// Stop remembering order defaults.
        #[arg(long)]
        forget: bool,
    },

    /// List delivery packs of a batch.
    Packs {
        /// Course code or id.
        course: String,
    },

    /// Open a support ticket as the signed-in user.
    Ticket {
        #[arg(long)]
        subject: String,
        /// Course, Payment, Games, Delivery Packs or Other.
        #[arg(long)]
        category: Option<TicketCategory>,
        #[arg(long, default_value = "Medium")]
        priority: TicketPriority,
        #[arg(long)]
        description: String,
    },

    /// List support tickets.
    Tickets {
        /// Every user's tickets instead of your own.
        #[arg(long)]
        all: bool,
    },

    /// Remembered order-form defaults.
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    Show,
    Clear,
}

/// Initialize the tracing subscriber: stderr always, plus a daily log file
/// when a log directory is available. The returned guard flushes the file
/// writer and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?.with_env();
    if let Some(profile) = cli.profile.clone() {
        config.profile = Some(profile);
    }

    let log_dir = config.data_dir().ok().map(|dir| dir.join("logs"));
    let _guard = init_tracing(log_dir.as_deref());
    info!(profile = config.profile(), api = %config.api_base_url, "packdesk starting");

    let mut ctx = commands::Context::open(config)?;

    match cli.command {
        Commands::Login { username, avatar } => commands::auth::login(&mut ctx, username, avatar),
        Commands::Logout => commands::auth::logout(&mut ctx),
        Commands::Courses => commands::orders::courses(&ctx).await,
        Commands::Students { course, search, page } => commands::orders::students(&ctx, &course, &search, page).await,
        Commands::Packs { course } => commands::orders::packs(&ctx, &course).await,
        Commands::CreateOrder {
            course,
            student,
            pack,
            tracking,
            status,
            notes,
            remember,
            forget,
        } => {
            let input = commands::orders::OrderInput {
                pack,
                tracking,
                status,
                notes,
                remember: match (remember, forget) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            commands::orders::create_order(&ctx, &course, &student, input).await
        }
        Commands::Ticket {
            subject,
            category,
            priority,
            description,
        } => commands::tickets::create(&ctx, subject, category, priority, description).await,
        Commands::Tickets { all } => commands::tickets::list(&ctx, all).await,
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::prefs::show(&ctx),
            PrefsAction::Clear => commands::prefs::clear(&ctx),
        },
    }
}
