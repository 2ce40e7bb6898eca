#![forbid(unsafe_code)]

mod cmd;
mod output;
mod roster;
mod workspace;

use clap::{Parser, Subcommand};
use muster_core::ServiceError;
use output::OutputMode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "mst: notification subsystem of the Muster volunteer platform",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a muster project",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    mst init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Messaging",
        about = "Create an organization-wide broadcast",
        long_about = "Create a broadcast targeted by role or at every user. The caller \
                      must hold a role above member.",
        after_help = "EXAMPLES:\n    # Announce to all leaders and admins, sparing vol-x\n    mst broadcast --as vol-ada --title \"Leads meeting\" --body \"Sunday 10:00\" \\\n        --role leader --role admin --exclude vol-x"
    )]
    Broadcast(cmd::broadcast::BroadcastArgs),

    #[command(
        next_help_heading = "Messaging",
        about = "Send a targeted message to specific users",
        after_help = "EXAMPLES:\n    # Assignment notice from the system identity\n    mst send --to vol-mia --title \"Shift assigned\" --body \"Setup crew, 08:00\""
    )]
    Send(cmd::send::SendArgs),

    #[command(
        next_help_heading = "Messaging",
        about = "Send the one-time welcome notification",
        long_about = "Send the welcome notification. Idempotent: a second call for the \
                      same user reports 'already sent' and creates nothing."
    )]
    Welcome(cmd::welcome::WelcomeArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a user's bell feed",
        after_help = "EXAMPLES:\n    mst feed --as vol-mia\n    mst feed --as vol-mia --json"
    )]
    Feed(cmd::feed::FeedArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a user's system-message inbox",
        after_help = "EXAMPLES:\n    mst inbox --as vol-mia --kind announcement --page 2 -n 10"
    )]
    Inbox(cmd::inbox::InboxArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a user's unread counts"
    )]
    Unread(cmd::unread::UnreadArgs),

    #[command(
        next_help_heading = "State",
        about = "Mark a message read (couples bell and system)",
        after_help = "EXAMPLES:\n    mst read --as vol-mia --id nt-abc123\n    mst read --as vol-mia --all"
    )]
    Read(cmd::read::ReadArgs),

    #[command(
        next_help_heading = "State",
        about = "Remove a message from the bell feed only"
    )]
    Dismiss(cmd::dismiss::DismissArgs),

    #[command(
        next_help_heading = "State",
        about = "Delete a message from the system list only"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Deactivate expired messages",
        long_about = "Deactivate messages whose expiry has passed. Recipient state is \
                      preserved for audit. Safe to run on a schedule."
    )]
    Sweep(cmd::sweep::SweepArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Purge legacy orphaned recipient rows"
    )]
    Cleanup(cmd::cleanup::CleanupArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Show store-level aggregate stats"
    )]
    Stats(cmd::stats::StatsArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    if let Err(error) = run(&cli, output) {
        report_error(&error);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(args) => {
            let dir = std::env::current_dir()?;
            cmd::init::run(args, output, &dir)
        }
        Commands::Broadcast(args) => cmd::broadcast::run(args, output),
        Commands::Send(args) => cmd::send::run(args, output),
        Commands::Welcome(args) => cmd::welcome::run(args, output),
        Commands::Feed(args) => cmd::feed::run(args, output),
        Commands::Inbox(args) => cmd::inbox::run(args, output),
        Commands::Unread(args) => cmd::unread::run(args, output),
        Commands::Read(args) => cmd::read::run(args, output),
        Commands::Dismiss(args) => cmd::dismiss::run(args, output),
        Commands::Delete(args) => cmd::delete::run(args, output),
        Commands::Sweep(args) => cmd::sweep::run(args, output),
        Commands::Cleanup(args) => cmd::cleanup::run(args, output),
        Commands::Stats(args) => cmd::stats::run(args, output),
    }
}

/// Surface service errors with their stable machine code and hint.
fn report_error(error: &anyhow::Error) {
    if let Some(service_error) = error.downcast_ref::<ServiceError>() {
        let code = service_error.code();
        eprintln!("error[{code}]: {service_error}");
        if let Some(hint) = code.hint() {
            eprintln!("hint: {hint}");
        }
    } else {
        eprintln!("error: {error:#}");
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "mst=debug,muster_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MUSTER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
