use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use siteqa::Result;
use std::io;

#[derive(Parser)]
#[command(name = "siteqa")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Construction Quality Workflow Engine", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a siteqa project in the current directory
    Init {
        /// Project name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Checklist template operations
    #[command(subcommand)]
    Template(siteqa::cli::template::TemplateCommands),

    /// Lot operations
    #[command(subcommand)]
    Lot(siteqa::cli::lot::LotCommands),

    /// Assign a checklist template to a lot (freezes a snapshot)
    Assign {
        /// Lot id or number
        lot: String,

        /// Template id or name
        template: String,

        /// Skip head-contractor verification for subcontractor items
        #[arg(long)]
        no_verification: bool,
    },

    /// Record a checklist item completion
    Complete {
        /// Lot id or number
        lot: String,

        /// Checklist item sequence number
        sequence: u32,

        /// Mark the item not applicable instead of completed
        #[arg(long)]
        na: bool,

        /// Completion notes
        #[arg(long)]
        notes: Option<String>,

        /// Acting user id (defaults to $USER)
        #[arg(long)]
        actor: Option<String>,
    },

    /// Accept or reject a completion awaiting verification
    Verify {
        /// Lot id or number
        lot: String,

        /// Completion id (printed by 'complete' and 'status')
        completion_id: String,

        /// Reject instead of accept
        #[arg(long)]
        reject: bool,

        /// Rejection reason (required with --reject)
        #[arg(long)]
        reason: Option<String>,

        /// Acting user id (defaults to $USER)
        #[arg(long)]
        actor: Option<String>,
    },

    /// Show a lot with its checklist state
    Status {
        /// Lot id or number
        lot: String,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// List all lots
    List {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Evaluate the conformance prerequisites for a lot
    Conformance {
        /// Lot id or number
        lot: String,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Mark a lot conformant (all prerequisites must pass)
    Conform {
        /// Lot id or number
        lot: String,

        /// Acting user id (defaults to $USER)
        #[arg(long)]
        actor: Option<String>,
    },

    /// Hold point operations
    #[command(subcommand)]
    Holdpoint(siteqa::cli::holdpoint::HoldPointCommands),

    /// Scan for stale hold points and lots waiting on tests
    Scan {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Start the public release server
    Serve {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { name } => {
            println!("{}", "🚀 Initializing siteqa...".cyan());
            siteqa::cli::init::run(name.as_deref()).await?;
        }

        Commands::Template(cmd) => {
            siteqa::cli::template::run(cmd)?;
        }

        Commands::Lot(cmd) => {
            siteqa::cli::lot::run(cmd)?;
        }

        Commands::Assign {
            lot,
            template,
            no_verification,
        } => {
            siteqa::cli::assign::run(&lot, &template, no_verification)?;
        }

        Commands::Complete {
            lot,
            sequence,
            na,
            notes,
            actor,
        } => {
            siteqa::cli::complete::run(&lot, sequence, na, notes, actor)?;
        }

        Commands::Verify {
            lot,
            completion_id,
            reject,
            reason,
            actor,
        } => {
            siteqa::cli::verify::run(&lot, &completion_id, reject, reason, actor)?;
        }

        Commands::Status { lot, json } => {
            siteqa::cli::status::run(&lot, json)?;
        }

        Commands::List { json } => {
            siteqa::cli::list::run(json)?;
        }

        Commands::Conformance { lot, json } => {
            siteqa::cli::conformance::run(&lot, json)?;
        }

        Commands::Conform { lot, actor } => {
            siteqa::cli::conform::run(&lot, actor)?;
        }

        Commands::Holdpoint(cmd) => {
            siteqa::cli::holdpoint::run(cmd)?;
        }

        Commands::Scan { json } => {
            siteqa::cli::scan::run(json)?;
        }

        Commands::Serve { port } => {
            siteqa::cli::serve::run(port).await?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "siteqa", &mut io::stdout());
        }
    }

    Ok(())
}
