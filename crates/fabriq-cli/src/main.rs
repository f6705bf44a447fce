use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fabriqctl",
    about = "Fabriq — composable-fabric reconciler",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Fabric snapshot file
    #[arg(long, global = true, default_value = "fabric.toml")]
    fabric: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print groups, machines, and devices with their placement
    Resources,
    /// Compute the ordered plan for a demand document without executing it
    Plan {
        /// Demand document
        #[arg(short, long)]
        demand: PathBuf,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Execute the plan for a demand document and save the snapshot back
    Apply {
        /// Demand document
        #[arg(short, long)]
        demand: PathBuf,
    },
    /// Detach every device on one machine, leaving the rest untouched
    Unlink {
        /// Machine name
        #[arg(short, long)]
        machine: String,
        /// Execute the plan instead of only printing it
        #[arg(long)]
        commit: bool,
    },
    /// Detach every device in a group
    Reset {
        /// Group name (defaults to the snapshot's only group)
        #[arg(short, long)]
        group: Option<String>,
        /// Execute the plan instead of only printing it
        #[arg(long)]
        commit: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `plan --format json` stays pipeable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resources => commands::resources::resources(&cli.fabric),
        Commands::Plan { demand, format } => commands::plan::plan(&cli.fabric, &demand, &format),
        Commands::Apply { demand } => commands::apply::apply(&cli.fabric, &demand).await,
        Commands::Unlink { machine, commit } => {
            commands::unlink::unlink(&cli.fabric, &machine, commit).await
        }
        Commands::Reset { group, commit } => {
            commands::reset::reset(&cli.fabric, group.as_deref(), commit).await
        }
    }
}
