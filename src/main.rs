use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "roundtable")]
#[command(version, about = "Multi-auditor consolidation engine for clinical bill audits")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full audit round table over three extracted documents
    Audit {
        /// Path to the extracted bill JSON
        #[arg(long)]
        bill: PathBuf,

        /// Path to the extracted payment-program JSON
        #[arg(long)]
        pam: PathBuf,

        /// Path to the extracted contract JSON
        #[arg(long)]
        contract: PathBuf,

        /// Number of independent peer auditors (default 5)
        #[arg(long)]
        peers: Option<usize>,

        /// Override the financial ceiling derived from the payment program
        #[arg(long)]
        ceiling: Option<i64>,

        /// Write the final report to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Re-verify a saved narrative report offline (recompute its total)
    Verify {
        /// Path to the narrative report (markdown)
        report: PathBuf,

        /// Financial ceiling to enforce on the recomputed total
        #[arg(long)]
        ceiling: Option<i64>,
    },
    /// Inspect or clear the local memoization cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show entry count and location
    Stats,
    /// Remove every cached record
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Audit {
            bill,
            pam,
            contract,
            peers,
            ceiling,
            out,
        } => {
            cmd::cmd_audit(
                bill,
                pam,
                contract,
                *peers,
                *ceiling,
                out.as_deref(),
                cli.verbose,
            )
            .await?;
        }
        Commands::Verify { report, ceiling } => {
            cmd::cmd_verify(report, *ceiling)?;
        }
        Commands::Cache { command } => match command {
            CacheCommands::Stats => cmd::cmd_cache_stats()?,
            CacheCommands::Clear => cmd::cmd_cache_clear()?,
        },
    }

    Ok(())
}
