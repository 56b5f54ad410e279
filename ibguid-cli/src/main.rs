use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "ibguid")]
#[command(about = "InfiniBand VF GUID assignment", long_about = None)]
struct Cli {
    /// Path to the GUID config (defaults to the host config path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root of the sysfs tree used for links and PCI devices
    #[arg(long, global = true)]
    sysfs: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the GUID assignments loaded from the config
    Show,

    /// Print the GUID the config assigns to a VF
    Lookup {
        /// PF PCI address (e.g., "0000:3b:00.0")
        pf: String,

        /// VF index
        vf_index: u32,
    },

    /// Assign a GUID to a VF and unbind its driver
    Configure {
        /// VF PCI address
        #[arg(long)]
        vf: String,

        /// PF PCI address
        #[arg(long)]
        pf: String,

        /// PF interface name (e.g., "ib216s0f0")
        #[arg(long)]
        pf_link: String,

        /// VF index on the PF
        #[arg(long)]
        vf_index: u32,
    },

    /// Validate GUID strings and print their canonical form
    Parse {
        /// GUIDs to parse
        #[arg(required = true)]
        guids: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    ibguid_core::init_observability(level)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let host = commands::HostOptions { config: cli.config, sysfs: cli.sysfs };

    match cli.command {
        Commands::Show => commands::show(&host)?,
        Commands::Lookup { pf, vf_index } => commands::lookup(&host, &pf, vf_index)?,
        Commands::Configure { vf, pf, pf_link, vf_index } => {
            commands::configure(&host, &vf, &pf, &pf_link, vf_index)?
        }
        Commands::Parse { guids } => commands::parse(&guids)?,
    }

    Ok(())
}
