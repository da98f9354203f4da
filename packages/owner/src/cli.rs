//! Command-line interface for the plot owner service.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{parse_listen_addr, validate_egrid, OwnerConfig};
use crate::error::Result;
use crate::server::serve;
use crate::service::{OwnerDisplay, OwnershipDisplay, PlotOwnerService};

/// PlotInfo owner service - Resolve land register owners by EGRID.
#[derive(Parser)]
#[command(name = "plotinfo-owner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query the owners of a parcel.
    Owner {
        /// EGRID of the parcel (e.g., CH207506973252)
        egrid: String,

        /// reCAPTCHA response token, only checked when a site key is configured
        #[arg(short, long, default_value = "")]
        token: String,

        /// Print the JSON response instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP server.
    Serve {
        /// Bind address (default: LISTEN_ADDR or 127.0.0.1:5022)
        #[arg(short, long)]
        listen: Option<String>,
    },
}

impl Commands {
    /// Log filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Owner { .. } => "warn",
            Self::Serve { .. } => "info",
        }
    }
}

/// Run the CLI.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Owner { egrid, token, json } => owner_command(&egrid, &token, json),
        Commands::Serve { listen } => serve_command(listen.as_deref()),
    }
}

/// Execute the owner command.
fn owner_command(egrid: &str, token: &str, json: bool) -> Result<()> {
    // Validate input before reading the environment
    validate_egrid(egrid)?;

    let config = OwnerConfig::from_env()?;
    let service = PlotOwnerService::new(&config)?;

    if json {
        let response = service.info(egrid, token);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "{} {}",
        style("Querying owners of").bold(),
        style(egrid).cyan()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Querying GBDBS...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let summary = match service.owner_info(egrid, token) {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    print_display(&OwnershipDisplay::from(&summary));
    Ok(())
}

fn print_display(display: &OwnershipDisplay) {
    println!("  Grundstück: {}", style(&display.grundstueck).green());
    if let Some(form) = &display.eigentumsform {
        println!("  Eigentumsform: {form}");
    }
    if let Some(description) = &display.beschreibung {
        println!("  Beschreibung: {description}");
    }
    println!("  Eigentümer: {}", display.eigentuemer.len());

    for owner in &display.eigentuemer {
        match owner {
            OwnerDisplay::Persons { berechtigte } => {
                for line in berechtigte {
                    println!("    - {line}");
                }
            }
            OwnerDisplay::Parcel {
                grundstueck,
                berechtigte,
                beschreibung,
            } => {
                match beschreibung {
                    Some(description) => {
                        println!("    - {} ({description})", style(grundstueck).cyan());
                    }
                    None => println!("    - {}", style(grundstueck).cyan()),
                }
                for line in berechtigte {
                    if line == crate::resolver::ERROR_SENTINEL {
                        println!("        {}", style(line).red().bold());
                    } else {
                        println!("        {line}");
                    }
                }
            }
        }
    }
}

/// Execute the serve command.
///
/// The service is created before the runtime starts, since its blocking
/// HTTP client must not be built inside an async context.
fn serve_command(listen: Option<&str>) -> Result<()> {
    let mut config = OwnerConfig::from_env()?;
    if let Some(listen) = listen {
        config = config.with_listen_addr(parse_listen_addr(listen)?);
    }

    let service = Arc::new(PlotOwnerService::new(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(Arc::clone(&service), config.listen_addr))
}
