// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.


use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use logtriage::classify::RoutingStrategy;
use logtriage::config::Config;
use logtriage::core::Analyzer;
use logtriage::server::{self, AppState};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logtriage")]
#[command(author = "The logtriage authors")]
#[command(version)]
#[command(about = "Classify failing test-log lines, route them to a team and file tickets", long_about = None)]
struct Args {
    /// Path to the config file (defaults to <config dir>/logtriage/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a log file and file tickets for its failures
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Maximum number of tickets filed for this file
        #[arg(long, value_name = "N")]
        ticket_cap: Option<usize>,

        #[arg(long, value_enum)]
        routing: Option<RoutingStrategy>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Classify error texts without enrichment or ticketing
    Classify {
        /// Texts to classify; a built-in sample set is used when omitted
        #[arg(value_name = "TEXT")]
        texts: Vec<String>,

        #[arg(long, value_enum)]
        routing: Option<RoutingStrategy>,
    },
    /// Probe the issue tracker and the model gateway
    Status,
    /// Run the HTTP service
    Serve {
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

fn init_tracing() {
    // RUST_LOG overrides the default filter (e.g. RUST_LOG=logtriage=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path().context("Could not determine config directory")?,
    };
    if target.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", target.display());
    }

    let written = Config::default().save(Some(&target))?;
    println!("Wrote default config to {}", written.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    match dotenv::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) => tracing::debug!("No .env file loaded: {e}"),
    }

    tracing::info!(
        "logtriage starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();
    let mut config = match args.command {
        Command::Init { .. } => Config::default(),
        Command::Analyze { .. } | Command::Classify { .. } | Command::Status | Command::Serve { .. } => {
            Config::load(args.config.as_deref()).context("Failed to load config")?
        }
    };

    match args.command {
        Command::Analyze {
            file,
            ticket_cap,
            routing,
            format,
        } => {
            if let Some(routing) = routing {
                config.analysis.routing = routing;
            }
            let ticket_cap = ticket_cap.unwrap_or(config.analysis.ticket_cap);
            let bytes =
                std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;

            tracing::info!("Analyzing {}", file.display());
            let analyzer = Analyzer::from_config(&config);
            let summary = analyzer.analyze_upload(Some(bytes.as_slice()), ticket_cap)?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => print!("{}", summary.summary),
            }
        }
        Command::Classify { texts, routing } => {
            if let Some(routing) = routing {
                config.analysis.routing = routing;
            }
            let analyzer = Analyzer::from_config(&config);
            for result in analyzer.classify_batch(&texts) {
                println!(
                    "{:<18} {:<9} {:<22} {:<12} {}",
                    result.error_type.label(),
                    result.severity.label(),
                    result.team,
                    result.developer,
                    result.error
                );
            }
        }
        Command::Status => {
            let report = Analyzer::from_config(&config).status();
            println!("{}", report.jira_status);
            println!("{}", report.ai_status);
            println!("{}", report.server);
        }
        Command::Serve { bind } => {
            let bind = match bind {
                Some(addr) => addr,
                None => config
                    .server
                    .bind
                    .parse()
                    .with_context(|| format!("Invalid bind address {:?}", config.server.bind))?,
            };

            // Blocking HTTP clients must be created and dropped outside the runtime
            let analyzer = Arc::new(Analyzer::from_config(&config));
            let state = AppState::new(Arc::clone(&analyzer), Arc::new(config));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            let result = runtime.block_on(server::serve(bind, state));
            drop(runtime);
            drop(analyzer);
            result?;
        }
        Command::Init { force } => init_config(args.config.as_deref(), force)?,
    }

    Ok(())
}
