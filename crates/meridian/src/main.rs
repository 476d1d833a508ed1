// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meridian - economic-data question answering over tiered language models.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use meridian_config::MeridianConfig;
use meridian_core::{AnswerRequest, AnswerResponse, MeridianError, Tier};
use meridian_router::TierRouter;

/// Meridian - economic-data question answering.
#[derive(Parser, Debug)]
#[command(name = "meridian", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway until interrupted.
    Serve,
    /// Answer one query and print the result.
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Skip classification and use this tier.
        #[arg(long, value_parser = parse_tier)]
        tier: Option<Tier>,
        /// Session key for conversation history.
        #[arg(long, default_value = "cli")]
        session: String,
        /// Answer without calling any data tools.
        #[arg(long)]
        no_tools: bool,
        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
    /// Show which tier a query would be routed to.
    Classify {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

fn parse_tier(value: &str) -> Result<Tier, String> {
    value
        .parse::<Tier>()
        .map_err(|_| format!("unknown tier '{value}' (expected standard or premium)"))
}

fn load_config(path: Option<&PathBuf>) -> Option<MeridianConfig> {
    let loaded = match path {
        Some(path) => meridian_config::load_and_validate_path(path),
        None => meridian_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            meridian_config::render_errors(&errors);
            None
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so `ask` output on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("meridian={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_answer(response: &AnswerResponse) {
    println!("{}", response.answer_text);
    eprintln!();
    eprintln!(
        "tier={} model={} cost=${:.6} latency={}ms",
        response.tier_used, response.model, response.estimated_cost_usd, response.latency_ms
    );
    if !response.tools_used.is_empty() {
        let tools: Vec<&str> = response.tools_used.iter().map(String::as_str).collect();
        eprintln!("tools: {}", tools.join(", "));
    }
    if !response.charts.is_empty() {
        eprintln!("charts: {}", response.charts.len());
    }
}

async fn run(command: Commands, config: MeridianConfig) -> Result<(), MeridianError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Ask {
            query,
            tier,
            session,
            no_tools,
            json,
        } => {
            let agent = serve::build_agent(&config).await?;
            let mut request = AnswerRequest::new(query.join(" "), session);
            request.tier_override = tier;
            request.tools_enabled = !no_tools;

            let response = agent.answer(request).await?;
            if json {
                let rendered = serde_json::to_string_pretty(&response)
                    .map_err(|e| MeridianError::Internal(format!("failed to render JSON: {e}")))?;
                println!("{rendered}");
            } else {
                print_answer(&response);
            }
            Ok(())
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config.redacted())
                .map_err(|e| MeridianError::Internal(format!("failed to render config: {e}")))?;
            print!("{rendered}");
            Ok(())
        }
        Commands::Classify { query } => {
            let router = TierRouter::new(&config.routing);
            let decision = router.route(&query.join(" "), None);
            println!("tier:   {}", decision.tier);
            match decision.score {
                Some(score) => println!("score:  {score}"),
                None => println!("score:  -"),
            }
            println!("source: {:?}", decision.source);
            println!("reason: {}", decision.reason);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_ref()) else {
        return ExitCode::FAILURE;
    };
    init_tracing(&config.agent.log_level);

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
