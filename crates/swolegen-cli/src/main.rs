mod config;
mod pipeline_cmds;
mod schema_cmds;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use config::{CliOverrides, SwolegenConfig};
use pipeline_cmds::AnalyzeOptions;

#[derive(Parser)]
#[command(name = "swolegen", about = "Schema-checked workout planning with an LLM")]
struct Cli {
    /// Completion provider to use
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name (overrides LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Provider base URL (overrides LLM_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Repair attempts after the first try (overrides LLM_RETRIES)
    #[arg(long, global = true, allow_negative_numbers = true)]
    retries: Option<i64>,

    /// Byte cap for fetched documents (overrides LLM_MAX_FETCH_BYTES)
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_fetch_bytes: Option<i64>,

    /// Cancel the run after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log every attempt's prompts and raw output
    #[arg(long, global = true)]
    trace: bool,

    /// Debug logging (also DEBUG=true)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a swolegen config file
    Init {
        /// API key stored in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Default model
        #[arg(long)]
        default_model: Option<String>,
        /// Strava access token stored in the config file
        #[arg(long)]
        strava_token: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Turn analyze inputs (JSON) into a validated plan
    Analyze {
        /// Inputs JSON file, or `-` for stdin
        input: PathBuf,
        /// Write the plan here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Fill strava_recent with this many days of activity
        #[arg(long)]
        strava_days: Option<u32>,
    },
    /// Expand a plan (JSON) into a workout document
    Generate {
        /// Plan JSON file, or `-` for stdin
        plan: PathBuf,
        /// Write the workout here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Analyze then generate in one go
    Run {
        /// Inputs JSON file, or `-` for stdin
        input: PathBuf,
        /// Write the workout here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Also save the intermediate plan
        #[arg(long)]
        plan_output: Option<PathBuf>,
        /// Fill strava_recent with this many days of activity
        #[arg(long)]
        strava_days: Option<u32>,
    },
    /// Print a schema document (plan or workout)
    Schema {
        /// `plan` or `workout`
        kind: String,
        /// Print the SHA-256 fingerprint instead
        #[arg(long)]
        fingerprint: bool,
    },
    /// Check a JSON file against a schema
    Validate {
        /// `plan` or `workout`
        kind: String,
        /// File to check, or `-` for stdin
        file: PathBuf,
    },
}

/// Execute the `swolegen init` command: write config file.
fn cmd_init(
    api_key: Option<String>,
    model: Option<String>,
    strava_token: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        llm: config::LlmSection {
            api_key,
            model,
            ..Default::default()
        },
        strava: config::StravaSection {
            access_token: strava_token,
            ..Default::default()
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if !has_key {
        println!();
        println!("No API key stored; set OPENAI_API_KEY or rerun with --api-key.");
    }

    Ok(())
}

/// First Ctrl+C cancels the run; a second one force-exits.
fn spawn_signal_handler(cancel: CancellationToken) {
    let got_first_signal = Arc::new(AtomicBool::new(false));
    tokio::spawn(async move {
        loop {
            tokio::signal::ctrl_c().await.ok();
            if got_first_signal.swap(true, Ordering::SeqCst) {
                eprintln!("\nForce exit.");
                std::process::exit(130);
            }
            eprintln!("\nCancelling (Ctrl+C again to force)...");
            cancel.cancel();
        }
    });
}

fn spawn_deadline(cancel: CancellationToken, secs: u64) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                tracing::warn!(timeout_secs = secs, "deadline reached, cancelling");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug || config::env_flag("DEBUG") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let overrides = CliOverrides {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        base_url: cli.base_url.clone(),
        retries: cli.retries,
        max_fetch_bytes: cli.max_fetch_bytes,
    };

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());
    if let Some(secs) = cli.timeout {
        spawn_deadline(cancel.clone(), secs);
    }

    match cli.command {
        Commands::Init {
            api_key,
            default_model,
            strava_token,
            force,
        } => {
            cmd_init(api_key, default_model, strava_token, force)?;
        }
        Commands::Analyze {
            input,
            output,
            strava_days,
        } => {
            let resolved = SwolegenConfig::resolve(&overrides)?;
            let options = AnalyzeOptions {
                strava_days,
                trace: cli.trace,
            };
            pipeline_cmds::run_analyze(&resolved, &input, output.as_deref(), &options, &cancel)
                .await?;
        }
        Commands::Generate { plan, output } => {
            let resolved = SwolegenConfig::resolve(&overrides)?;
            pipeline_cmds::run_generate(&resolved, &plan, output.as_deref(), cli.trace, &cancel)
                .await?;
        }
        Commands::Run {
            input,
            output,
            plan_output,
            strava_days,
        } => {
            let resolved = SwolegenConfig::resolve(&overrides)?;
            let options = AnalyzeOptions {
                strava_days,
                trace: cli.trace,
            };
            pipeline_cmds::run_run(
                &resolved,
                &input,
                output.as_deref(),
                plan_output.as_deref(),
                &options,
                &cancel,
            )
            .await?;
        }
        Commands::Schema { kind, fingerprint } => {
            schema_cmds::run_schema(&kind, fingerprint)?;
        }
        Commands::Validate { kind, file } => {
            schema_cmds::run_validate(&kind, &file)?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_retries_parse_as_flag_value() {
        let cli = Cli::try_parse_from(["swolegen", "--retries", "-1", "analyze", "in.json"]).unwrap();
        assert_eq!(cli.retries, Some(-1));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "swolegen", "generate", "plan.json", "--trace", "--timeout", "30",
        ])
        .unwrap();
        assert!(cli.trace);
        assert_eq!(cli.timeout, Some(30));
        assert!(matches!(cli.command, Commands::Generate { .. }));
    }
}
