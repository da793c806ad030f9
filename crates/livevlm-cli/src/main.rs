//! LiveVLM CLI: stream image frames through a vision-language model with
//! temporal context.

mod images;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use livevlm_api::HttpGateway;
use livevlm_config::{CliOverrides, VlmConfig};
use livevlm_core::{DEFAULT_PROMPT, FrameRequest, SessionOrchestrator};
use livevlm_types::QuerySettings;

#[derive(Parser)]
#[command(
    name = "livevlm",
    version,
    about = "Real-time vision-language model proxy with temporal context"
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available models
    Models {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Process image files as consecutive frames of one session
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Image files, processed in order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Model to query (overrides LIVEVLM_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Prompt sent with every frame
    #[arg(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Session id to use (generated when omitted)
    #[arg(long)]
    session: Option<String>,

    /// Send the prompt without recent frame analyses
    #[arg(long)]
    no_context: bool,

    /// Recent frames used for temporal context (1-50)
    #[arg(long)]
    context_window: Option<usize>,

    /// Recent frames used for the summary (1-50)
    #[arg(long)]
    summary_window: Option<usize>,

    /// Maximum tokens per answer (1-4000)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Seconds to wait between frames (0.1-60)
    #[arg(long)]
    delay: Option<f32>,

    /// Model to try first for the final summary
    #[arg(long)]
    summary_model: Option<String>,

    /// Instructions that replace the built-in summary prompt
    #[arg(long)]
    summary_prompt: Option<String>,

    /// Keep image payloads in the exported history
    #[arg(long)]
    retain_images: bool,

    /// Write the session's frame history to this file as JSON
    #[arg(long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Models { json } => list_models(json),
        Command::Run(args) => run(args).await,
    }
}

fn list_models(json: bool) -> Result<()> {
    let config = VlmConfig::load(CliOverrides::default())?;
    let gateway = HttpGateway::new(config.gateway_config())?;
    let registry = gateway.registry();

    if json {
        println!("{}", serde_json::to_string_pretty(registry.models())?);
        return Ok(());
    }

    let configured = config.configured_providers();
    for info in registry.models() {
        let marker = if info.id == config.model { "*" } else { " " };
        let key_note = if configured.contains(&info.provider) {
            ""
        } else {
            " (no API key)"
        };
        println!(
            "{marker} {:<18} {:<10} {}: {}{key_note}",
            info.id, info.provider, info.name, info.description
        );
    }
    eprintln!("\n* default model (config dir: {})", config.config_dir.display());
    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let config = VlmConfig::load(CliOverrides {
        model: args.model,
        context_window: args.context_window,
        summary_window: args.summary_window,
        retain_images: args.retain_images.then_some(true),
    })?;

    let defaults = QuerySettings::default();
    let settings = QuerySettings::new(
        args.max_tokens.unwrap_or(defaults.max_tokens),
        args.temperature.unwrap_or(defaults.temperature),
        args.delay.unwrap_or(defaults.delay_seconds),
    )?;

    let gateway =
        HttpGateway::new(config.gateway_config())?.with_retry_config(config.retry_config());
    if !gateway.registry().contains(&config.model) {
        bail!(
            "Unknown model '{}'. Run `livevlm models` to list available models.",
            config.model
        );
    }
    let registry = gateway.registry().clone();
    let orchestrator =
        SessionOrchestrator::new(Arc::new(gateway), registry, config.engine_config());

    let session_id = orchestrator.start_session(args.session);
    eprintln!(
        "livevlm v{} (model: {}, session: {}, context window: {})",
        env!("CARGO_PKG_VERSION"),
        config.model,
        session_id,
        config.context_window
    );

    let mut failures = 0usize;
    for (i, path) in args.images.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_secs_f32(settings.delay_seconds)).await;
        }

        let image = images::load_image(path)?;
        let mut request = FrameRequest::new(&config.model, image, &args.prompt)
            .in_session(&session_id)
            .with_settings(settings);
        if args.no_context {
            request = request.without_temporal_context();
        }

        match orchestrator.process_frame(request).await {
            Ok(result) => println!("{}", serde_json::to_string(&result)?),
            Err(e) => {
                failures += 1;
                eprintln!("{}: [{}] {e}", path.display(), e.kind());
            }
        }
    }

    let summary = orchestrator
        .general_summary(Some(&session_id), args.summary_model, args.summary_prompt)
        .await;
    println!("\nSummary:\n{summary}");

    let stats = orchestrator.session_stats(&session_id)?;
    eprintln!("\n{}", stats.format_detailed());

    if let Some(path) = args.export {
        let frames = orchestrator.export_session(&session_id)?;
        let json = serde_json::to_string_pretty(&frames)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Exported {} frames to {}", frames.len(), path.display());
    }

    if failures == args.images.len() {
        bail!("All {failures} frames failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_args_parse() {
        let cli = Cli::try_parse_from([
            "livevlm",
            "run",
            "a.jpg",
            "b.jpg",
            "--model",
            "gpt-4o",
            "--context-window",
            "3",
            "--no-context",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.images.len(), 2);
                assert_eq!(args.model.as_deref(), Some("gpt-4o"));
                assert_eq!(args.context_window, Some(3));
                assert!(args.no_context);
                assert_eq!(args.prompt, DEFAULT_PROMPT);
            }
            Command::Models { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn run_requires_images() {
        assert!(Cli::try_parse_from(["livevlm", "run"]).is_err());
    }
}
