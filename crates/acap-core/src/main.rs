//! Audio Capability Probe - command line front end
//!
//! The main entry point for acap-core, handling:
//! - Evaluating the support verdict against the reference host
//! - Showing the resolved engine configuration
//! - Listing the registered probes

use acap_common::{BaselineFlags, Error, OutputFormat, SCHEMA_VERSION};
use acap_config::{load_engine_config, HostDefect, ResolvedEngineConfig};
use acap_core::exit_codes::ExitCode;
use acap_core::host::{AudioHost, ReferenceHost};
use acap_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat};
use acap_core::wiring::standard_engine;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// Audio Capability Probe - decide once whether the audio host is usable
#[derive(Parser)]
#[command(name = "acap-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to engine.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the support verdict (default)
    Check(CheckArgs),
    /// Configuration management
    Config(ConfigArgs),
    /// List registered probes without running them
    Probes,
}

#[derive(Args, Debug, Default)]
struct CheckArgs {
    /// Emulate a reference host defect (repeatable)
    #[arg(long = "defect", value_parser = parse_defect)]
    defects: Vec<HostDefect>,

    /// Override the async stage timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration and where it came from
    Show,
}

fn parse_defect(value: &str) -> Result<HostDefect, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown host defect '{}'", value))
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogConfig::level_from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let exit_code = match cli.command {
        None => run_check(&cli.global, &CheckArgs::default()),
        Some(Commands::Check(args)) => run_check(&cli.global, &args),
        Some(Commands::Config(args)) => match args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
        },
        Some(Commands::Probes) => run_probes(&cli.global),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn load_config(global: &GlobalOpts) -> Result<ResolvedEngineConfig, Error> {
    load_engine_config(global.config.as_deref()).map_err(Error::from)
}

fn run_check(global: &GlobalOpts, args: &CheckArgs) -> ExitCode {
    let run_id = generate_run_id();
    let _span = tracing::info_span!("check", run_id = %run_id).entered();
    let resolved = match load_config(global) {
        Ok(resolved) => resolved,
        Err(e) => return output_error(global, &run_id, &e),
    };

    let mut config = resolved.config.clone();
    config.reference_host.defects.extend(args.defects.iter().copied());
    if args.timeout_ms.is_some() {
        config.async_stage_timeout_ms = args.timeout_ms;
        if let Err(e) = acap_config::validate_engine_config(&config) {
            return output_error(global, &run_id, &Error::from(e));
        }
    }

    let host = Arc::new(ReferenceHost::with_defects(config.reference_host.defects.iter().copied()));
    let host_name = host.name().to_string();
    let engine = match standard_engine(host, Arc::new(BaselineFlags::default()), &config) {
        Ok(engine) => engine,
        Err(e) => return output_error(global, &run_id, &e),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let error = Error::Orchestration(format!("failed to start async runtime: {}", e));
            return output_error(global, &run_id, &error);
        }
    };
    let verdict = runtime.block_on(async { engine.capability_token().verdict().await });

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "host": host_name,
                "config_source": resolved.source.to_string(),
                "verdict": &*verdict,
                "cache": engine.cache_stats(),
            });
            if let Err(e) = print_json(&response) {
                return output_error(global, &run_id, &e);
            }
        }
        OutputFormat::Summary => {
            let status = if verdict.supported { "SUPPORTED" } else { "UNSUPPORTED" };
            println!(
                "[{}] check: {} ({} probes run, {}ms)",
                run_id,
                status,
                verdict.probes.len(),
                verdict.elapsed_ms
            );
        }
        OutputFormat::Exitcode => {}
    }

    ExitCode::from_verdict(verdict.supported)
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let run_id = generate_run_id();
    let resolved = match load_config(global) {
        Ok(resolved) => resolved,
        Err(e) => return output_error(global, &run_id, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "source": {
                    "kind": resolved.source.to_string(),
                    "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                    "using_defaults": resolved.path.is_none(),
                },
                "engine": &resolved.config,
            });
            if let Err(e) = print_json(&response) {
                return output_error(global, &run_id, &e);
            }
        }
        OutputFormat::Summary => {
            let path = resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("[{}] config: {} ({})", run_id, resolved.source, path);
        }
        OutputFormat::Exitcode => {}
    }

    ExitCode::Supported
}

fn run_probes(global: &GlobalOpts) -> ExitCode {
    let run_id = generate_run_id();
    let resolved = match load_config(global) {
        Ok(resolved) => resolved,
        Err(e) => return output_error(global, &run_id, &e),
    };
    let engine = match standard_engine(
        Arc::new(ReferenceHost::new()),
        Arc::new(BaselineFlags::default()),
        &resolved.config,
    ) {
        Ok(engine) => engine,
        Err(e) => return output_error(global, &run_id, &e),
    };
    let probes = engine.probes();

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "probes": probes,
            });
            if let Err(e) = print_json(&response) {
                return output_error(global, &run_id, &e);
            }
        }
        OutputFormat::Summary => {
            for probe in &probes {
                let stage = match probe.stage {
                    acap_common::ProbeStage::Sync => "sync",
                    acap_common::ProbeStage::Async => "async",
                };
                println!("{}\t{}\t{}", probe.id, stage, probe.name);
            }
        }
        OutputFormat::Exitcode => {}
    }

    ExitCode::Supported
}

fn output_error(global: &GlobalOpts, run_id: &str, error: &Error) -> ExitCode {
    let exit_code = ExitCode::from_error(error);

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "status": "error",
                "error": {
                    "code": error.code(),
                    "category": error.category(),
                    "headline": error.headline(),
                    "message": error.to_string(),
                    "remediation": error.remediation(),
                    "recoverable": error.is_recoverable(),
                }
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", error),
            }
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error: {}", run_id, error);
        }
        OutputFormat::Exitcode => {}
    }

    exit_code
}

fn print_json(value: &serde_json::Value) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
