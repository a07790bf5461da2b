//! tooldeploy - Entry Point
//!
//! Sets up component configs and deploys the Toolforge tools described by the
//! `<tool>.yaml` files in the config directory.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use tooldeploy::app::options::DeployOptions;
use tooldeploy::app::run::{deploy_tools, select_tools, BatchReport, ToolResult};
use tooldeploy::authn::deploy_token::DeployToken;
use tooldeploy::authn::token_mngr::{RemoteTokenProvider, StaticTokenProvider};
use tooldeploy::components::config::ComponentConfigurator;
use tooldeploy::deploy::clock::TokioClock;
use tooldeploy::errors::DeployerError;
use tooldeploy::filesys::dir::Dir;
use tooldeploy::filesys::file::File;
use tooldeploy::http::client::HttpClient;
use tooldeploy::logs::{init_logging, LogLevel, LogOptions};
use tooldeploy::models::deployment::DeploymentFlags;
use tooldeploy::models::tool::ToolName;
use tooldeploy::remote::ssh::SshRunner;
use tooldeploy::storage::settings::Settings;
use tooldeploy::utils::version_info;

#[derive(Parser, Debug)]
#[command(name = "tooldeploy", version, about)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level (overrides the settings file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Directory with the `<tool>.yaml` component configs
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ensure the tool accounts have component configs set up
    Setup(TargetArgs),

    /// Deploy the tools through the components API
    Deploy(DeployArgs),

    /// Print build information as JSON
    Version,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Only handle this tool
    #[arg(long)]
    tool: Option<ToolName>,
}

#[derive(Args, Debug)]
struct DeployArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Run the deployment even if nothing changed
    #[arg(long)]
    force_run: bool,

    /// Rebuild images even if the source did not change
    #[arg(long)]
    force_build: bool,

    /// Use this deploy token instead of reading it over SSH (requires --tool)
    #[arg(long, requires = "tool")]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        return match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render version info: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let settings = match load_settings(&cli).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let log_options = LogOptions {
        log_level: cli.log_level.clone().unwrap_or(settings.log_level.clone()),
        json_format: cli.json_logs,
        log_file: cli.log_file.clone(),
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = tokio::select! {
        result = run(cli.command, settings) => result,
        _ = await_shutdown_signal() => Err(DeployerError::Cancelled("shutdown signal received".to_string()).into()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(&File::new(path))
            .await
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.config_dir {
        settings.config_dir = dir.clone();
    }
    Ok(settings)
}

async fn run(command: Command, settings: Settings) -> anyhow::Result<ExitCode> {
    let tools = Dir::new(&settings.config_dir)
        .tool_configs()
        .await
        .context("enumerating tool configs")?;
    info!("Found {} tool configs in {}", tools.len(), settings.config_dir.display());

    let runner = Arc::new(SshRunner::new(
        settings.ssh.host.clone(),
        settings.ssh.sudo_prefix.clone(),
    ));

    match command {
        Command::Setup(args) => {
            let tools = select_tools(tools, args.tool.as_ref())?;
            let configurator = ComponentConfigurator::new(
                runner,
                settings.tool_base_dir.clone(),
                settings.config_base_url.clone(),
            );
            let configured = configurator.ensure_component_configs(&tools).await?;
            for tool in &configured {
                println!("{} {}", "configured".green(), tool);
            }
            println!("{} of {} tools needed a component config", configured.len(), tools.len());
            Ok(ExitCode::SUCCESS)
        }
        Command::Deploy(args) => {
            let options = DeployOptions {
                target_tool: args.target.tool,
                flags: DeploymentFlags {
                    force_run: args.force_run,
                    force_build: args.force_build,
                },
                poll: settings.polling.to_poll_settings()?,
            };
            let api = HttpClient::new(&settings.api.base_url, settings.api.request_timeout())?;
            let clock = TokioClock;

            let report = match args.token {
                Some(raw) => {
                    let provider = StaticTokenProvider::new(DeployToken::new(raw)?);
                    deploy_tools(tools, &provider, &api, &clock, &options).await?
                }
                None => {
                    let provider = RemoteTokenProvider::new(runner, settings.tool_base_dir.clone());
                    deploy_tools(tools, &provider, &api, &clock, &options).await?
                }
            };

            print_report(&report);
            if report.should_fail(options.is_single_tool()) {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => Ok(ExitCode::SUCCESS),
    }
}

fn print_report(report: &BatchReport) {
    for (tool, result) in &report.results {
        match result {
            ToolResult::Completed(outcome) if outcome.is_success() => println!(
                "{} {}: {} ({} polls)",
                "ok".green().bold(),
                tool,
                outcome,
                outcome.polls()
            ),
            ToolResult::Completed(outcome) => println!(
                "{} {}: {} ({} polls)",
                "failed".red().bold(),
                tool,
                outcome,
                outcome.polls()
            ),
            ToolResult::Errored(e) => println!("{} {}: {}", "error".red().bold(), tool, e),
        }
    }
    let unsuccessful = report.unsuccessful();
    if !unsuccessful.is_empty() {
        println!(
            "{} of {} deployments did not succeed",
            unsuccessful.len(),
            report.results.len()
        );
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
