//! Tripsmith CLI entry point

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tripsmith::cli::{Cli, Command, PlanArgs};
use tripsmith::{TripConfig, TripError, TripOrchestrator, logging, web};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<TripError>() {
                Some(trip_err) => eprintln!("❌ {}", trip_err.user_message()),
                None => eprintln!("❌ {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config =
        TripConfig::load_from_path(cli.config.clone()).context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose).context("Failed to setup logging")?;
    debug!(
        weather = %config.providers.weather.base_url,
        insights = %config.providers.insights.base_url,
        booking = %config.providers.booking.base_url,
        "Configuration loaded"
    );

    let orchestrator = Arc::new(
        TripOrchestrator::from_config(&config).context("Failed to build orchestrator")?,
    );

    match cli.command {
        Command::Plan(args) => cmd_plan(&orchestrator, &args).await,
        Command::Serve { port } => {
            let mut server = config.server.clone();
            if let Some(port) = port {
                server.port = port;
            }
            web::run(orchestrator, &server).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Health => cmd_health(&orchestrator).await,
    }
}

async fn cmd_plan(orchestrator: &TripOrchestrator, args: &PlanArgs) -> Result<ExitCode> {
    let request = args.request();
    let options = args.options();

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let plan = orchestrator
        .plan_trip_with_cancel(&request, &options, &cancel)
        .await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?
        );
    } else {
        println!("{plan}");
    }

    info!(complete = plan.is_complete(), "Plan printed");
    Ok(if plan.is_usable() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

async fn cmd_health(orchestrator: &TripOrchestrator) -> Result<ExitCode> {
    let health = orchestrator.health().await;
    for (source, up) in &health {
        let mark = if *up { "✅" } else { "❌" };
        println!("{mark} {} {source}", source.emoji());
    }
    Ok(if health.values().all(|up| *up) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
