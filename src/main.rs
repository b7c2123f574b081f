use clap::Parser;
use saw::cli::args::Commands;
use saw::cli::{dispatch, version_string, Cli, CommandError, Context};
use saw::output::{create_channel, spawn_printer};
use saw::remote::{CloudWatchLogs, PagedClient};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout stays pipeable
    let default_filter = if cli.verbose { "saw=debug" } else { "saw=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("{}", hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    if let Commands::Version = cli.command {
        println!("{}", version_string());
        return Ok(());
    }

    let mut config = saw::config::load(cli.config.as_deref())?;
    if cli.region.is_some() {
        config.aws.region = cli.region;
    }
    if cli.profile.is_some() {
        config.aws.profile = cli.profile;
    }

    let service = CloudWatchLogs::connect(&config.aws).await;
    let client = PagedClient::new(Arc::new(service))
        .with_query_poll_interval(config.query.poll_interval);

    let (tx, rx) = create_channel();
    let printer = spawn_printer(rx, std::io::stdout());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, shutting down");
                cancel.cancel();
            }
        }
    });

    let ctx = Context {
        client,
        config,
        now: chrono::Utc::now(),
        output: tx,
        cancel,
    };
    let result = dispatch(&ctx, cli.command).await;

    // Dropping the last sender lets the printer drain and finish
    drop(ctx);
    let printed = printer.await;

    result?;
    printed??;
    Ok(())
}
