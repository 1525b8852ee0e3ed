use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_scout::{
    config::Config,
    job_scheduling::{JobKind, JobRunner, JobScheduler},
};

#[derive(Parser)]
#[command(name = "iptv-scout")]
#[command(version)]
#[command(about = "Discovers multicast IPTV portals and publishes a speed-ranked M3U playlist")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Speed test stored channels and write the ranked playlist
    Publish {
        /// Playlist path (defaults to playlist.output_path)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Concurrent speed tests (defaults to speed_test.concurrency)
        #[arg(short = 'n', long, value_name = "N")]
        concurrency: Option<usize>,
    },
    /// Probe stored portal addresses for channel manifests
    Discover,
    /// Query search indexes for new portal addresses
    Harvest,
    /// Run the cron scheduler until interrupted
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("iptv_scout={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting iptv-scout v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }
    info!("Using database: {}", config.database.url);

    let runner = JobRunner::new(config);

    match cli.command {
        Some(Command::Publish {
            output,
            concurrency,
        }) => {
            let output =
                output.unwrap_or_else(|| runner.config().playlist.output_path.clone());
            let concurrency =
                concurrency.unwrap_or(runner.config().speed_test.concurrency);
            let report = runner
                .run_speed_rank_and_publish(&output, concurrency)
                .await?;
            info!(
                "Published {} channels to {}",
                report.published,
                output.display()
            );
        }
        Some(Command::Discover) => runner.run_job(JobKind::Discovery).await?,
        Some(Command::Harvest) => runner.run_job(JobKind::Harvest).await?,
        Some(Command::Schedule) => run_scheduler(runner).await?,
        None => interactive_menu(runner).await?,
    }

    Ok(())
}

async fn run_scheduler(runner: JobRunner) -> Result<()> {
    let cancellation_token = CancellationToken::new();
    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping scheduler");
            signal_token.cancel();
        }
    });

    JobScheduler::new(runner)?.run(cancellation_token).await?;
    Ok(())
}

fn print_menu() -> Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(stdout)?;
    writeln!(stdout, "iptv-scout: choose an action")?;
    writeln!(stdout, "1. Speed test channels and publish the playlist")?;
    writeln!(stdout, "2. Discover channels from stored addresses")?;
    writeln!(stdout, "3. Harvest portal addresses")?;
    writeln!(stdout, "4. Start the scheduler")?;
    writeln!(stdout, "5. Exit")?;
    write!(stdout, "Enter an option (1-5): ")?;
    stdout.flush()?;
    Ok(())
}

async fn interactive_menu(runner: JobRunner) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_menu()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let kind = match line.trim().parse::<u8>() {
            Ok(1) => JobKind::Publish,
            Ok(2) => JobKind::Discovery,
            Ok(3) => JobKind::Harvest,
            Ok(4) => return run_scheduler(runner).await,
            Ok(5) => {
                info!("Exiting");
                return Ok(());
            }
            Ok(_) => {
                println!("Invalid option, enter a number between 1 and 5.");
                continue;
            }
            Err(_) => {
                println!("Please enter a valid number.");
                continue;
            }
        };

        if let Err(e) = runner.run_job(kind).await {
            error!("{} job failed: {}", kind, e);
        }
    }
}
