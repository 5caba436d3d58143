use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use futures::future::join_all;
use pingwatch::{
    actors::{
        console::{ConsoleHandle, serve_commands},
        historian::HistorianHandle,
        poller::PollerHandle,
    },
    config::{Config, default_config_path, read_config_file},
    context::Context,
    probe::{Prober, SystemPing},
    util::{get_addr, get_port, startup_jitter},
};
use tokio::{io::BufReader, spawn, sync::broadcast};
use tracing::{debug, error, info, instrument, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Alerts buffered for slow subscribers before they start lagging
const ALERT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Parser)]
#[command(about = "Ping a set of hosts and report packet loss and jitter")]
struct Args {
    /// Config file, defaults to $PINGWATCH_CONFIG or <config dir>/pingwatch.json
    #[arg(short)]
    config: Option<PathBuf>,

    /// Echo raw ping output with every alert and log at trace level
    #[arg(short)]
    verbose: bool,

    /// Start all targets at once instead of staggering them
    #[arg(long)]
    synchronized: bool,
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::DEBUG
    };
    let filter = filter::Targets::new().with_targets(vec![("pingwatch", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let path = match args.config {
        Some(path) => path,
        None => default_config_path().context("no config file given and no config directory")?,
    };
    let mut config = read_config_file(&path)?;
    config.verbose |= args.verbose;
    config.ping.synchronized |= args.synchronized;
    config.web.ip = get_addr(config.web.ip);
    config.web.port = get_port(config.web.port);
    let config = Arc::new(config);

    let context = Arc::new(Context::new(&config.targets, config.verbose));
    let (alert_tx, alert_rx) = broadcast::channel(ALERT_CHANNEL_CAPACITY);

    let historian = HistorianHandle::spawn(
        config.ping.history_length,
        config.ping.thresholds(),
        context.clone(),
        alert_tx,
    );
    let console = ConsoleHandle::spawn(tokio::io::stdout(), alert_rx, config.verbose);

    let pollers = dispatch_pollers(&config, &historian);

    spawn(command_loop(
        config.targets.clone(),
        historian.clone(),
        console.clone(),
    ));

    if let Some(secs) = config.ping.report_interval.filter(|s| *s > 0) {
        spawn(periodic_report(
            Duration::from_secs(secs),
            historian.clone(),
            console.clone(),
        ));
    }

    #[cfg(feature = "api")]
    if config.web.enabled {
        use pingwatch::api::{ApiConfig, ApiState, spawn_api_server};

        let api_config = ApiConfig::new((config.web.ip, config.web.port).into());
        let state = ApiState::new(historian.clone(), config.clone(), context.clone());
        if let Err(e) = spawn_api_server(api_config, state).await {
            error!("failed to start API server: {e:#}");
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");

    join_all(pollers.iter().map(PollerHandle::shutdown)).await;
    let _ = console.flush().await;
    console.shutdown().await;
    historian.shutdown().await;

    Ok(())
}

/// Spawn one poller per configured target
fn dispatch_pollers(config: &Config, historian: &HistorianHandle) -> Vec<PollerHandle> {
    let prober: Arc<dyn Prober> = Arc::new(SystemPing::new());
    let params = config.ping.probe_params();
    let interval = config.ping.check_interval();

    config
        .targets
        .iter()
        .map(|target| {
            let delay = startup_jitter(config.targets.len(), config.ping.synchronized);
            debug!("{target}: first round in {delay:?}");

            PollerHandle::spawn(
                target.clone(),
                prober.clone(),
                params,
                interval,
                delay,
                historian.clone(),
            )
        })
        .collect()
}

#[instrument(skip_all)]
async fn command_loop(targets: Vec<String>, historian: HistorianHandle, console: ConsoleHandle) {
    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = serve_commands(stdin, &targets, &historian, &console).await {
        error!("command input failed: {e:#}");
    }
}

#[instrument(skip_all)]
async fn periodic_report(every: Duration, historian: HistorianHandle, console: ConsoleHandle) {
    debug!("printing a report every {every:?}");
    let mut ticker = tokio::time::interval(every);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let lines = match historian.report().await {
            Ok(lines) => lines,
            Err(e) => {
                error!("failed to build report: {e:#}");
                break;
            }
        };

        if console.print(lines).await.is_err() {
            break;
        }
    }
}
