mod logging;
mod presenter;
mod settings;
mod tui;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use orchctl_core::config::ClientConfig;
use orchctl_core::controller::{Action, Controller};
use orchctl_core::dispatch::Dispatcher;
use orchctl_core::http::HttpController;
use orchctl_core::logs::LogPager;
use orchctl_core::model::LogStream;
use orchctl_core::scheduler::{RefreshScheduler, WakeSlot};
use orchctl_core::view::{ModeToggle, group_records};

use presenter::{ConsoleNotifier, StdoutPresenter, format_groups};
use settings::{Overrides, Resolved};

#[derive(Parser)]
#[command(name = "orchctl")]
#[command(about = "Watch and control a process orchestrator", long_about = None)]
struct Cli {
    /// Config file (defaults to ORCHCTL_CONFIG or ./orchctl.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Orchestrator base URL, e.g. http://localhost:8090
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Tui,
    /// Print the process table on every refresh
    Watch,
    /// Print the current process table once
    Status {
        #[arg(long)]
        json: bool,
    },
    Start {
        id: String,
    },
    Stop {
        id: String,
    },
    StartGroup {
        group: String,
    },
    StopGroup {
        group: String,
    },
    StartAll,
    StopAll,
    /// Load the executables on the orchestrator
    Set,
    /// Unload the executables (all processes must be stopped)
    Unset,
    /// Print the full log of a process
    Logs {
        id: String,
        #[arg(short, long, default_value = "errors")]
        stream: LogStream,
    },
}

fn load_config(cli: &Cli) -> Resolved {
    let overrides = Overrides {
        config: cli.config.clone(),
        base_url: cli.base_url.clone(),
        interval_ms: cli.interval_ms,
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match settings::resolve(&overrides, &cwd) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn connect(config: &ClientConfig) -> Arc<dyn Controller> {
    match HttpController::with_timeout(&config.base_url, config.request_timeout()) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_status(controller: Arc<dyn Controller>, json: bool) -> io::Result<()> {
    let records = match controller.status().await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&records).map_err(io::Error::other)?;
        println!("{}", text);
    } else {
        for line in format_groups(&group_records(&records)) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn run_action(controller: Arc<dyn Controller>, action: Action) -> io::Result<()> {
    // No refresh loop here, so the wake slot is never armed
    let (_toggle, toggle_rx) = watch::channel(ModeToggle::Pending);
    let dispatcher = Dispatcher::new(
        controller,
        Arc::new(ConsoleNotifier),
        WakeSlot::new().handle(),
        toggle_rx,
    );

    if !dispatcher.dispatch(action).await.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_logs(controller: Arc<dyn Controller>, id: &str, stream: LogStream) -> io::Result<()> {
    let pager = LogPager::new(controller);

    match pager.fetch_stream(id, stream).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line.message);
            }
            Ok(())
        }
        Err(e) => {
            for line in e.partial() {
                println!("{}", line.message);
            }
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_watch(controller: Arc<dyn Controller>, config: &ClientConfig) -> io::Result<()> {
    let scheduler = RefreshScheduler::new(controller, Arc::new(StdoutPresenter))
        .with_interval(config.refresh_interval());

    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, stopping refresh loop");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let Resolved { config, source } = load_config(&cli);

    let command = cli.command.unwrap_or(Commands::Tui);
    match &command {
        Commands::Tui => {
            let path = config
                .log_file
                .clone()
                .unwrap_or_else(|| PathBuf::from("orchctl.log"));
            logging::init_file(&path, "info")?;
        }
        Commands::Watch => logging::init_stderr("info"),
        _ => logging::init_stderr("warn"),
    }
    match &source {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config"),
        None => tracing::debug!("no config file found, using defaults"),
    }
    tracing::debug!(base_url = %config.base_url, "using orchestrator");

    let controller = connect(&config);

    match command {
        Commands::Tui => tui::run(controller, config.refresh_interval()).await,
        Commands::Watch => run_watch(controller, &config).await,
        Commands::Status { json } => run_status(controller, json).await,
        Commands::Start { id } => run_action(controller, Action::Start { id }).await,
        Commands::Stop { id } => run_action(controller, Action::Stop { id }).await,
        Commands::StartGroup { group } => run_action(controller, Action::StartGroup { group }).await,
        Commands::StopGroup { group } => run_action(controller, Action::StopGroup { group }).await,
        Commands::StartAll => run_action(controller, Action::StartAll).await,
        Commands::StopAll => run_action(controller, Action::StopAll).await,
        Commands::Set => run_action(controller, Action::Set).await,
        Commands::Unset => run_action(controller, Action::Unset).await,
        Commands::Logs { id, stream } => run_logs(controller, &id, stream).await,
    }
}
