//! Valve table host entry point.
//!
//! Loads configuration, opens the serial link, and runs one command against
//! the table.
//!
//! ```text
//! main()
//!  └─ load_config_from()      -- TOML config plus CLI overrides
//!  └─ open_transport()        -- device node or tcp:// bridge
//!  └─ TableLink::open()       -- builds the chain, sends the reset frame
//!  └─ spawn_worker()          -- single writer thread
//!       └─ command            -- set / fill / clear / resend / diagnostics
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use valve_core::{BoardChain, Coordinate, TableLink, TABLE_LAYOUT};
use valve_table::application::diagnostics;
use valve_table::application::valve_worker::{spawn_worker, ValveHandle, WorkerError};
use valve_table::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use valve_table::infrastructure::transport::{open_transport, Endpoint};

#[derive(Parser)]
#[command(version, about = "Drive the valve table over its serial link")]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device or tcp://host:port, overriding the config file
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Log filter, overriding the config file (RUST_LOG still wins)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open or close one valve
    Set {
        x: i32,
        y: i32,
        #[arg(value_enum)]
        state: ValveState,
    },
    /// Open every valve
    Fill,
    /// Close every valve
    Clear,
    /// Re-send the current state (all closed after start-up)
    Resend,
    /// Alternate one board between closed and open
    CycleBoard {
        /// Board index in wiring order
        index: usize,
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
        #[arg(long, default_value_t = 5)]
        cycles: u32,
    },
    /// Drive every cell in turn, row by row
    Walk {
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,
        #[arg(value_enum, default_value_t = ValveState::On)]
        state: ValveState,
    },
    /// Print the compiled-in board layout and exit
    Layout,
    /// Write the effective configuration to a new config file and exit
    InitConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ValveState {
    On,
    Off,
}

impl ValveState {
    fn is_open(self) -> bool {
        matches!(self, ValveState::On)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => config_file_path()?,
    };
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(endpoint) = args.endpoint {
        config.link.endpoint = endpoint;
    }
    if let Some(level) = args.log_level {
        config.logging.log_level = level;
    }

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    match args.command {
        Command::Layout => {
            let chain = BoardChain::from_specs(&TABLE_LAYOUT)?;
            print!("{}", diagnostics::layout_map(&chain));
            println!("{}", chain.render());
            return Ok(());
        }
        Command::InitConfig => {
            if config_path.exists() {
                anyhow::bail!("{} already exists", config_path.display());
            }
            save_config_to(&config_path, &config)?;
            println!("wrote {}", config_path.display());
            return Ok(());
        }
        _ => {}
    }

    run(&config, args.command).await
}

async fn run(config: &AppConfig, command: Command) -> anyhow::Result<()> {
    let endpoint: Endpoint = config.link.endpoint.parse()?;
    info!(
        %endpoint,
        baud_rate = config.link.baud_rate,
        data_line = config.link.data_line,
        "opening table link"
    );
    let transport = open_transport(&endpoint)?;
    let link = TableLink::open(transport, &TABLE_LAYOUT, config.link.data_line)?;
    let cells = diagnostics::walk_order(link.chain());
    let (handle, join) = spawn_worker(link, config.worker.queue_depth)?;

    let result = match command {
        Command::Set { x, y, state } => handle
            .set(Coordinate::new(x, y), state.is_open())
            .await
            .map_err(anyhow::Error::from),
        Command::Fill => handle.fill().await.map_err(anyhow::Error::from),
        Command::Clear => handle.clear().await.map_err(anyhow::Error::from),
        Command::Resend => handle.resend().await.map_err(anyhow::Error::from),
        Command::CycleBoard {
            index,
            delay_ms,
            cycles,
        } => {
            let delay = Duration::from_millis(delay_ms);
            interruptible(
                &handle,
                diagnostics::cycle_board(&handle, index, delay, cycles),
            )
            .await
        }
        Command::Walk { delay_ms, state } => {
            let delay = Duration::from_millis(delay_ms);
            interruptible(&handle, async {
                let driven =
                    diagnostics::walk(&handle, &cells, delay, state.is_open()).await?;
                info!(driven, "walk complete");
                Ok::<(), WorkerError>(())
            })
            .await
        }
        Command::Layout | Command::InitConfig => Ok(()),
    };

    if let Err(e) = handle.shutdown().await {
        warn!("valve worker already stopped: {e}");
    }
    let link = tokio::task::spawn_blocking(move || join.join())
        .await?
        .map_err(|_| anyhow::anyhow!("valve worker panicked"))?;
    info!(frames_sent = link.frames_sent(), "done");

    result
}

/// Runs a diagnostic until it finishes or Ctrl-C arrives.  On Ctrl-C every
/// valve is closed before returning.
async fn interruptible<F>(handle: &ValveHandle, procedure: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = Result<(), WorkerError>>,
{
    tokio::select! {
        result = procedure => Ok(result?),
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            info!("interrupted, closing all valves");
            handle.clear().await?;
            Ok(())
        }
    }
}
