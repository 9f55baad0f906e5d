//! CLI for tracert.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracert_cli::display::{ConsoleDisplay, JsonDisplay};
use tracert_cli::runner;
use tracert_core::{TraceObserver, TraceParams, DEFAULT_MAX_HOPS, DEFAULT_TIMEOUT_MS};
use tracing_subscriber::EnvFilter;

/// Traces the route to a host with ICMP echo requests.
#[derive(Parser, Debug)]
#[command(name = "tracert")]
#[command(version)]
#[command(about = "Traces the route to a host with ICMP echo requests")]
pub struct Args {
    /// Target hostname or IP address.
    #[arg(required = true)]
    pub target: String,

    /// Maximum number of hops to search for the target.
    #[arg(short = 'm', long = "max-hops", default_value_t = DEFAULT_MAX_HOPS)]
    pub max_hops: u8,

    /// Timeout per probe in milliseconds.
    #[arg(short = 'w', long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Do not resolve addresses to host names.
    #[arg(short = 'd', long = "no-resolve")]
    pub no_resolve: bool,

    /// Print the finished trace as JSON instead of the hop table.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    fn to_params(&self) -> TraceParams {
        TraceParams {
            max_hops: self.max_hops,
            timeout: Duration::from_millis(self.timeout),
            resolve_names: !self.no_resolve,
            ..Default::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let params = args.to_params();
    tracing::debug!(
        target_name = %args.target,
        max_hops = params.max_hops,
        timeout_ms = args.timeout,
        resolve_names = params.resolve_names,
        "Starting trace"
    );

    let mut observer: Box<dyn TraceObserver> = if args.json {
        Box::new(JsonDisplay::stdout())
    } else {
        Box::new(ConsoleDisplay::stdout())
    };

    match runner::run_trace(&args.target, &params, observer.as_mut()).await {
        Ok(session) if runner::is_success(&session) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}.", e);
            ExitCode::FAILURE
        }
    }
}
