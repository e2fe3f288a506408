use std::fmt;

use remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HttpConfig, InMemoryBackend, Remote};
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, build_app_context};

mod demo;
mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTimeout { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout-secs value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api-url value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--api-url <url>] [--timeout-secs <n>]");
    eprintln!("  cargo run -p app -- --demo   # in-memory backend, user demo/demo");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api-url {DEFAULT_BASE_URL}");
    eprintln!("  --timeout-secs {DEFAULT_TIMEOUT_SECS}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_URL, EXAM_API_TIMEOUT_SECS, RUST_LOG");
}

struct Args {
    http: HttpConfig,
    demo: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut http = HttpConfig::default();
        if let Ok(url) = std::env::var("EXAM_API_URL") {
            if !url.trim().is_empty() {
                http.base_url = url;
            }
        }
        if let Some(secs) = std::env::var("EXAM_API_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
        {
            http.timeout_secs = secs;
        }
        let mut demo = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api-url" => {
                    let value = require_value(args, "--api-url")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    http.base_url = value;
                }
                "--timeout-secs" => {
                    let value = require_value(args, "--timeout-secs")?;
                    http.timeout_secs = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or(ArgsError::InvalidTimeout { raw: value })?;
                }
                "--demo" => demo = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { http, demo })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // Backend selection stays in the binary glue so the library crates never read the environment.
    let remote = if parsed.demo {
        info!("using in-memory demo backend");
        Remote::in_memory(demo::seed(InMemoryBackend::new(Clock::default_clock())))
    } else {
        info!(base_url = %parsed.http.base_url, "using HTTP backend");
        Remote::http(&parsed.http)?
    };

    let app = App::new(build_app_context(AppServices::new(remote)));
    terminal::run(app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
