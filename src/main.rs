//! resilient-client
//!
//! Issues a single HTTP request through the resilient client (circuit breaker,
//! retries with backoff, per-attempt timeout) and prints the result.
//!
//! ```text
//! resilient-client https://api.example.com/users \
//!     --method POST --header "Content-Type: application/json" \
//!     --data '{"name":"ada"}' --config client.toml --deadline-ms 5000
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use resilient_client::config::{load_config, ClientConfig};
use resilient_client::observability::logging::init_logging;
use resilient_client::{CallContext, Client, Request, TracingLogger};

#[derive(Parser)]
#[command(name = "resilient-client")]
#[command(about = "Send one HTTP request with retries and a circuit breaker", long_about = None)]
struct Cli {
    /// Target URL
    url: String,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// TOML client configuration; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overall deadline for the call, covering every attempt and backoff
    #[arg(long)]
    deadline_ms: Option<u64>,
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{raw}'"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| e.to_string())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|e| e.to_string())?;
    Ok((name, value))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging("resilient_client=info");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    tracing::debug!(
        timeout_ms = config.timeout.as_millis() as u64,
        retry = config.retry.is_some(),
        circuit_breaker = config.circuit_breaker.is_some(),
        "Configuration loaded"
    );

    let client = Client::builder()
        .config(config)
        .logger(Arc::new(TracingLogger))
        .build()?;

    let method = Method::from_bytes(cli.method.to_ascii_uppercase().as_bytes())?;
    let headers: HeaderMap = cli.headers.into_iter().collect();
    let ctx = match cli.deadline_ms {
        Some(ms) => CallContext::background().with_timeout(Duration::from_millis(ms)),
        None => CallContext::background(),
    };

    let mut request = Request::new(method, cli.url)
        .with_headers(headers)
        .with_context(ctx);
    if let Some(data) = cli.data {
        request = request.with_body(data);
    }

    match client.execute(request).await {
        Ok(response) => {
            println!("{}", response.status());
            println!("{}", response.text());
            if response.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
