use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use ai_maps::adapters::ai::OpenAIEngine;
use ai_maps::adapters::http::{app_router, LocationAppState, RouterConfig};
use ai_maps::adapters::maps::GoogleMapsBackend;
use ai_maps::adapters::protocol::serve_stdio;
use ai_maps::application::{MappingAdapter, OrchestrationLoop};
use ai_maps::config::{AppConfig, LogFormat, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "ai-maps", version, about = "Location answers from an LLM driving mapping tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default).
    Serve,

    /// Serve the mapping tools over stdin/stdout.
    McpStdio,

    /// Ask a running server a location question.
    Ask {
        /// The question, e.g. "Top museums in Krakow".
        #[arg(required = true)]
        query: Vec<String>,

        /// Server base URL.
        #[arg(long, default_value = "http://localhost:8000")]
        url: String,

        /// Seconds to wait for the answer.
        #[arg(long, default_value_t = 130)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::McpStdio => mcp_stdio().await,
        Commands::Ask {
            query,
            url,
            timeout_secs,
        } => ask(&url, &query.join(" "), Duration::from_secs(timeout_secs)).await,
    }
}

fn init_tracing(server: &ServerConfig, to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(server.log_level.as_str()));
    let writer = if to_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_ansi(!to_stderr).init(),
    }
}

fn mapping_adapter(config: &AppConfig) -> Result<Arc<MappingAdapter>, Box<dyn Error>> {
    let backend = GoogleMapsBackend::new(config.maps.google_maps_config()?)?;
    Ok(Arc::new(MappingAdapter::new(
        Arc::new(backend),
        config.maps.adapter_config(),
    )))
}

async fn serve() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server, false);
    config.validate()?;

    info!(
        model = %config.reasoning.model,
        openai_key = %config.reasoning.masked_api_key(),
        maps_key = %config.maps.masked_api_key(),
        max_rounds = config.orchestration.max_rounds,
        "Starting ai-maps server"
    );
    if !config.request_timeout_covers_loop() {
        warn!(
            request_timeout_secs = config.server.request_timeout_secs,
            worst_case_secs = config.worst_case_query_time().as_secs(),
            "Request timeout is shorter than the worst-case query time; slow queries will end with 504"
        );
    }

    let adapter = mapping_adapter(&config)?;
    let engine = OpenAIEngine::new(config.reasoning.openai_config()?)?;
    let orchestrator = OrchestrationLoop::new(
        Arc::new(engine),
        adapter.clone(),
        config.orchestration.loop_config(&config.reasoning),
    );

    let router = app_router(
        LocationAppState::new(Arc::new(orchestrator), adapter),
        &RouterConfig {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn mcp_stdio() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server, true);
    config.validate_tools()?;

    info!(maps_key = %config.maps.masked_api_key(), "Starting tool protocol server");
    let adapter = mapping_adapter(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.cancel();
    });

    serve_stdio(adapter, cancel).await?;
    Ok(())
}

async fn ask(base_url: &str, query: &str, timeout: Duration) -> Result<(), Box<dyn Error>> {
    let url = format!("{}/ask-for-location", base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .post(&url)
        .json(&json!({ "query": query }))
        .send()
        .await?;

    let status = response.status();
    let body: Value = response.json().await?;
    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("request failed");
        return Err(format!("{} ({})", message, status).into());
    }

    println!("{}", body["answer"].as_str().unwrap_or_default());

    let locations = body["locations"].as_array().cloned().unwrap_or_default();
    if !locations.is_empty() {
        println!();
        println!("Locations:");
        for location in &locations {
            println!("  - {}", format_location(location));
        }
    }
    Ok(())
}

/// One line per location: name, address when it adds anything, rating.
fn format_location(location: &Value) -> String {
    let name = location["name"].as_str().unwrap_or("?");
    let mut line = match location["address"].as_str() {
        Some(address) if address != name => format!("{} ({})", name, address),
        _ => name.to_string(),
    };
    if let Some(rating) = location["rating"].as_f64() {
        line.push_str(&format!(", rated {:.1}", rating));
    }
    line
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_line_includes_address_and_rating() {
        let location = json!({"name": "MOCAK", "address": "Lipowa 4, Kraków", "rating": 4.6});
        assert_eq!(format_location(&location), "MOCAK (Lipowa 4, Kraków), rated 4.6");
    }

    #[test]
    fn location_line_skips_missing_fields() {
        assert_eq!(format_location(&json!({"name": "Kraków"})), "Kraków");
        assert_eq!(
            format_location(&json!({"name": "Kraków", "address": "Kraków", "rating": 4})),
            "Kraków, rated 4.0"
        );
    }

    #[test]
    fn ask_accepts_timeout_flag() {
        let cli = Cli::try_parse_from(["ai-maps", "ask", "--timeout-secs", "45", "museums", "in", "Krakow"]).unwrap();
        match cli.command {
            Some(Commands::Ask { query, timeout_secs, url }) => {
                assert_eq!(query.join(" "), "museums in Krakow");
                assert_eq!(timeout_secs, 45);
                assert_eq!(url, "http://localhost:8000");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
