mod api;
mod config;
mod socket;
#[cfg(test)]
mod test_support;
mod vonage;
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use vonage::client::VonageClient;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state accessible from all handlers. Immutable for the
/// life of the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vonage: Arc<VonageClient>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--version") => println!("call-relay {VERSION}"),
        Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            eprintln!("Unknown option: {other}");
            print_usage();
            std::process::exit(1);
        }
        None => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to create tokio runtime: {e}");
                    std::process::exit(1);
                }
            };
            rt.block_on(server());
        }
    }
}

fn print_usage() {
    println!("call-relay {VERSION}");
    println!("Vonage Voice webhook server: bridges two callees and relays call audio to a WebSocket");
    println!();
    println!("Usage: call-relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --version   Print version");
    println!("  --help, -h  Print this help message");
    println!();
    println!("Without options, starts the server. Configuration is read from");
    println!("$CALL_RELAY_CONFIG or ~/.call-relay/config.toml, then .env and the environment.");
}

async fn server() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "call_relay=info,tower_http=info".into()),
        )
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let vonage = match VonageClient::new(&config.vonage) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to create Vonage client: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        service_phone_number = %config.call.service_phone_number,
        api_region = %config.vonage.api_region,
        processor_server = config.call.processor_server.as_deref().unwrap_or("-"),
        signed_webhooks = config.webhook.signature_secret.is_some(),
        "Starting call-relay"
    );

    let addr: SocketAddr = match format!("{}:{}", config.server.host, config.server.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid server address: {e}");
            std::process::exit(1);
        }
    };

    let app = router(AppState {
        config,
        vonage: Arc::new(vonage),
    });

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "Voice API application and connector listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

pub fn router(state: AppState) -> Router {
    // Voice API callbacks; signature checked only when a secret is configured
    let webhooks = Router::new()
        .route("/answer_1", get(webhook::answer::handle_answer))
        .route("/event_1", post(webhook::event::handle_event))
        .route("/event_connect_1", post(webhook::event::handle_event))
        .route("/ws_event", post(webhook::event::handle_event))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            webhook::signature::verify_signature,
        ));

    Router::new()
        // Manual triggers
        .route("/call", get(api::call::handle_call))
        .route(
            "/transfer",
            get(api::transfer::handle_transfer_get).post(api::transfer::handle_transfer_post),
        )
        // Processor results
        .route("/results", post(webhook::event::handle_results))
        // Audio relay socket
        .route("/socket", get(socket::handle_socket_upgrade))
        // Hosting platform health check
        .route("/_/health", get(health))
        .merge(webhooks)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS so browser-based triggers work from any origin.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::OPTIONS,
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            ORIGIN,
            ACCEPT,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("access-control-allow-headers"),
        ])
}

async fn health() -> &'static str {
    "Ok"
}
