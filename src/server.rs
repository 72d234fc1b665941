//! HTTP server bootstrap for the verification relay.
//!
//! This module wires together:
//! - configuration (environment variables, validated at startup)
//! - the calldata generator and the Starknet verifier client
//! - the Axum router

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, OriginalUri};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::api::error::{route_not_found, ApiError};
use crate::api::handlers::{readiness_check, VERSION};
use crate::domain::{network_label, ArtifactPaths, ContractInfo, VERIFIER_ENTRY_POINT};
use crate::infra::{
    shutdown_signal, track_requests, CalldataGenerator, CalldataParseMode,
    GaragaCalldataGenerator, OnChainVerifier, RequestTracker, StarknetVerifier,
};
use crate::relay::VerificationRelay;
use crate::report::{Environment, Reporter};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_RPC_URL: &str = "https://starknet-sepolia.public.blastapi.io";
pub const DEFAULT_CHAIN_ID: &str = "0x534e5f5345504f4c4941";
pub const DEFAULT_CONTRACT_ADDRESS: &str =
    "0x04cb6225c0fdb278ed4d6828c193f8f2edf675f0b08b04dcf972a5a0bd10f7e6";

/// JSON bodies may carry whole proofs inline.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Starknet node and verifier contract settings.
#[derive(Debug, Clone)]
pub struct StarknetSettings {
    pub rpc_url: String,
    pub chain_id: String,
    pub contract_address: String,
    /// `STARKNET_RPC_URL` was set explicitly.
    pub rpc_url_configured: bool,
    /// `CONTRACT_ADDRESS` was set explicitly.
    pub contract_address_configured: bool,
}

impl StarknetSettings {
    pub fn network(&self) -> String {
        network_label(&self.chain_id)
    }

    pub fn contract_info(&self) -> ContractInfo {
        ContractInfo {
            address: self.contract_address.clone(),
            network: self.network(),
            function: VERIFIER_ENTRY_POINT,
            status: if self.contract_address_configured {
                "Configurado"
            } else {
                "Não configurado"
            },
            rpc_url: self.rpc_url.clone(),
            chain_id: self.chain_id.clone(),
        }
    }
}

impl Default for StarknetSettings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            rpc_url_configured: false,
            contract_address_configured: false,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    pub environment: Environment,
    pub starknet: StarknetSettings,
    /// Calldata executable.
    pub garaga_bin: PathBuf,
    pub parse_mode: CalldataParseMode,
    /// Artifacts verified by `POST /api/verify`; unset disables that route.
    pub default_artifacts: Option<ArtifactPaths>,
    /// Circuit description served at `/zk_noir_circuit.json`.
    pub circuit_path: Option<PathBuf>,
    pub cors_allow_origins: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match var("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid PORT {p:?}"))?,
            None => DEFAULT_PORT,
        };
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid listen address {host}:{port}"))?;

        let environment =
            Environment::new(var("NODE_ENV").unwrap_or_else(|| "development".to_string()));

        let rpc_url = var("STARKNET_RPC_URL");
        let contract_address = var("CONTRACT_ADDRESS");
        let starknet = StarknetSettings {
            rpc_url_configured: rpc_url.is_some(),
            contract_address_configured: contract_address.is_some(),
            rpc_url: rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            chain_id: var("STARKNET_CHAIN_ID").unwrap_or_else(|| DEFAULT_CHAIN_ID.to_string()),
            contract_address: contract_address
                .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string()),
        };

        let parse_mode = match var("CALLDATA_PARSE_MODE") {
            Some(mode) => mode
                .parse::<CalldataParseMode>()
                .map_err(|e: String| anyhow::anyhow!("CALLDATA_PARSE_MODE: {e}"))?,
            None => CalldataParseMode::default(),
        };

        Ok(Self {
            listen_addr,
            environment,
            starknet,
            garaga_bin: var("GARAGA_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("garaga")),
            parse_mode,
            default_artifacts: default_artifacts(&var)?,
            circuit_path: var("CIRCUIT_PATH").map(PathBuf::from),
            cors_allow_origins: var("CORS_ALLOW_ORIGINS"),
        })
    }
}

fn default_artifacts(
    var: &impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Option<ArtifactPaths>> {
    const EXPLICIT: [&str; 3] = ["ZK_PROOF_PATH", "ZK_VK_PATH", "ZK_PUBLIC_INPUTS_PATH"];

    let dir = var("ZK_ARTIFACTS_DIR");
    let explicit: Vec<Option<String>> = EXPLICIT.iter().map(|&key| var(key)).collect();
    let set = explicit.iter().filter(|v| v.is_some()).count();

    match (dir, set) {
        (None, 0) => Ok(None),
        (Some(dir), 0) => Ok(Some(ArtifactPaths::in_dir(dir))),
        (Some(_), _) => anyhow::bail!(
            "set either ZK_ARTIFACTS_DIR or ZK_PROOF_PATH/ZK_VK_PATH/ZK_PUBLIC_INPUTS_PATH, not both"
        ),
        (None, 3) => {
            let mut paths = explicit.into_iter().flatten();
            match (paths.next(), paths.next(), paths.next()) {
                (Some(proof), Some(vk), Some(public_inputs)) => {
                    Ok(Some(ArtifactPaths::new(proof, vk, public_inputs)))
                }
                _ => anyhow::bail!("artifact path configuration is incomplete"),
            }
        }
        (None, _) => {
            let missing: Vec<&str> = EXPLICIT
                .iter()
                .zip(&explicit)
                .filter(|(_, value)| value.is_none())
                .map(|(key, _)| *key)
                .collect();
            anyhow::bail!(
                "incomplete artifact configuration, missing {}",
                missing.join(", ")
            )
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<VerificationRelay>,
    pub reporter: Reporter,
    pub starknet: StarknetSettings,
    pub default_artifacts: Option<ArtifactPaths>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        calldata: Arc<dyn CalldataGenerator>,
        verifier: Arc<dyn OnChainVerifier>,
        reporter: Reporter,
        starknet: StarknetSettings,
        default_artifacts: Option<ArtifactPaths>,
    ) -> Self {
        let relay = VerificationRelay::new(
            calldata,
            verifier,
            starknet.contract_address.clone(),
            starknet.network(),
        );
        Self {
            relay: Arc::new(relay),
            reporter,
            starknet,
            default_artifacts,
            started_at: Instant::now(),
        }
    }

    /// Production wiring: `garaga` subprocess and JSON-RPC verifier.
    pub fn from_config(config: &Config) -> Self {
        let calldata = GaragaCalldataGenerator::new(config.garaga_bin.clone(), config.parse_mode);
        let verifier = StarknetVerifier::new(
            config.starknet.rpc_url.clone(),
            config.starknet.contract_address.clone(),
        );
        Self::new(
            Arc::new(calldata),
            Arc::new(verifier),
            Reporter::new(config.environment.clone()),
            config.starknet.clone(),
            config.default_artifacts.clone(),
        )
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Stark VIP API v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Environment: {}", config.environment.name());
    info!("  RPC URL: {}", config.starknet.rpc_url);
    info!("  Network: {}", config.starknet.network());
    info!("  Contract: {}", config.starknet.contract_address);
    info!("  Calldata tool: {}", config.garaga_bin.display());
    match &config.default_artifacts {
        Some(paths) => info!("  Default proof: {}", paths.proof_path.display()),
        None => info!(
            "  Default artifacts not configured (set ZK_ARTIFACTS_DIR to enable POST /api/verify)"
        ),
    }

    let state = AppState::from_config(&config);
    let tracker = Arc::new(RequestTracker::new());

    if let Some(circuit) = &config.circuit_path {
        info!("  Serving circuit from {}", circuit.display());
    }
    let app = build_app(state, &config, tracker.clone())?;

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(());
    });

    info!("Stark VIP API is ready to accept connections");
    tokio::select! {
        result = async { server.await } => result?,
        drained = async {
            let _ = stop_rx.await;
            info!(active = tracker.active_count(), "Waiting for in-flight requests...");
            tracker.wait_for_drain(DRAIN_TIMEOUT).await
        } => {
            if !drained {
                warn!("Stopping with requests still in flight");
            }
        }
    }

    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Router with every endpoint, without CORS or static assets.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", crate::api::router())
        .route("/", get(root))
        .route("/ready", get(readiness_check))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application: API router, optional circuit file, request tracking and CORS.
pub fn build_app(
    state: AppState,
    config: &Config,
    tracker: Arc<RequestTracker>,
) -> anyhow::Result<Router> {
    let mut app = build_router(state);
    if let Some(circuit) = &config.circuit_path {
        app = app.route_service("/zk_noir_circuit.json", ServeFile::new(circuit));
    }
    let mut app = app.layer(axum::middleware::from_fn_with_state(tracker, track_requests));
    if let Some(cors_layer) = cors_layer(config.cors_allow_origins.as_deref())? {
        app = app.layer(cors_layer);
    }
    Ok(app)
}

fn cors_layer(origins: Option<&str>) -> anyhow::Result<Option<CorsLayer>> {
    let origins = match origins.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
    ))
}

/// Service banner.
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Stark VIP API - Backend para verificação de provas ZK",
        "version": VERSION,
        "endpoints": {
            "health": "/api/health",
            "verify": "/api/verify",
            "verifyCustom": "/api/verify/custom",
            "verifyInline": "/api/verify/inline",
            "contractInfo": "/api/verify/contract-info",
        },
    }))
}

async fn fallback(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    route_not_found(method.as_str(), &uri.to_string())
}
