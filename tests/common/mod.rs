//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use stark_vip::domain::{ArtifactPaths, CalldataArray};
use stark_vip::infra::{CalldataGenerator, OnChainVerifier, RelayError};
use stark_vip::report::{Environment, Reporter};
use stark_vip::server::{AppState, StarknetSettings};

/// Calldata generator that returns a fixed array and records the paths it saw.
#[derive(Default)]
pub struct FakeCalldata {
    pub elements: Vec<String>,
    pub calls: Mutex<Vec<ArtifactPaths>>,
}

impl FakeCalldata {
    pub fn returning(elements: &[&str]) -> Self {
        Self {
            elements: elements.iter().map(|e| e.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CalldataGenerator for FakeCalldata {
    async fn generate_calldata(&self, paths: &ArtifactPaths) -> stark_vip::Result<CalldataArray> {
        self.calls.lock().unwrap().push(paths.clone());
        Ok(CalldataArray::new(self.elements.clone()))
    }
}

/// What the fake verifier contract answers.
#[derive(Clone)]
pub enum Verdict {
    Accept(Vec<String>),
    Reject,
    Fail(String),
}

/// On-chain verifier with a scripted verdict.
pub struct FakeVerifier {
    pub verdict: Verdict,
    pub chain_id: String,
    pub calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            chain_id: "0x534e5f5345504f4c4941".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OnChainVerifier for FakeVerifier {
    async fn verify_proof(
        &self,
        _calldata: &CalldataArray,
    ) -> stark_vip::Result<Option<Vec<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.verdict {
            Verdict::Accept(values) => Ok(Some(values.clone())),
            Verdict::Reject => Ok(None),
            Verdict::Fail(message) => Err(RelayError::Rpc(message.clone())),
        }
    }

    async fn chain_id(&self) -> stark_vip::Result<String> {
        Ok(self.chain_id.clone())
    }
}

/// Application state wired to fakes.
pub fn test_state(
    calldata: Arc<FakeCalldata>,
    verifier: Arc<FakeVerifier>,
    starknet: StarknetSettings,
    default_artifacts: Option<ArtifactPaths>,
) -> AppState {
    AppState::new(
        calldata,
        verifier,
        Reporter::new(Environment::new("test")),
        starknet,
        default_artifacts,
    )
}

/// Write `proof`, `vk` and `public_inputs` into `dir`.
pub fn write_artifacts(dir: &Path) -> ArtifactPaths {
    let paths = ArtifactPaths::in_dir(dir);
    std::fs::write(&paths.proof_path, [0xde, 0xad, 0xbe, 0xef]).unwrap();
    std::fs::write(&paths.vk_path, [0x01, 0x02]).unwrap();
    std::fs::write(&paths.public_inputs_path, [0x00; 32]).unwrap();
    paths
}

/// Send one request through the router and decode the JSON body.
pub async fn send_request(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    let body = body
        .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
        .unwrap_or_else(|| Body::from(Vec::new()));

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes();

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}
