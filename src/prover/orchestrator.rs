//! Proof generation pipeline.
//!
//! ```text
//! load circuit -> init executor -> init backend -> validate -> witness
//!     -> proof + public inputs -> verification key -> local verify -> encode
//! ```
//!
//! Stages run strictly in order; any failure aborts the call and no partial
//! artifact is returned. Backend initialisation tries the primary method and
//! then the fallback methods, moving on only when a constructor reports that
//! it does not support the input shape.

use tracing::{debug, info, instrument, warn};

use crate::domain::{ProofArtifact, ProofRequest};

use super::backend::{
    BackendInitError, BackendInput, BackendMethod, CircuitDescription, CircuitSource,
    ProverToolchain, ProvingBackend,
};
use super::{codec, validator, ProverError};

/// Pipeline checkpoints reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadDependencies,
    LoadCircuit,
    InitExecutor,
    InitBackend,
    ValidateInputs,
    BuildWitness,
    GenerateProof,
    VerifyLocally,
    EncodeOutput,
    Done,
}

impl Stage {
    pub fn percent(&self) -> u8 {
        match self {
            Stage::LoadDependencies => 10,
            Stage::LoadCircuit => 20,
            Stage::InitExecutor => 30,
            Stage::InitBackend => 40,
            Stage::ValidateInputs => 50,
            Stage::BuildWitness => 60,
            Stage::GenerateProof => 70,
            Stage::VerifyLocally => 80,
            Stage::EncodeOutput => 90,
            Stage::Done => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::LoadDependencies => "Loading dependencies...",
            Stage::LoadCircuit => "Loading circuit...",
            Stage::InitExecutor => "Initializing executor...",
            Stage::InitBackend => "Initializing backend...",
            Stage::ValidateInputs => "Validating inputs...",
            Stage::BuildWitness => "Generating witness...",
            Stage::GenerateProof => "Generating proof...",
            Stage::VerifyLocally => "Verifying proof locally...",
            Stage::EncodeOutput => "Finalizing...",
            Stage::Done => "Proof generated successfully!",
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub stage: Stage,
    pub percent: u8,
    pub label: &'static str,
}

impl From<Stage> for ProgressUpdate {
    fn from(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
            label: stage.label(),
        }
    }
}

/// Progress observer. Must not block; it cannot influence the pipeline.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressUpdate) + Send + Sync);

/// Which backend construction methods to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStrategy {
    /// Construct directly from the circuit's bytecode field.
    Primary,
    /// Try the alternative input shapes in fixed order.
    Fallback,
}

impl InitStrategy {
    pub fn methods(&self) -> &'static [BackendMethod] {
        match self {
            InitStrategy::Primary => &[BackendMethod::Bytecode],
            InitStrategy::Fallback => &[
                BackendMethod::DecodedBytecode,
                BackendMethod::CircuitDescriptor,
                BackendMethod::AbiOnly,
                BackendMethod::BytecodeBuffer,
            ],
        }
    }
}

/// Drives proof generation against an injected circuit source and toolchain.
pub struct ProofOrchestrator<S, T> {
    source: S,
    toolchain: T,
}

impl<S: CircuitSource, T: ProverToolchain> ProofOrchestrator<S, T> {
    pub fn new(source: S, toolchain: T) -> Self {
        Self { source, toolchain }
    }

    /// Generate a proof, falling back to the alternative backend methods when
    /// the primary one does not accept the bytecode.
    pub async fn generate(
        &self,
        request: &ProofRequest,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ProofArtifact, ProverError> {
        self.run(
            request,
            &[InitStrategy::Primary, InitStrategy::Fallback],
            progress,
        )
        .await
    }

    /// Generate a proof using a single backend initialisation strategy.
    pub async fn generate_with(
        &self,
        strategy: InitStrategy,
        request: &ProofRequest,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ProofArtifact, ProverError> {
        self.run(request, &[strategy], progress).await
    }

    #[instrument(skip_all, fields(threshold = request.threshold))]
    async fn run(
        &self,
        request: &ProofRequest,
        strategies: &[InitStrategy],
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ProofArtifact, ProverError> {
        let notify = |stage: Stage| {
            if let Some(observer) = progress {
                observer(stage.into());
            }
        };

        notify(Stage::LoadDependencies);

        notify(Stage::LoadCircuit);
        let circuit = self.source.load().await?;
        info!(
            noir_version = %circuit.noir_version,
            has_bytecode = !circuit.bytecode.is_empty(),
            "circuit loaded"
        );

        notify(Stage::InitExecutor);
        let executor = self.toolchain.executor(&circuit)?;

        notify(Stage::InitBackend);
        let (backend, method) = self.initialize_backend(&circuit, strategies)?;
        info!(%method, "proving backend initialized");

        notify(Stage::ValidateInputs);
        validator::validate(request)?;

        notify(Stage::BuildWitness);
        let witness = executor.execute(&request.witness_inputs()).await?;
        debug!(witness_len = witness.0.len(), "witness generated");

        notify(Stage::GenerateProof);
        let proof = backend.generate_proof(&witness).await?;
        let verification_key = backend.verification_key().await?;
        debug!(
            proof_len = proof.proof.len(),
            public_inputs = proof.public_inputs.len(),
            "proof generated"
        );

        notify(Stage::VerifyLocally);
        let is_valid = backend.verify_proof(&proof).await?;
        if !is_valid {
            warn!("proof rejected by local verification");
            return Err(ProverError::LocalVerificationFailed);
        }

        notify(Stage::EncodeOutput);
        let proof_encoded = codec::encode(&proof.proof);

        notify(Stage::Done);
        Ok(ProofArtifact::new(
            proof.proof,
            proof_encoded,
            proof.public_inputs,
            verification_key,
            is_valid,
        ))
    }

    fn initialize_backend(
        &self,
        circuit: &CircuitDescription,
        strategies: &[InitStrategy],
    ) -> Result<(Box<dyn ProvingBackend>, BackendMethod), ProverError> {
        let mut attempts = Vec::new();

        for method in strategies.iter().flat_map(|s| s.methods()) {
            debug!(%method, "trying backend initialization");
            match self.construct(*method, circuit) {
                Ok(backend) => return Ok((backend, *method)),
                Err(BackendInitError::Unsupported(message)) => {
                    warn!(%method, %message, "backend initialization method failed");
                    attempts.push((*method, message));
                }
                Err(BackendInitError::Failed(message)) => {
                    return Err(ProverError::BackendInit {
                        method: *method,
                        message,
                    });
                }
            }
        }

        Err(ProverError::BackendInitExhausted { attempts })
    }

    fn construct(
        &self,
        method: BackendMethod,
        circuit: &CircuitDescription,
    ) -> Result<Box<dyn ProvingBackend>, BackendInitError> {
        match method {
            BackendMethod::Bytecode => self
                .toolchain
                .backend(BackendInput::Bytecode(&circuit.bytecode)),
            BackendMethod::DecodedBytecode => {
                let bytes = require_bytecode(circuit).and_then(|b| {
                    codec::decode(b).map_err(|e| BackendInitError::Unsupported(e.to_string()))
                })?;
                self.toolchain
                    .backend(BackendInput::DecodedBytecode(&bytes))
            }
            BackendMethod::CircuitDescriptor => {
                self.toolchain.backend(BackendInput::Circuit(circuit))
            }
            BackendMethod::AbiOnly => self.toolchain.backend(BackendInput::Abi(&circuit.abi)),
            BackendMethod::BytecodeBuffer => {
                let bytes = require_bytecode(circuit).and_then(|b| {
                    codec::decode_lenient(b).map_err(|e| BackendInitError::Unsupported(e.to_string()))
                })?;
                self.toolchain
                    .backend(BackendInput::BytecodeBuffer(&bytes))
            }
        }
    }
}

fn require_bytecode(circuit: &CircuitDescription) -> Result<&str, BackendInitError> {
    if circuit.bytecode.is_empty() {
        Err(BackendInitError::Unsupported(
            "circuit has no bytecode".to_string(),
        ))
    } else {
        Ok(&circuit.bytecode)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{PublicInput, WitnessInputs};
    use crate::prover::backend::{MockCircuitSource, ProofData, Witness, WitnessGenerator};

    #[derive(Clone, Copy)]
    enum Outcome {
        Accept,
        Unsupported,
        Fail,
    }

    struct FakeExecutor {
        executions: Arc<AtomicUsize>,
        reject: bool,
    }

    #[async_trait]
    impl WitnessGenerator for FakeExecutor {
        async fn execute(&self, inputs: &WitnessInputs) -> Result<Witness, ProverError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(ProverError::Witness("Cannot satisfy constraint".into()));
            }
            Ok(Witness(
                format!("{}:{}", inputs.threshold, inputs.nonce).into_bytes(),
            ))
        }
    }

    struct FakeBackend {
        locally_valid: bool,
    }

    #[async_trait]
    impl ProvingBackend for FakeBackend {
        async fn generate_proof(&self, witness: &Witness) -> Result<ProofData, ProverError> {
            let text = String::from_utf8(witness.0.clone()).unwrap();
            let (threshold, nonce) = text.split_once(':').unwrap();
            Ok(ProofData {
                proof: witness.0.iter().rev().copied().collect(),
                public_inputs: vec![threshold.parse().unwrap(), nonce.parse().unwrap()],
            })
        }

        async fn verification_key(&self) -> Result<Vec<u8>, ProverError> {
            Ok(vec![0xAA; 4])
        }

        async fn verify_proof(&self, _proof: &ProofData) -> Result<bool, ProverError> {
            Ok(self.locally_valid)
        }
    }

    struct FakeToolchain {
        outcomes: HashMap<BackendMethod, Outcome>,
        tried: Mutex<Vec<BackendMethod>>,
        executions: Arc<AtomicUsize>,
        reject_witness: bool,
        locally_valid: bool,
    }

    impl FakeToolchain {
        fn accepting(method: BackendMethod) -> Self {
            Self::with_outcomes(&[(method, Outcome::Accept)])
        }

        fn with_outcomes(outcomes: &[(BackendMethod, Outcome)]) -> Self {
            Self {
                outcomes: outcomes.iter().copied().collect(),
                tried: Mutex::new(Vec::new()),
                executions: Arc::new(AtomicUsize::new(0)),
                reject_witness: false,
                locally_valid: true,
            }
        }

        fn tried(&self) -> Vec<BackendMethod> {
            self.tried.lock().unwrap().clone()
        }
    }

    impl ProverToolchain for FakeToolchain {
        fn executor(
            &self,
            _circuit: &CircuitDescription,
        ) -> Result<Box<dyn WitnessGenerator>, ProverError> {
            Ok(Box::new(FakeExecutor {
                executions: self.executions.clone(),
                reject: self.reject_witness,
            }))
        }

        fn backend(
            &self,
            input: BackendInput<'_>,
        ) -> Result<Box<dyn ProvingBackend>, BackendInitError> {
            let method = input.method();
            self.tried.lock().unwrap().push(method);
            match self.outcomes.get(&method).copied().unwrap_or(Outcome::Unsupported) {
                Outcome::Accept => Ok(Box::new(FakeBackend {
                    locally_valid: self.locally_valid,
                })),
                Outcome::Unsupported => Err(BackendInitError::Unsupported(format!(
                    "{method} not accepted"
                ))),
                Outcome::Fail => Err(BackendInitError::Failed("out of memory".into())),
            }
        }
    }

    fn circuit() -> CircuitDescription {
        CircuitDescription {
            bytecode: "AQID".to_string(),
            abi: serde_json::json!({"parameters": []}),
            noir_version: "1.0.0-beta.3".to_string(),
            hash: None,
        }
    }

    fn source() -> MockCircuitSource {
        let mut source = MockCircuitSource::new();
        source.expect_load().returning(|| Ok(circuit()));
        source
    }

    fn valid_request() -> ProofRequest {
        ProofRequest::new(100, "12345", 250, "12345")
    }

    #[tokio::test]
    async fn test_generate_valid_request() {
        let orchestrator =
            ProofOrchestrator::new(source(), FakeToolchain::accepting(BackendMethod::Bytecode));

        let artifact = orchestrator.generate(&valid_request(), None).await.unwrap();

        assert!(artifact.is_valid());
        assert_eq!(artifact.proof_encoded(), codec::encode(artifact.proof()));
        assert_eq!(
            artifact.public_inputs(),
            &[PublicInput::from(100), PublicInput::from(12345)]
        );
        assert_eq!(artifact.verification_key(), &[0xAA; 4]);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_complete() {
        let orchestrator =
            ProofOrchestrator::new(source(), FakeToolchain::accepting(BackendMethod::Bytecode));
        let seen = Mutex::new(Vec::new());
        let observer = |update: ProgressUpdate| seen.lock().unwrap().push(update.percent);

        orchestrator
            .generate(&valid_request(), Some(&observer))
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
    }

    #[tokio::test]
    async fn test_nonce_mismatch_stops_before_witness() {
        let toolchain = FakeToolchain::accepting(BackendMethod::Bytecode);
        let executions = toolchain.executions.clone();
        let orchestrator = ProofOrchestrator::new(source(), toolchain);

        let request = ProofRequest::new(100, "1", 250, "2");
        let err = orchestrator.generate(&request, None).await.unwrap_err();

        assert!(matches!(
            err,
            ProverError::Validation(validator::ValidationError::NonceMismatch)
        ));
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_unsupported() {
        let orchestrator =
            ProofOrchestrator::new(source(), FakeToolchain::accepting(BackendMethod::AbiOnly));

        let artifact = orchestrator.generate(&valid_request(), None).await.unwrap();
        assert!(artifact.is_valid());
        assert_eq!(
            orchestrator.toolchain.tried(),
            vec![
                BackendMethod::Bytecode,
                BackendMethod::DecodedBytecode,
                BackendMethod::CircuitDescriptor,
                BackendMethod::AbiOnly,
            ]
        );
    }

    #[tokio::test]
    async fn test_all_five_methods_exhausted() {
        let orchestrator = ProofOrchestrator::new(source(), FakeToolchain::with_outcomes(&[]));

        let err = orchestrator.generate(&valid_request(), None).await.unwrap_err();
        match err {
            ProverError::BackendInitExhausted { attempts } => {
                assert_eq!(attempts.len(), 5);
                assert_eq!(attempts[0].0, BackendMethod::Bytecode);
                assert_eq!(attempts[4].0, BackendMethod::BytecodeBuffer);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_genuine_failure_is_not_retried() {
        let orchestrator = ProofOrchestrator::new(
            source(),
            FakeToolchain::with_outcomes(&[
                (BackendMethod::Bytecode, Outcome::Fail),
                (BackendMethod::DecodedBytecode, Outcome::Accept),
            ]),
        );

        let err = orchestrator.generate(&valid_request(), None).await.unwrap_err();
        assert!(matches!(
            err,
            ProverError::BackendInit {
                method: BackendMethod::Bytecode,
                ..
            }
        ));
        assert_eq!(orchestrator.toolchain.tried(), vec![BackendMethod::Bytecode]);
    }

    #[tokio::test]
    async fn test_primary_only_strategy_does_not_fall_back() {
        let orchestrator = ProofOrchestrator::new(
            source(),
            FakeToolchain::accepting(BackendMethod::DecodedBytecode),
        );

        let err = orchestrator
            .generate_with(InitStrategy::Primary, &valid_request(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProverError::BackendInitExhausted { .. }));
        assert_eq!(orchestrator.toolchain.tried(), vec![BackendMethod::Bytecode]);
    }

    #[tokio::test]
    async fn test_undecodable_bytecode_skips_decoding_methods() {
        let mut source = MockCircuitSource::new();
        source.expect_load().returning(|| {
            Ok(CircuitDescription {
                bytecode: "%%%".to_string(),
                ..circuit()
            })
        });
        let orchestrator = ProofOrchestrator::new(
            source,
            FakeToolchain::accepting(BackendMethod::BytecodeBuffer),
        );

        let err = orchestrator.generate(&valid_request(), None).await.unwrap_err();
        // Neither decoding method reaches the toolchain.
        assert_eq!(
            orchestrator.toolchain.tried(),
            vec![
                BackendMethod::Bytecode,
                BackendMethod::CircuitDescriptor,
                BackendMethod::AbiOnly,
            ]
        );
        assert!(matches!(err, ProverError::BackendInitExhausted { attempts } if attempts.len() == 5));
    }

    #[tokio::test]
    async fn test_local_verification_failure() {
        let mut toolchain = FakeToolchain::accepting(BackendMethod::Bytecode);
        toolchain.locally_valid = false;
        let orchestrator = ProofOrchestrator::new(source(), toolchain);

        let err = orchestrator.generate(&valid_request(), None).await.unwrap_err();
        assert!(matches!(err, ProverError::LocalVerificationFailed));
    }

    #[tokio::test]
    async fn test_witness_rejection_propagates() {
        let mut toolchain = FakeToolchain::accepting(BackendMethod::Bytecode);
        toolchain.reject_witness = true;
        let orchestrator = ProofOrchestrator::new(source(), toolchain);

        let err = orchestrator.generate(&valid_request(), None).await.unwrap_err();
        assert!(err.to_string().contains("Cannot satisfy constraint"));
    }

    #[tokio::test]
    async fn test_circuit_load_failure_aborts() {
        let mut source = MockCircuitSource::new();
        source
            .expect_load()
            .returning(|| Err(ProverError::CircuitLoad("404".into())));
        let orchestrator =
            ProofOrchestrator::new(source, FakeToolchain::accepting(BackendMethod::Bytecode));

        let err = orchestrator.generate(&valid_request(), None).await.unwrap_err();
        assert!(matches!(err, ProverError::CircuitLoad(_)));
        assert!(orchestrator.toolchain.tried().is_empty());
    }
}
