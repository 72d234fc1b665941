//! Uniform status reports for local and on-chain verification outcomes.

use std::error::Error as StdError;

use serde::Serialize;

use crate::domain::{ProofArtifact, VerificationResult};
use crate::infra::RelayError;

/// Deployment environment, taken from `NODE_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        self.0.eq_ignore_ascii_case("production")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("development")
    }
}

/// `{ success, message, details? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Turns outcomes into [`Report`]s. Error details are withheld in production.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    environment: Environment,
}

impl Reporter {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// A completed on-chain call is a success even when the contract said no;
    /// the verdict is in `result.is_valid` and in the message.
    pub fn report_result(&self, result: &VerificationResult) -> Report {
        let message = if result.is_valid {
            "Prova verificada com sucesso"
        } else {
            "Prova rejeitada pelo contrato verificador"
        };
        Report {
            success: true,
            message: message.to_string(),
            details: None,
        }
    }

    /// Report on a locally generated proof.
    pub fn report_artifact(&self, artifact: &ProofArtifact) -> Report {
        let message = if artifact.is_valid() {
            "Prova gerada e verificada localmente"
        } else {
            "Verificação local falhou"
        };
        Report {
            success: artifact.is_valid(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn report_error(&self, error: &(dyn StdError + 'static)) -> Report {
        let message = match error.downcast_ref::<RelayError>() {
            Some(relay) => relay.user_message(),
            None => error.to_string(),
        };
        Report {
            success: false,
            message,
            details: self.details(error),
        }
    }

    /// Full cause chain, one cause per line; `None` in production.
    pub fn details(&self, error: &(dyn StdError + 'static)) -> Option<String> {
        if self.environment.is_production() {
            return None;
        }
        let mut chain = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Some(chain.join("\n"))
    }
}
