//! Error taxonomy shared by every operation.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Errors that terminate an invocation.
///
/// Subsystems have their own error enums; this type classifies failures the
/// way users act on them.
#[derive(Debug, Error)]
pub enum JutsuError {
    /// Missing credentials or incomplete local configuration.
    #[error("{message}")]
    Configuration { message: String },

    /// A package, version or local file does not exist. `what` is the
    /// complete message.
    #[error("{what}")]
    NotFound { what: String },

    /// The compiler rejected the flattened source.
    #[error("compilation failed:\n{diagnostics}")]
    Compile { diagnostics: String },

    /// A registry, store, chain or compiler call failed.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// The wallet cannot pay for the registry update.
    #[error("insufficient wallet balance: have {balance}, need {required}")]
    InsufficientFunds { balance: u128, required: u128 },

    /// The registry refused the publish precheck.
    #[error("{reason}")]
    PublishRejected { reason: String },

    /// Two files import each other.
    #[error("cyclic import: {cycle}")]
    CyclicImport { cycle: String },
}

impl JutsuError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            JutsuError::Configuration { .. } => diag.with_suggestion(suggestions::CONFIGURE),
            JutsuError::NotFound { .. } => diag,
            JutsuError::Compile { .. } => diag.with_suggestion(suggestions::BUILD_FAILED),
            JutsuError::Collaborator { collaborator, .. } => diag
                .with_context(format!("while talking to the {}", collaborator))
                .with_suggestion(suggestions::NETWORK),
            JutsuError::InsufficientFunds { .. } => diag.with_suggestion(suggestions::FUND_WALLET),
            JutsuError::PublishRejected { .. } => diag.with_suggestion(suggestions::BUMP_VERSION),
            JutsuError::CyclicImport { .. } => diag.with_suggestion(suggestions::BREAK_CYCLE),
        }
    }
}
