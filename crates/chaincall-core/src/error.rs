//! Error types for transports and batch execution.

use alloy_primitives::Bytes;
use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, bad status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and a caller may try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }
}

/// Errors surfaced by a batch execution.
///
/// Failures of individual sub-calls are not errors: with
/// `requireSuccess = false` they come back as `success == false` entries.
#[derive(Debug, Error)]
pub enum MulticallError {
    /// The ABI schema cannot serialize the given arguments.
    #[error("Encoding `{function}` failed: {reason}")]
    Encoding { function: String, reason: String },

    /// Network or node communication failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The aggregator reverted the whole batch.
    #[error("Aggregator call reverted: {}", .reason.as_deref().unwrap_or("<no reason>"))]
    ContractRevert { reason: Option<String>, data: Bytes },

    /// Response bytes do not match the expected schema or length.
    #[error("Decoding `{function}` failed: {reason}")]
    Decoding { function: String, reason: String },
}

impl MulticallError {
    pub(crate) fn encoding(function: &str, reason: impl Into<String>) -> Self {
        Self::Encoding {
            function: function.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decoding(function: &str, reason: impl Into<String>) -> Self {
        Self::Decoding {
            function: function.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` only for transient transport failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}
