//! Error types for proposal and envelope construction

use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to load signing key: {0}")]
    KeyLoad(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Wire encoding error: {0}")]
    Wire(#[from] ledger_types::Error),

    #[error("Signer identity does not match the proposal creator")]
    IdentityMismatch,

    #[error("At least one proposal response is required to assemble a transaction")]
    EmptyResponses,

    #[error("Proposal response from {origin} was not successful, error code {status}, msg {message}")]
    UnsuccessfulResponse {
        origin: String,
        status: i32,
        message: String,
    },

    #[error("Proposal response from {origin} carries no endorsement")]
    MissingEndorsement { origin: String },

    #[error("Proposal response payloads do not match (first from {first}, mismatch from {origin})")]
    PayloadMismatch { first: String, origin: String },

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Invalid chaincode definition: {0}")]
    InvalidDefinition(String),
}
