//! Error types for the orchestration service

use std::fmt;

use thiserror::Error;

use ledger_protocols::ProtocolError;
use ledger_transport::TransportError;
use ledger_types::{ProposalResponse, TxId, TxValidationCode};

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// The two deadline-bounded delivery phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPhase {
    Connect,
    Wait,
}

impl fmt::Display for DeliveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryPhase::Connect => write!(f, "connect"),
            DeliveryPhase::Wait => write!(f, "wait"),
        }
    }
}

/// Errors raised by a delivery group
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Transaction {tx_id} invalidated by {address} with code {code}")]
    Invalidated {
        address: String,
        tx_id: TxId,
        code: TxValidationCode,
    },

    #[error("Protocol error from {address}: {reason}")]
    Protocol { address: String, reason: String },

    #[error("Timed out in delivery {phase} phase")]
    Timeout { phase: DeliveryPhase },

    #[error("Failed to build seek envelope: {0}")]
    Envelope(#[from] ProtocolError),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Delivery task failed: {0}")]
    Task(String),
}

impl DeliveryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeliveryError::Timeout { .. })
    }
}

impl From<tokio::task::JoinError> for DeliveryError {
    fn from(err: tokio::task::JoinError) -> Self {
        DeliveryError::Task(format!("Task join error: {}", err))
    }
}

/// Errors that can occur during orchestration, named by failing phase
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Proposal error: {0}")]
    Proposal(#[source] ProtocolError),

    #[error("Endorsement error: {0}")]
    Endorsement(#[from] TransportError),

    #[error("Envelope assembly error: {0}")]
    Assembly(#[source] ProtocolError),

    #[error("Delivery connect error: {0}")]
    DeliveryConnect(#[source] DeliveryError),

    #[error("Submission of {tx_id} failed: {source}")]
    Submission {
        tx_id: TxId,
        /// Endorsement response obtained before the failed send
        response: Box<ProposalResponse>,
        #[source]
        source: TransportError,
    },

    #[error("Delivery wait error: {0}")]
    DeliveryWait(#[source] DeliveryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for OrchestrationError {
    fn from(err: tokio::task::JoinError) -> Self {
        OrchestrationError::Internal(format!("Task join error: {}", err))
    }
}
