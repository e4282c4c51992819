//! Client traits for remote nodes.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use ledger_types::{DeliverResponse, Envelope, ProposalResponse, SignedProposal};

/// Errors raised while talking to a remote node.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out connecting to {address} after {after:?}")]
    ConnectTimeout { address: String, after: Duration },

    #[error("I/O error talking to {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode frame from {address}: {reason}")]
    Codec { address: String, reason: String },

    #[error("Stream to {address} closed")]
    StreamClosed { address: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// An endorsing node.
#[async_trait]
pub trait EndorserClient: Send + Sync {
    fn address(&self) -> &str;

    /// Simulate the proposal and return the node's signed response
    async fn process_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse, TransportError>;
}

/// An observing node offering a filtered block stream.
#[async_trait]
pub trait DeliverClient: Send + Sync {
    fn address(&self) -> &str;

    /// Open a new filtered-block stream
    async fn deliver_filtered(&self) -> Result<Box<dyn DeliverStream>, TransportError>;

    /// Hash of the client certificate presented to this node, if any
    fn tls_cert_hash(&self) -> Option<Vec<u8>> {
        None
    }
}

/// One open filtered-block stream. Dropping it releases the connection.
#[async_trait]
pub trait DeliverStream: Send {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError>;

    async fn recv(&mut self) -> Result<DeliverResponse, TransportError>;
}

/// The sequencing service.
#[async_trait]
pub trait BroadcastClient: Send + Sync {
    fn address(&self) -> &str;

    /// Hand an envelope to the sequencer. Success means the bytes were
    /// written, nothing more.
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError>;
}
