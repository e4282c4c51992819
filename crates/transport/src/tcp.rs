//! TCP clients for peers and the sequencer.
//!
//! Each call opens its own connection. Proposals are request/response, the
//! deliver stream stays open until dropped, and broadcasts are write-only.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use ledger_types::{DeliverResponse, EndpointConfig, Envelope, ProposalResponse, SignedProposal};

use crate::client::{BroadcastClient, DeliverClient, DeliverStream, EndorserClient, TransportError};
use crate::frame::{FramedConnection, Request};

/// Resolved connection settings for one remote node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub connect_timeout: Duration,
    pub tls_cert_hash: Option<Vec<u8>>,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            tls_cert_hash: None,
        }
    }

    /// Resolve a configured endpoint, hashing its client certificate if one is set.
    pub fn from_config(config: &EndpointConfig) -> Result<Self, TransportError> {
        let tls_cert_hash = config
            .client_cert_path
            .as_deref()
            .map(hash_certificate_file)
            .transpose()?;

        Ok(Self {
            address: config.address.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            tls_cert_hash,
        })
    }

    async fn connect(&self) -> Result<FramedConnection, TransportError> {
        FramedConnection::connect(&self.address, self.connect_timeout).await
    }
}

fn hash_certificate_file(path: &Path) -> Result<Vec<u8>, TransportError> {
    let der = std::fs::read(path).map_err(|e| {
        TransportError::Configuration(format!(
            "failed to read client certificate {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(Sha256::digest(&der).to_vec())
}

/// Client for a peer acting as endorser and observer.
#[derive(Debug, Clone)]
pub struct TcpPeerClient {
    endpoint: Endpoint,
}

impl TcpPeerClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl EndorserClient for TcpPeerClient {
    fn address(&self) -> &str {
        &self.endpoint.address
    }

    async fn process_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse, TransportError> {
        let mut conn = self.endpoint.connect().await?;
        conn.send(&Request::ProcessProposal(proposal.clone())).await?;

        let mut response: ProposalResponse = conn.recv().await?;
        response.origin = self.endpoint.address.clone();

        debug!(
            "Proposal {} endorsed by {} with status {}",
            proposal.tx_id,
            self.endpoint.address,
            response.status()
        );
        Ok(response)
    }
}

#[async_trait]
impl DeliverClient for TcpPeerClient {
    fn address(&self) -> &str {
        &self.endpoint.address
    }

    async fn deliver_filtered(&self) -> Result<Box<dyn DeliverStream>, TransportError> {
        let mut conn = self.endpoint.connect().await?;
        conn.send(&Request::DeliverFiltered).await?;
        Ok(Box::new(TcpDeliverStream { conn }))
    }

    fn tls_cert_hash(&self) -> Option<Vec<u8>> {
        self.endpoint.tls_cert_hash.clone()
    }
}

/// Open filtered-block stream on a peer connection
pub struct TcpDeliverStream {
    conn: FramedConnection,
}

#[async_trait]
impl DeliverStream for TcpDeliverStream {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        self.conn.send(&Request::Seek(envelope.clone())).await
    }

    async fn recv(&mut self) -> Result<DeliverResponse, TransportError> {
        self.conn.recv().await
    }
}

impl Drop for TcpDeliverStream {
    fn drop(&mut self) {
        debug!("Releasing deliver stream to {}", self.conn.address());
    }
}

/// Client for the sequencing service.
#[derive(Debug, Clone)]
pub struct TcpOrdererClient {
    endpoint: Endpoint,
}

impl TcpOrdererClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl BroadcastClient for TcpOrdererClient {
    fn address(&self) -> &str {
        &self.endpoint.address
    }

    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let mut conn = self.endpoint.connect().await?;
        conn.send(&Request::Broadcast(envelope.clone())).await?;
        debug!("Envelope handed to sequencer at {}", self.endpoint.address);
        Ok(())
    }
}
