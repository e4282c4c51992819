//! Multi-node commit confirmation.
//!
//! A `DeliveryGroup` watches one transaction id across every observing node:
//!
//! ```text
//! Created -> Connecting -> Connected -> Watching -> Committed
//!                 |                        |-----> Invalidated
//!                 |------------------------|-----> Failed
//!                 |------------------------'-----> TimedOut
//! ```
//!
//! Each phase runs one task per node and joins them against the caller's
//! deadline. The first error reported by any node is kept; later ones are
//! logged and dropped. Sibling tasks are never cancelled because of an
//! error, only when the phase returns.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use ledger_protocols::{create_deliver_envelope, Signer};
use ledger_transport::{DeliverClient, DeliverStream};
use ledger_types::{DeliverResponse, TxId};

use crate::error::{DeliveryError, DeliveryPhase};

/// Lifecycle of a delivery group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Created,
    Connecting,
    Connected,
    Watching,
    Committed,
    Invalidated,
    Failed,
    TimedOut,
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryState::Committed | DeliveryState::Invalidated | DeliveryState::Failed | DeliveryState::TimedOut
        )
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryState::Created => "created",
            DeliveryState::Connecting => "connecting",
            DeliveryState::Connected => "connected",
            DeliveryState::Watching => "watching",
            DeliveryState::Committed => "committed",
            DeliveryState::Invalidated => "invalidated",
            DeliveryState::Failed => "failed",
            DeliveryState::TimedOut => "timed out",
        };
        write!(f, "{}", name)
    }
}

/// First-error-wins slot shared by the node tasks of one group.
#[derive(Clone, Default)]
struct ErrorCell(Arc<Mutex<Option<DeliveryError>>>);

impl ErrorCell {
    async fn set(&self, err: DeliveryError) {
        let mut slot = self.0.lock().await;
        match slot.as_ref() {
            None => {
                warn!("Delivery error recorded: {}", err);
                *slot = Some(err);
            }
            Some(first) => {
                warn!("Discarding delivery error ({}), already failed with: {}", err, first);
            }
        }
    }

    async fn take(&self) -> Option<DeliveryError> {
        self.0.lock().await.take()
    }
}

/// An open stream to one observing node. Dropping it releases the stream.
struct DeliverConnection {
    address: String,
    stream: Box<dyn DeliverStream>,
}

pub struct DeliveryGroup {
    observers: Vec<Arc<dyn DeliverClient>>,
    signer: Arc<dyn Signer>,
    channel_id: String,
    tx_id: TxId,
    connections: Vec<DeliverConnection>,
    error: ErrorCell,
    state: DeliveryState,
}

impl DeliveryGroup {
    pub fn new(
        observers: Vec<Arc<dyn DeliverClient>>,
        signer: Arc<dyn Signer>,
        channel_id: impl Into<String>,
        tx_id: TxId,
    ) -> Self {
        Self {
            observers,
            signer,
            channel_id: channel_id.into(),
            tx_id,
            connections: Vec::new(),
            error: ErrorCell::default(),
            state: DeliveryState::Created,
        }
    }

    pub fn state(&self) -> DeliveryState {
        self.state
    }

    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Number of streams currently held open
    pub fn connected(&self) -> usize {
        self.connections.len()
    }

    /// Open a stream to every observing node and send each a signed seek
    /// request. Completes once every attempt has finished or `deadline` passes.
    pub async fn connect(&mut self, deadline: Instant) -> Result<(), DeliveryError> {
        self.transition(DeliveryState::Created, DeliveryState::Connecting)?;
        info!(
            "Connecting delivery group for {} to {} observing nodes",
            self.tx_id,
            self.observers.len()
        );

        let mut tasks = JoinSet::new();
        for observer in &self.observers {
            let observer = Arc::clone(observer);
            let signer = Arc::clone(&self.signer);
            let channel_id = self.channel_id.clone();
            let cell = self.error.clone();
            tasks.spawn(async move {
                match open_connection(observer.as_ref(), signer.as_ref(), &channel_id).await {
                    Ok(connection) => Some(connection),
                    Err(e) => {
                        cell.set(e).await;
                        None
                    }
                }
            });
        }

        let cell = self.error.clone();
        let joined = timeout_at(deadline, async {
            let mut connections = Vec::with_capacity(tasks.len());
            while let Some(result) = tasks.join_next().await {
                match result {
                    Ok(Some(connection)) => connections.push(connection),
                    Ok(None) => {}
                    Err(e) => cell.set(e.into()).await,
                }
            }
            connections
        })
        .await;

        let Ok(connections) = joined else {
            warn!("Delivery group for {} timed out while connecting", self.tx_id);
            self.state = DeliveryState::TimedOut;
            return Err(DeliveryError::Timeout {
                phase: DeliveryPhase::Connect,
            });
        };

        if let Some(err) = self.error.take().await {
            self.state = DeliveryState::Failed;
            return Err(err);
        }

        debug!("Delivery group for {} connected to {} nodes", self.tx_id, connections.len());
        self.connections = connections;
        self.state = DeliveryState::Connected;
        Ok(())
    }

    /// Wait until every connected node has reported the fate of the target
    /// transaction, or `deadline` passes.
    pub async fn wait(&mut self, deadline: Instant) -> Result<(), DeliveryError> {
        self.transition(DeliveryState::Connected, DeliveryState::Watching)?;
        info!(
            "Waiting for {} on {} observing nodes",
            self.tx_id,
            self.connections.len()
        );

        let mut tasks = JoinSet::new();
        for connection in self.connections.drain(..) {
            let tx_id = self.tx_id.clone();
            let cell = self.error.clone();
            tasks.spawn(async move {
                if let Err(e) = watch(connection, &tx_id).await {
                    cell.set(e).await;
                }
            });
        }

        let cell = self.error.clone();
        let joined = timeout_at(deadline, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    cell.set(e.into()).await;
                }
            }
        })
        .await;

        if joined.is_err() {
            warn!("Delivery group for {} timed out waiting for commit", self.tx_id);
            self.state = DeliveryState::TimedOut;
            return Err(DeliveryError::Timeout {
                phase: DeliveryPhase::Wait,
            });
        }

        match self.error.take().await {
            Some(err) => {
                self.state = match err {
                    DeliveryError::Invalidated { .. } => DeliveryState::Invalidated,
                    _ => DeliveryState::Failed,
                };
                Err(err)
            }
            None => {
                info!("Transaction {} committed on every observing node", self.tx_id);
                self.state = DeliveryState::Committed;
                Ok(())
            }
        }
    }

    fn transition(&mut self, from: DeliveryState, to: DeliveryState) -> Result<(), DeliveryError> {
        if self.state != from {
            return Err(DeliveryError::InvalidState(format!(
                "delivery group for {} is {}, expected {}",
                self.tx_id, self.state, from
            )));
        }
        self.state = to;
        Ok(())
    }
}

async fn open_connection(
    observer: &dyn DeliverClient,
    signer: &dyn Signer,
    channel_id: &str,
) -> Result<DeliverConnection, DeliveryError> {
    let seek = create_deliver_envelope(channel_id, observer.tls_cert_hash(), signer)?;

    let mut stream = observer.deliver_filtered().await?;
    stream.send(&seek).await?;
    debug!("Seek request sent to {}", observer.address());

    Ok(DeliverConnection {
        address: observer.address().to_string(),
        stream,
    })
}

async fn watch(mut connection: DeliverConnection, tx_id: &TxId) -> Result<(), DeliveryError> {
    let address = connection.address.clone();
    loop {
        match connection.stream.recv().await? {
            DeliverResponse::FilteredBlock(block) => {
                let Some(tx) = block.filtered_transactions.iter().find(|tx| &tx.txid == tx_id) else {
                    debug!("Block {} from {} does not contain {}", block.number, address, tx_id);
                    continue;
                };

                if tx.tx_validation_code.is_valid() {
                    debug!("{} confirmed {} in block {}", address, tx_id, block.number);
                    return Ok(());
                }

                return Err(DeliveryError::Invalidated {
                    address,
                    tx_id: tx_id.clone(),
                    code: tx.tx_validation_code,
                });
            }
            DeliverResponse::Status { status } => {
                return Err(DeliveryError::Protocol {
                    address,
                    reason: format!("deliver completed with status ({}) before txid received", status),
                });
            }
            DeliverResponse::Unknown => {
                return Err(DeliveryError::Protocol {
                    address,
                    reason: "unexpected response type".to_string(),
                });
            }
        }
    }
}
