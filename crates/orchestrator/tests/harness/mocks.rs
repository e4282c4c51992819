use async_trait::async_trait;
use ledger_protocols::envelope_tx_id;
use ledger_transport::{BroadcastClient, DeliverClient, DeliverStream, EndorserClient, TransportError};
use ledger_types::{
    DeliverResponse, Endorsement, Envelope, FilteredBlock, FilteredTransaction, ProposalResponse, Response,
    SignedProposal, TxId, TxValidationCode,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

pub struct MockEndorser {
    address: String,
    status: i32,
    payload: Vec<u8>,
    delay: Duration,
    fail: bool,
    received: Mutex<Vec<SignedProposal>>,
}

impl MockEndorser {
    pub fn new(address: &str, status: i32, payload: &[u8]) -> Self {
        Self {
            address: address.to_string(),
            status,
            payload: payload.to_vec(),
            delay: Duration::ZERO,
            fail: false,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(address: &str) -> Self {
        let mut endorser = Self::new(address, 200, b"");
        endorser.fail = true;
        endorser
    }

    #[allow(dead_code)]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn received(&self) -> Vec<SignedProposal> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EndorserClient for MockEndorser {
    fn address(&self) -> &str {
        &self.address
    }

    async fn process_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse, TransportError> {
        tokio::time::sleep(self.delay).await;
        if let Ok(mut received) = self.received.lock() {
            received.push(proposal.clone());
        }
        if self.fail {
            return Err(TransportError::StreamClosed {
                address: self.address.clone(),
            });
        }

        Ok(ProposalResponse {
            response: Response {
                status: self.status,
                message: if self.status >= 400 { "chaincode error".to_string() } else { String::new() },
                payload: self.payload.clone(),
            },
            payload: self.payload.clone(),
            endorsement: Some(Endorsement {
                endorser: self.address.as_bytes().to_vec(),
                signature: b"endorsed".to_vec(),
            }),
            origin: self.address.clone(),
        })
    }
}

/// Sequencer that commits every submitted envelope in its own block and
/// announces it to subscribed observers.
pub struct MockSequencer {
    commits: broadcast::Sender<TxId>,
    submitted: Mutex<Vec<Envelope>>,
    fail: bool,
}

impl MockSequencer {
    pub fn new() -> Self {
        let (commits, _) = broadcast::channel(64);
        Self { commits, submitted: Mutex::new(Vec::new()), fail: false }
    }

    pub fn failing() -> Self {
        let mut sequencer = Self::new();
        sequencer.fail = true;
        sequencer
    }

    pub fn submitted(&self) -> Vec<Envelope> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TxId> {
        self.commits.subscribe()
    }
}

impl Default for MockSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastClient for MockSequencer {
    fn address(&self) -> &str {
        "orderer0:7050"
    }

    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::StreamClosed { address: "orderer0:7050".to_string() });
        }

        let tx_id = envelope_tx_id(envelope).map_err(|e| TransportError::Codec {
            address: "orderer0:7050".to_string(),
            reason: e.to_string(),
        })?;
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(envelope.clone());
        }
        // No receivers simply means nobody is watching
        let _ = self.commits.send(tx_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverBehavior {
    /// Report every committed transaction with this validation code
    Report(TxValidationCode),
    /// Never emit anything
    Silent,
    /// End the stream with a status before any block
    EndStream(i32),
    /// Refuse to open a stream
    Refuse,
}

#[derive(Default)]
pub struct StreamCounters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
}

impl StreamCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

pub struct MockObserver {
    address: String,
    behavior: ObserverBehavior,
    sequencer: Arc<MockSequencer>,
    counters: Arc<StreamCounters>,
}

impl MockObserver {
    pub fn new(address: &str, behavior: ObserverBehavior, sequencer: &Arc<MockSequencer>) -> Self {
        Self {
            address: address.to_string(),
            behavior,
            sequencer: Arc::clone(sequencer),
            counters: Arc::new(StreamCounters::default()),
        }
    }

    pub fn counters(&self) -> Arc<StreamCounters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl DeliverClient for MockObserver {
    fn address(&self) -> &str {
        &self.address
    }

    async fn deliver_filtered(&self) -> Result<Box<dyn DeliverStream>, TransportError> {
        if self.behavior == ObserverBehavior::Refuse {
            return Err(TransportError::ConnectTimeout {
                address: self.address.clone(),
                after: Duration::from_secs(6),
            });
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDeliverStream {
            address: self.address.clone(),
            behavior: self.behavior,
            commits: self.sequencer.subscribe(),
            seeked: false,
            block_number: 0,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockDeliverStream {
    address: String,
    behavior: ObserverBehavior,
    commits: broadcast::Receiver<TxId>,
    seeked: bool,
    block_number: u64,
    counters: Arc<StreamCounters>,
}

impl Drop for MockDeliverStream {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliverStream for MockDeliverStream {
    async fn send(&mut self, _envelope: &Envelope) -> Result<(), TransportError> {
        self.seeked = true;
        Ok(())
    }

    async fn recv(&mut self) -> Result<DeliverResponse, TransportError> {
        if !self.seeked {
            return Ok(DeliverResponse::Status { status: 400 });
        }

        let code = match self.behavior {
            ObserverBehavior::Report(code) => code,
            ObserverBehavior::EndStream(status) => return Ok(DeliverResponse::Status { status }),
            ObserverBehavior::Silent | ObserverBehavior::Refuse => return Ok(std::future::pending().await),
        };

        loop {
            match self.commits.recv().await {
                Ok(tx_id) => {
                    self.block_number += 1;
                    let number = self.block_number;
                    return Ok(DeliverResponse::FilteredBlock(FilteredBlock {
                        channel_id: "mychannel".to_string(),
                        number,
                        filtered_transactions: vec![FilteredTransaction { txid: tx_id, tx_validation_code: code }],
                    }));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(TransportError::StreamClosed { address: self.address.clone() })
                }
            }
        }
    }
}
