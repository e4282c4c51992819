//! Transaction submission and confirmation service
//!
//! Sequences one invocation end to end:
//! build -> sign -> endorse -> evaluate -> assemble -> connect -> submit -> wait.
//! Observing nodes are connected before the envelope reaches the sequencer so
//! the commit cannot land in a block nobody is watching yet.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use ledger_protocols::{create_signed_tx, sign_proposal, ProposalBuilder, Signer};
use ledger_transport::{BroadcastClient, DeliverClient, EndorserClient};
use ledger_types::{Envelope, Proposal, ProposalResponse, SignedProposal, TransactionSpec, TxId};

use crate::broadcaster::EndorsementBroadcaster;
use crate::config::OrchestrationConfig;
use crate::delivery_group::DeliveryGroup;
use crate::error::{OrchestrationError, Result};
use crate::evaluator::{EndorsementVerdict, ResponseEvaluator};

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeStatus {
    /// Every observing node confirmed a valid commit
    Committed,
    /// Handed to the sequencer without waiting for commit
    Submitted,
    /// Endorsement status at or above the error threshold; nothing was submitted
    Rejected,
    /// No endorsement responses came back; nothing was submitted
    NoEndorsement,
}

impl fmt::Display for InvokeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeStatus::Committed => write!(f, "committed"),
            InvokeStatus::Submitted => write!(f, "submitted"),
            InvokeStatus::Rejected => write!(f, "rejected"),
            InvokeStatus::NoEndorsement => write!(f, "no endorsement"),
        }
    }
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeReceipt {
    pub tx_id: TxId,
    /// Representative endorsement response
    pub response: Option<ProposalResponse>,
    pub status: InvokeStatus,
}

/// Main orchestration service.
///
/// Holds no per-invocation state: every call builds its own proposal,
/// transaction id and delivery group, so concurrent calls share nothing
/// mutable.
pub struct OrchestrationService {
    config: OrchestrationConfig,
    signer: Arc<dyn Signer>,
    broadcaster: EndorsementBroadcaster,
    evaluator: ResponseEvaluator,
    observers: Vec<Arc<dyn DeliverClient>>,
    sequencer: Arc<dyn BroadcastClient>,
}

impl OrchestrationService {
    pub fn builder() -> OrchestrationServiceBuilder {
        OrchestrationServiceBuilder::new()
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Submit `spec` on `channel_id` and confirm its commit on every
    /// observing node.
    ///
    /// A rejected endorsement is not an error: the receipt carries the
    /// rejecting response with `InvokeStatus::Rejected`.
    pub async fn submit_and_confirm(&self, spec: &TransactionSpec, channel_id: &str) -> Result<InvokeReceipt> {
        let deadline = Instant::now() + self.config.delivery_timeout;
        self.submit_and_confirm_until(spec, channel_id, deadline).await
    }

    /// Like `submit_and_confirm`, with the commit deadline given by the caller
    /// instead of `OrchestrationConfig::delivery_timeout`.
    pub async fn submit_and_confirm_until(
        &self,
        spec: &TransactionSpec,
        channel_id: &str,
        deadline: Instant,
    ) -> Result<InvokeReceipt> {
        let (proposal, signed) = self.prepare(spec, channel_id)?;
        let tx_id = signed.tx_id.clone();
        info!(
            "Invoking {} on channel {} as transaction {}",
            spec.chaincode.name, channel_id, tx_id
        );

        let responses = self.broadcaster.broadcast(&signed).await?;

        let response = match self.evaluator.evaluate(&responses) {
            EndorsementVerdict::Accepted(response) => response,
            EndorsementVerdict::Rejected(response) => {
                return Ok(InvokeReceipt {
                    tx_id,
                    response: Some(response),
                    status: InvokeStatus::Rejected,
                });
            }
            EndorsementVerdict::Empty => {
                return Ok(InvokeReceipt {
                    tx_id,
                    response: None,
                    status: InvokeStatus::NoEndorsement,
                });
            }
        };

        let envelope = create_signed_tx(&proposal, self.signer.as_ref(), &responses)
            .map_err(OrchestrationError::Assembly)?;
        debug!("Assembled envelope for {} from {} endorsements", tx_id, responses.len());

        if !self.config.wait_for_commit {
            self.submit(&envelope, &tx_id, &response).await?;
            info!("Transaction {} submitted without waiting for commit", tx_id);
            return Ok(InvokeReceipt {
                tx_id,
                response: Some(response),
                status: InvokeStatus::Submitted,
            });
        }

        let mut group = DeliveryGroup::new(
            self.observers.clone(),
            Arc::clone(&self.signer),
            channel_id,
            tx_id.clone(),
        );

        group.connect(deadline).await.map_err(|e| {
            error!("Delivery connect failed for {}: {}", tx_id, e);
            OrchestrationError::DeliveryConnect(e)
        })?;

        self.submit(&envelope, &tx_id, &response).await?;

        group.wait(deadline).await.map_err(|e| {
            error!("Delivery wait failed for {}: {}", tx_id, e);
            OrchestrationError::DeliveryWait(e)
        })?;

        info!("Transaction {} committed", tx_id);
        Ok(InvokeReceipt {
            tx_id,
            response: Some(response),
            status: InvokeStatus::Committed,
        })
    }

    /// Endorse `spec` and return the verdict without submitting anything.
    pub async fn evaluate(&self, spec: &TransactionSpec, channel_id: &str) -> Result<EndorsementVerdict> {
        let (_, signed) = self.prepare(spec, channel_id)?;
        info!(
            "Evaluating {} on channel {} as transaction {}",
            spec.chaincode.name, channel_id, signed.tx_id
        );

        let responses = self.broadcaster.broadcast(&signed).await?;
        Ok(self.evaluator.evaluate(&responses))
    }

    fn prepare(&self, spec: &TransactionSpec, channel_id: &str) -> Result<(Proposal, SignedProposal)> {
        let creator = self.signer.serialize().map_err(OrchestrationError::Proposal)?;
        let (proposal, _) = ProposalBuilder::new(spec, channel_id, creator)
            .build()
            .map_err(OrchestrationError::Proposal)?;
        let signed = sign_proposal(&proposal, self.signer.as_ref()).map_err(OrchestrationError::Proposal)?;
        Ok((proposal, signed))
    }

    async fn submit(
        &self,
        envelope: &Envelope,
        tx_id: &TxId,
        response: &ProposalResponse,
    ) -> Result<()> {
        self.sequencer.send(envelope).await.map_err(|source| {
            error!(
                "Failed to submit {} to sequencer {}: {}",
                tx_id,
                self.sequencer.address(),
                source
            );
            OrchestrationError::Submission {
                tx_id: tx_id.clone(),
                response: Box::new(response.clone()),
                source,
            }
        })?;
        debug!("Transaction {} sent to sequencer {}", tx_id, self.sequencer.address());
        Ok(())
    }
}

/// Builder for OrchestrationService
#[derive(Default)]
pub struct OrchestrationServiceBuilder {
    config: Option<OrchestrationConfig>,
    signer: Option<Arc<dyn Signer>>,
    endorsers: Vec<Arc<dyn EndorserClient>>,
    observers: Vec<Arc<dyn DeliverClient>>,
    sequencer: Option<Arc<dyn BroadcastClient>>,
}

impl OrchestrationServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: OrchestrationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_endorsers(mut self, endorsers: Vec<Arc<dyn EndorserClient>>) -> Self {
        self.endorsers = endorsers;
        self
    }

    pub fn add_endorser(mut self, endorser: Arc<dyn EndorserClient>) -> Self {
        self.endorsers.push(endorser);
        self
    }

    pub fn with_observers(mut self, observers: Vec<Arc<dyn DeliverClient>>) -> Self {
        self.observers = observers;
        self
    }

    pub fn add_observer(mut self, observer: Arc<dyn DeliverClient>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_sequencer(mut self, sequencer: Arc<dyn BroadcastClient>) -> Self {
        self.sequencer = Some(sequencer);
        self
    }

    pub fn build(self) -> Result<OrchestrationService> {
        let config = self.config.unwrap_or_default();
        let signer = self
            .signer
            .ok_or_else(|| OrchestrationError::Config("signer is required".to_string()))?;
        let sequencer = self
            .sequencer
            .ok_or_else(|| OrchestrationError::Config("sequencer is required".to_string()))?;

        if self.endorsers.is_empty() {
            return Err(OrchestrationError::Config(
                "at least one endorsing node is required".to_string(),
            ));
        }
        if self.observers.is_empty() && config.wait_for_commit {
            warn!("No observing nodes configured, commits will be reported without confirmation");
        }

        Ok(OrchestrationService {
            evaluator: ResponseEvaluator::new(config.error_threshold),
            broadcaster: EndorsementBroadcaster::new(self.endorsers),
            config,
            signer,
            observers: self.observers,
            sequencer,
        })
    }
}
