//! Concurrent proposal fan-out to endorsing nodes.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use ledger_transport::EndorserClient;
use ledger_types::{ProposalResponse, SignedProposal};

use crate::error::{OrchestrationError, Result};

/// Sends one signed proposal to every endorsing node.
///
/// All calls run to completion. On success the responses are returned in
/// completion order, so position 0 is whichever node answered first. Any
/// transport error fails the whole broadcast; when several nodes fail, the
/// first error to complete is reported. Dropping the broadcast future
/// aborts the outstanding calls.
pub struct EndorsementBroadcaster {
    endorsers: Vec<Arc<dyn EndorserClient>>,
}

impl EndorsementBroadcaster {
    pub fn new(endorsers: Vec<Arc<dyn EndorserClient>>) -> Self {
        Self { endorsers }
    }

    pub fn len(&self) -> usize {
        self.endorsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endorsers.is_empty()
    }

    pub async fn broadcast(&self, proposal: &SignedProposal) -> Result<Vec<ProposalResponse>> {
        let proposal = Arc::new(proposal.clone());

        let mut pending = JoinSet::new();
        for endorser in &self.endorsers {
            let endorser = Arc::clone(endorser);
            let proposal = Arc::clone(&proposal);
            pending.spawn(async move {
                let address = endorser.address().to_string();
                endorser
                    .process_proposal(&proposal)
                    .await
                    .map_err(|e| (address, e))
            });
        }

        let mut responses = Vec::with_capacity(self.endorsers.len());
        let mut first_error: Option<OrchestrationError> = None;

        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok(Ok(response)) => {
                    debug!(
                        "Endorsement for {} from {} (status {})",
                        proposal.tx_id,
                        response.origin,
                        response.status()
                    );
                    responses.push(response);
                }
                Ok(Err((address, e))) => {
                    warn!("Endorser {} failed for {}: {}", address, proposal.tx_id, e);
                    first_error.get_or_insert(OrchestrationError::Endorsement(e));
                }
                Err(e) => {
                    warn!("Endorsement task for {} failed: {}", proposal.tx_id, e);
                    first_error.get_or_insert(e.into());
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(responses),
        }
    }
}
