//! Proposal construction and signing.

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

use ledger_types::{
    ChaincodeInput, ChaincodeInvocationSpec, ChaincodeProposalPayload, ChannelHeader, Header,
    HeaderType, Proposal, SignatureHeader, SignedProposal, TransactionSpec, TxId,
};

use crate::error::Result;
use crate::signer::Signer;

/// Length of the random nonce placed in every signature header
pub const NONCE_SIZE: usize = 24;

/// Transaction id: hex(SHA-256(nonce || creator)).
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> TxId {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    TxId(hex::encode(hasher.finalize()))
}

pub(crate) fn random_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Builds an unsigned endorser proposal from a transaction spec.
pub struct ProposalBuilder<'a> {
    spec: &'a TransactionSpec,
    channel_id: String,
    creator: Vec<u8>,
    nonce: Option<Vec<u8>>,
}

impl<'a> ProposalBuilder<'a> {
    pub fn new(spec: &'a TransactionSpec, channel_id: impl Into<String>, creator: Vec<u8>) -> Self {
        Self {
            spec,
            channel_id: channel_id.into(),
            creator,
            nonce: None,
        }
    }

    /// Fix the nonce instead of drawing a random one
    pub fn with_nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn build(self) -> Result<(Proposal, TxId)> {
        let nonce = self.nonce.unwrap_or_else(random_nonce);
        let tx_id = compute_tx_id(&nonce, &self.creator);

        let invocation = ChaincodeInvocationSpec {
            chaincode_type: self.spec.chaincode_type,
            chaincode_id: self.spec.chaincode.clone(),
            input: ChaincodeInput {
                args: self.spec.args.clone(),
                decorations: Default::default(),
                is_init: self.spec.is_init,
            },
        };

        let proposal = Proposal {
            header: Header {
                channel_header: ChannelHeader {
                    header_type: HeaderType::EndorserTransaction,
                    channel_id: self.channel_id,
                    tx_id: tx_id.clone(),
                    timestamp: Utc::now(),
                    epoch: 0,
                    tls_cert_hash: None,
                },
                signature_header: SignatureHeader {
                    creator: self.creator,
                    nonce,
                },
            },
            payload: ChaincodeProposalPayload {
                input: invocation,
                transient_map: self.spec.private_data.clone(),
            },
        };

        debug!(
            "Built proposal {} for chaincode {} on channel '{}'",
            tx_id,
            self.spec.chaincode.name,
            proposal.channel_id()
        );

        Ok((proposal, tx_id))
    }
}

/// Serialize `proposal` and sign the bytes.
pub fn sign_proposal(proposal: &Proposal, signer: &dyn Signer) -> Result<SignedProposal> {
    let proposal_bytes = ledger_types::to_wire(proposal)?;
    let signature = signer.sign(&proposal_bytes)?;

    Ok(SignedProposal {
        proposal_bytes,
        signature,
        tx_id: proposal.tx_id().clone(),
    })
}
