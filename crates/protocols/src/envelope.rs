//! Assembly of endorsed transactions.

use tracing::debug;

use ledger_types::{
    ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeProposalPayload, Envelope, Payload,
    Proposal, ProposalResponse, Transaction, TransactionAction, TxId,
};

use crate::error::{ProtocolError, Result};
use crate::signer::Signer;

/// Combine `proposal` and its endorsement `responses` into a signed envelope.
///
/// Fails when the signer is not the proposal creator, when any response is
/// unsuccessful or unendorsed, or when the responses disagree on the
/// endorsed payload.
pub fn create_signed_tx(
    proposal: &Proposal,
    signer: &dyn Signer,
    responses: &[ProposalResponse],
) -> Result<Envelope> {
    let first = responses.first().ok_or(ProtocolError::EmptyResponses)?;

    let creator = signer.serialize()?;
    if creator != proposal.creator() {
        return Err(ProtocolError::IdentityMismatch);
    }

    let mut endorsements = Vec::with_capacity(responses.len());
    for response in responses {
        let status = response.status();
        if !(200..400).contains(&status) {
            return Err(ProtocolError::UnsuccessfulResponse {
                origin: response.origin.clone(),
                status,
                message: response.response.message.clone(),
            });
        }

        if response.payload != first.payload {
            return Err(ProtocolError::PayloadMismatch {
                first: first.origin.clone(),
                origin: response.origin.clone(),
            });
        }

        let endorsement = response.endorsement.clone().ok_or_else(|| ProtocolError::MissingEndorsement {
            origin: response.origin.clone(),
        })?;
        endorsements.push(endorsement);
    }

    // Private data stays with the endorsers
    let stripped = ChaincodeProposalPayload {
        input: proposal.payload.input.clone(),
        transient_map: Default::default(),
    };

    let action_payload = ChaincodeActionPayload {
        chaincode_proposal_payload: ledger_types::to_wire(&stripped)?,
        action: ChaincodeEndorsedAction {
            proposal_response_payload: first.payload.clone(),
            endorsements,
        },
    };

    let transaction = Transaction {
        actions: vec![TransactionAction {
            header: proposal.header.signature_header.clone(),
            payload: ledger_types::to_wire(&action_payload)?,
        }],
    };

    let payload = Payload {
        header: proposal.header.clone(),
        data: ledger_types::to_wire(&transaction)?,
    };

    let payload_bytes = ledger_types::to_wire(&payload)?;
    let signature = signer.sign(&payload_bytes)?;

    debug!(
        "Assembled envelope for {} with {} endorsements",
        proposal.tx_id(),
        responses.len()
    );

    Ok(Envelope {
        payload: payload_bytes,
        signature,
    })
}

/// Transaction id recorded in an envelope's channel header.
pub fn envelope_tx_id(envelope: &Envelope) -> Result<TxId> {
    let payload: Payload = ledger_types::from_wire(&envelope.payload)
        .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))?;
    Ok(payload.header.channel_header.tx_id)
}
