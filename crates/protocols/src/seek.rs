//! Signed seek request sent to observing nodes.

use chrono::Utc;
use sha2::{Digest, Sha256};

use ledger_types::{ChannelHeader, Envelope, Header, HeaderType, Payload, SeekInfo, SignatureHeader};

use crate::error::Result;
use crate::proposal::{compute_tx_id, random_nonce};
use crate::signer::Signer;

/// SHA-256 of a DER client certificate
pub fn tls_cert_hash(certificate: &[u8]) -> Vec<u8> {
    Sha256::digest(certificate).to_vec()
}

/// Build the "watch from the newest block, block until ready" request for
/// `channel_id`, optionally bound to the client's TLS certificate hash.
pub fn create_deliver_envelope(
    channel_id: &str,
    tls_cert_hash: Option<Vec<u8>>,
    signer: &dyn Signer,
) -> Result<Envelope> {
    let creator = signer.serialize()?;
    let nonce = random_nonce();
    let tx_id = compute_tx_id(&nonce, &creator);

    let payload = Payload {
        header: Header {
            channel_header: ChannelHeader {
                header_type: HeaderType::DeliverSeekInfo,
                channel_id: channel_id.to_string(),
                tx_id,
                timestamp: Utc::now(),
                epoch: 0,
                tls_cert_hash,
            },
            signature_header: SignatureHeader { creator, nonce },
        },
        data: ledger_types::to_wire(&SeekInfo::newest_until_max())?,
    };

    let payload_bytes = ledger_types::to_wire(&payload)?;
    let signature = signer.sign(&payload_bytes)?;

    Ok(Envelope {
        payload: payload_bytes,
        signature,
    })
}
