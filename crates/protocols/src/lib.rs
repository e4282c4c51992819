//! Proposal and envelope construction for ledger submission.
//!
//! This crate provides:
//! - The `Signer` interface and an Ed25519 signing identity
//! - Proposal building with transaction id derivation
//! - Envelope assembly from a proposal and its endorsements
//! - The signed seek request used to watch for commits
//! - Lifecycle query, approve and commit specs for the `_lifecycle` system chaincode
//!
//! # Flow
//!
//! 1. **Build**: `ProposalBuilder` turns a `TransactionSpec` into a `Proposal` and `TxId`
//! 2. **Sign**: `sign_proposal()` produces the `SignedProposal` sent to endorsers
//! 3. **Assemble**: `create_signed_tx()` combines the proposal with endorsement responses
//! 4. **Watch**: `create_deliver_envelope()` builds the request sent to observing nodes

pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod proposal;
pub mod seek;
pub mod signer;

pub use envelope::{create_signed_tx, envelope_tx_id};
pub use error::{ProtocolError, Result};
pub use lifecycle::{
    approve_for_my_org_spec, check_commit_readiness_spec, commit_spec, installed_package_spec, query_committed_spec,
    ChaincodeDefinition, LIFECYCLE_CHAINCODE,
};
pub use proposal::{compute_tx_id, sign_proposal, ProposalBuilder, NONCE_SIZE};
pub use seek::{create_deliver_envelope, tls_cert_hash};
pub use signer::{verify_signature, Ed25519Signer, SerializedIdentity, Signer};
