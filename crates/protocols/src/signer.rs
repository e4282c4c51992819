//! Signing identities.
//!
//! The pipeline only needs two things from an identity: its serialized form,
//! embedded as the creator of every proposal and envelope, and signatures
//! over byte payloads.

use std::fmt;
use std::path::Path;

use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProtocolError, Result};

/// A signing identity.
pub trait Signer: Send + Sync {
    /// Serialized identity embedded as the creator in headers
    fn serialize(&self) -> Result<Vec<u8>>;

    /// Sign a byte payload
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Wire form of an identity: owning organisation plus public key bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub mspid: String,
    pub id_bytes: Vec<u8>,
}

/// Ed25519 identity belonging to one membership service provider.
pub struct Ed25519Signer {
    msp_id: String,
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn generate(msp_id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(msp_id: impl Into<String>, seed: [u8; 32]) -> Self {
        Self {
            msp_id: msp_id.into(),
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Load a hex-encoded 32 byte seed from `path`.
    pub fn from_key_file(msp_id: impl Into<String>, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::KeyLoad(format!("failed to read {}: {}", path.display(), e)))?;

        let bytes = hex::decode(contents.trim())
            .map_err(|e| ProtocolError::KeyLoad(format!("{} is not hex: {}", path.display(), e)))?;

        let seed: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            ProtocolError::KeyLoad(format!(
                "{} holds {} bytes, expected a 32 byte seed",
                path.display(),
                bytes.len()
            ))
        })?;

        let signer = Self::from_seed(msp_id, seed);
        debug!("Loaded signing identity for {} from {}", signer.msp_id, path.display());
        Ok(signer)
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("msp_id", &self.msp_id)
            .field("public_key", &hex::encode(self.public_key()))
            .finish()
    }
}

impl Signer for Ed25519Signer {
    fn serialize(&self) -> Result<Vec<u8>> {
        let identity = SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.public_key().to_vec(),
        };
        Ok(ledger_types::to_wire(&identity)?)
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        use ed25519_dalek::Signer as _;

        let signature = self
            .key
            .try_sign(message)
            .map_err(|e| ProtocolError::Signing(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

/// Check `signature` over `message` against a serialized Ed25519 identity.
pub fn verify_signature(identity: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let identity: SerializedIdentity = ledger_types::from_wire(identity)?;

    let key_bytes: [u8; 32] = identity
        .id_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ProtocolError::InvalidSignature("identity key is not 32 bytes".to_string()))?;

    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| ProtocolError::InvalidSignature(e.to_string()))?;
    let signature =
        Signature::from_slice(signature).map_err(|e| ProtocolError::InvalidSignature(e.to_string()))?;

    key.verify(message, &signature)
        .map_err(|e| ProtocolError::InvalidSignature(e.to_string()))
}
