use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Transaction identifier, the correlation key threaded through every phase
/// of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        TxId(s)
    }
}

impl From<&str> for TxId {
    fn from(s: &str) -> Self {
        TxId(s.to_string())
    }
}

/// Chaincode identity addressed by a proposal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeId {
    pub path: String,
    pub name: String,
    pub version: String,
}

/// Runtime the chaincode is written for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaincodeType {
    #[default]
    Golang,
    Node,
    Java,
}

/// Immutable description of a requested invocation.
///
/// The first element of `args` is the function name by convention. Private
/// data travels in the proposal's transient map and is never written into the
/// submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSpec {
    pub chaincode: ChaincodeId,
    pub chaincode_type: ChaincodeType,
    pub is_init: bool,
    pub args: Vec<Vec<u8>>,
    pub private_data: BTreeMap<String, Vec<u8>>,
}

impl TransactionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            chaincode: ChaincodeId {
                name: name.into(),
                ..ChaincodeId::default()
            },
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.chaincode.path = path.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.chaincode.version = version.into();
        self
    }

    pub fn with_type(mut self, chaincode_type: ChaincodeType) -> Self {
        self.chaincode_type = chaincode_type;
        self
    }

    pub fn init(mut self, is_init: bool) -> Self {
        self.is_init = is_init;
        self
    }

    pub fn with_arg(mut self, arg: impl Into<Vec<u8>>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_private_data(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.private_data.insert(name.into(), value.into());
        self
    }

    /// Function name, if any argument was given
    pub fn function(&self) -> Option<&[u8]> {
        self.args.first().map(Vec::as_slice)
    }
}

/// Kind of payload carried by an envelope or proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderType {
    EndorserTransaction,
    DeliverSeekInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    pub header_type: HeaderType,
    pub channel_id: String,
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
    pub epoch: u64,
    /// SHA-256 of the client TLS certificate, when the request is bound to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_hash: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Serialized identity of the submitter
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub channel_header: ChannelHeader,
    pub signature_header: SignatureHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInput {
    pub args: Vec<Vec<u8>>,
    pub decorations: BTreeMap<String, Vec<u8>>,
    pub is_init: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInvocationSpec {
    pub chaincode_type: ChaincodeType,
    pub chaincode_id: ChaincodeId,
    pub input: ChaincodeInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeProposalPayload {
    pub input: ChaincodeInvocationSpec,
    /// Private data, visible to endorsers only
    pub transient_map: BTreeMap<String, Vec<u8>>,
}

/// Unsigned proposal addressed to endorsing nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub header: Header,
    pub payload: ChaincodeProposalPayload,
}

impl Proposal {
    pub fn tx_id(&self) -> &TxId {
        &self.header.channel_header.tx_id
    }

    pub fn channel_id(&self) -> &str {
        &self.header.channel_header.channel_id
    }

    pub fn creator(&self) -> &[u8] {
        &self.header.signature_header.creator
    }
}

/// Proposal bytes plus the submitter's signature over them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
    pub tx_id: TxId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Serialized identity of the endorsing node
    pub endorser: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Chaincode execution result as reported by an endorser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

/// One endorsing node's answer to a signed proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub response: Response,
    /// Endorsed result set; identical across nodes for a consistent simulation
    pub payload: Vec<u8>,
    pub endorsement: Option<Endorsement>,
    /// Address of the node that produced the response
    #[serde(default)]
    pub origin: String,
}

impl ProposalResponse {
    pub fn status(&self) -> i32 {
        self.response.status
    }
}

/// Signed, submittable container for a transaction or a seek request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Decoded form of `Envelope::payload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub header: Header,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEndorsedAction {
    pub proposal_response_payload: Vec<u8>,
    pub endorsements: Vec<Endorsement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeActionPayload {
    /// Proposal payload with the transient map stripped
    pub chaincode_proposal_payload: Vec<u8>,
    pub action: ChaincodeEndorsedAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAction {
    pub header: SignatureHeader,
    pub payload: Vec<u8>,
}

/// Endorsed transaction as written to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub actions: Vec<TransactionAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekPosition {
    Newest,
    Oldest,
    Specified { number: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekBehavior {
    BlockUntilReady,
    FailIfNotReady,
}

/// Range of blocks requested from an observing node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekInfo {
    pub start: SeekPosition,
    pub stop: SeekPosition,
    pub behavior: SeekBehavior,
}

impl SeekInfo {
    /// Watch from the newest block onward, blocking until blocks are ready
    pub fn newest_until_max() -> Self {
        Self {
            start: SeekPosition::Newest,
            stop: SeekPosition::Specified { number: u64::MAX },
            behavior: SeekBehavior::BlockUntilReady,
        }
    }
}

/// Validation outcome recorded by the committing node for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxValidationCode {
    Valid,
    NilEnvelope,
    BadPayload,
    BadCommonHeader,
    BadCreatorSignature,
    InvalidEndorserTransaction,
    InvalidConfigTransaction,
    UnsupportedTxPayload,
    BadProposalTxid,
    DuplicateTxid,
    EndorsementPolicyFailure,
    MvccReadConflict,
    PhantomReadConflict,
    UnknownTxType,
    TargetChainNotFound,
    MarshalTxError,
    NilTxaction,
    ExpiredChaincode,
    ChaincodeVersionConflict,
    BadHeaderExtension,
    BadChannelHeader,
    BadResponsePayload,
    BadRwset,
    IllegalWriteset,
    InvalidWriteset,
    InvalidChaincode,
    NotValidated,
    InvalidOtherReason,
    /// A code newer than this client knows about
    #[serde(other)]
    Unrecognized,
}

impl TxValidationCode {
    pub fn is_valid(&self) -> bool {
        matches!(self, TxValidationCode::Valid)
    }
}

impl fmt::Display for TxValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the serde name so logs match the wire form
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => write!(f, "{}", name),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredTransaction {
    pub txid: TxId,
    pub tx_validation_code: TxValidationCode,
}

/// Lightweight per-block notification: ids and validation outcomes only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredBlock {
    pub channel_id: String,
    pub number: u64,
    pub filtered_transactions: Vec<FilteredTransaction>,
}

/// One event received on an observing node's stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliverResponse {
    FilteredBlock(FilteredBlock),
    /// Graceful end of stream with a final status
    Status { status: i32 },
    /// Any event shape this client does not understand
    #[serde(other)]
    Unknown,
}

/// Signing identity location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MspConfig {
    pub msp_id: String,
    /// File holding the hex-encoded Ed25519 secret seed
    pub key_path: PathBuf,
}

/// One remote node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub address: String,
    /// DER client certificate; its hash binds seek requests to this client
    #[serde(default)]
    pub client_cert_path: Option<PathBuf>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl EndpointConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            client_cert_path: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Connect timeout applied when an endpoint does not set one
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_error_threshold() -> i32 {
    400
}

fn default_delivery_timeout_secs() -> u64 {
    100
}

/// Full client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub msp: MspConfig,
    pub channel_id: String,
    /// Nodes that endorse proposals and confirm commits
    pub peers: Vec<EndpointConfig>,
    pub orderer: EndpointConfig,
    #[serde(default = "default_error_threshold")]
    pub error_threshold: i32,
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
}

/// Encode a wire record
pub fn to_wire<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a wire record
pub fn from_wire<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

/// Result type for operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(String),
}
