//! Transaction specs for the `_lifecycle` system chaincode.
//!
//! Queries and `check_commit_readiness_spec` are read-only and go through
//! the evaluate path. Approve and commit change channel state and must be
//! submitted and confirmed like any other invocation.

use serde::Serialize;

use ledger_types::TransactionSpec;

use crate::error::{ProtocolError, Result};

pub const LIFECYCLE_CHAINCODE: &str = "_lifecycle";

pub const DEFAULT_ENDORSEMENT_PLUGIN: &str = "escc";
pub const DEFAULT_VALIDATION_PLUGIN: &str = "vscc";

/// Chaincode definition agreed on by channel members.
///
/// Policies are carried as already-encoded bytes; an empty value leaves the
/// channel default in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChaincodeDefinition {
    pub name: String,
    pub version: String,
    pub sequence: u64,
    pub endorsement_plugin: String,
    pub validation_plugin: String,
    pub validation_parameter: Vec<u8>,
    pub collections: Vec<u8>,
    pub init_required: bool,
}

impl ChaincodeDefinition {
    pub fn new(name: impl Into<String>, version: impl Into<String>, sequence: u64) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            sequence,
            endorsement_plugin: DEFAULT_ENDORSEMENT_PLUGIN.to_string(),
            validation_plugin: DEFAULT_VALIDATION_PLUGIN.to_string(),
            validation_parameter: Vec::new(),
            collections: Vec::new(),
            init_required: false,
        }
    }

    pub fn with_validation_parameter(mut self, policy: impl Into<Vec<u8>>) -> Self {
        self.validation_parameter = policy.into();
        self
    }

    pub fn with_collections(mut self, collections: impl Into<Vec<u8>>) -> Self {
        self.collections = collections.into();
        self
    }

    pub fn init_required(mut self, init_required: bool) -> Self {
        self.init_required = init_required;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ProtocolError::InvalidDefinition("name must not be empty".to_string()));
        }
        if self.sequence == 0 {
            return Err(ProtocolError::InvalidDefinition(format!(
                "sequence for {} must start at 1",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ApproveForMyOrgArgs<'a> {
    #[serde(flatten)]
    definition: &'a ChaincodeDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    package_id: Option<&'a str>,
}

#[derive(Serialize)]
struct QueryChaincodeDefinitionArgs<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct QueryChaincodeDefinitionsArgs {}

#[derive(Serialize)]
struct GetInstalledChaincodePackageArgs<'a> {
    package_id: &'a str,
}

/// Committed definition of `name`, or of every chaincode on the channel when
/// no name is given.
pub fn query_committed_spec(name: Option<&str>) -> Result<TransactionSpec> {
    let (function, args) = match name {
        Some(name) => (
            "QueryChaincodeDefinition",
            ledger_types::to_wire(&QueryChaincodeDefinitionArgs { name })?,
        ),
        None => (
            "QueryChaincodeDefinitions",
            ledger_types::to_wire(&QueryChaincodeDefinitionsArgs {})?,
        ),
    };

    Ok(TransactionSpec::new(LIFECYCLE_CHAINCODE)
        .with_arg(function)
        .with_arg(args))
}

/// Installed package bytes for `package_id`. Sent without a channel.
pub fn installed_package_spec(package_id: &str) -> Result<TransactionSpec> {
    let args = ledger_types::to_wire(&GetInstalledChaincodePackageArgs { package_id })?;

    Ok(TransactionSpec::new(LIFECYCLE_CHAINCODE)
        .with_arg("GetInstalledChaincodePackage")
        .with_arg(args))
}

/// Approve `definition` for the signer's organization. Without a package id
/// the approval leaves the chaincode unavailable to this organization's peers.
pub fn approve_for_my_org_spec(definition: &ChaincodeDefinition, package_id: Option<&str>) -> Result<TransactionSpec> {
    definition.validate()?;
    let args = ledger_types::to_wire(&ApproveForMyOrgArgs { definition, package_id })?;

    Ok(TransactionSpec::new(LIFECYCLE_CHAINCODE)
        .with_arg("ApproveChaincodeDefinitionForMyOrg")
        .with_arg(args))
}

/// Commit `definition` to the channel once enough organizations approved it.
pub fn commit_spec(definition: &ChaincodeDefinition) -> Result<TransactionSpec> {
    definition.validate()?;
    let args = ledger_types::to_wire(definition)?;

    Ok(TransactionSpec::new(LIFECYCLE_CHAINCODE)
        .with_arg("CommitChaincodeDefinition")
        .with_arg(args))
}

/// Which organizations have approved `definition` so far.
pub fn check_commit_readiness_spec(definition: &ChaincodeDefinition) -> Result<TransactionSpec> {
    definition.validate()?;
    let args = ledger_types::to_wire(definition)?;

    Ok(TransactionSpec::new(LIFECYCLE_CHAINCODE)
        .with_arg("CheckCommitReadiness")
        .with_arg(args))
}
