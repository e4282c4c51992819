use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use ledger_protocols::ChaincodeDefinition;
use ledger_types::{ChaincodeType, TransactionSpec};

#[derive(Parser, Debug)]
#[command(name = "ledger-invoke")]
#[command(about = "Submit ledger transactions and confirm their commit", long_about = None)]
pub struct Cli {
    /// Path to configuration file; LEDGER_* environment variables are used otherwise
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured channel
    #[arg(long, global = true)]
    pub channel: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Endorse, submit and wait until every peer confirms the commit
    Invoke {
        #[command(flatten)]
        chaincode: ChaincodeArgs,

        /// Return as soon as the sequencer accepted the transaction
        #[arg(long)]
        no_wait: bool,
    },

    /// Endorse only and print the result
    Query {
        #[command(flatten)]
        chaincode: ChaincodeArgs,
    },

    /// Show committed chaincode definitions
    Committed {
        /// Limit to one chaincode
        #[arg(long)]
        name: Option<String>,
    },

    /// Fetch an installed chaincode package
    Installed {
        #[arg(long)]
        package_id: String,
    },

    /// Approve a chaincode definition for this organization
    Approve {
        #[command(flatten)]
        definition: DefinitionArgs,

        /// Installed package to run; omit to approve without running it locally
        #[arg(long)]
        package_id: Option<String>,

        #[arg(long)]
        no_wait: bool,
    },

    /// Commit an approved chaincode definition to the channel
    Commit {
        #[command(flatten)]
        definition: DefinitionArgs,

        #[arg(long)]
        no_wait: bool,
    },

    /// Show which organizations approved a chaincode definition
    Readiness {
        #[command(flatten)]
        definition: DefinitionArgs,
    },
}

#[derive(Args, Debug)]
pub struct DefinitionArgs {
    /// Chaincode name
    #[arg(short = 'n', long = "name")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub version: String,

    #[arg(long)]
    pub sequence: u64,

    /// Encoded endorsement policy, passed through unchanged
    #[arg(long)]
    pub policy: Option<String>,

    /// File holding the encoded collection configuration
    #[arg(long)]
    pub collections_config: Option<PathBuf>,

    #[arg(long)]
    pub init_required: bool,
}

impl DefinitionArgs {
    pub fn to_definition(&self) -> std::io::Result<ChaincodeDefinition> {
        let mut definition =
            ChaincodeDefinition::new(&self.name, &self.version, self.sequence).init_required(self.init_required);
        if let Some(policy) = &self.policy {
            definition = definition.with_validation_parameter(policy.as_bytes());
        }
        if let Some(path) = &self.collections_config {
            definition = definition.with_collections(std::fs::read(path)?);
        }
        Ok(definition)
    }
}

#[derive(Args, Debug)]
pub struct ChaincodeArgs {
    /// Chaincode name
    #[arg(short = 'n', long = "name")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub version: String,

    #[arg(long, default_value = "")]
    pub path: String,

    /// Chaincode language (golang, node, java)
    #[arg(long, default_value = "golang", value_parser = parse_chaincode_type)]
    pub lang: ChaincodeType,

    /// Invoke the chaincode's init function
    #[arg(long)]
    pub init: bool,

    /// Private data entry as NAME=VALUE, repeatable
    #[arg(long = "transient", value_parser = parse_transient)]
    pub transient: Vec<(String, String)>,

    /// Function name followed by its arguments
    #[arg(required = true)]
    pub args: Vec<String>,
}

impl ChaincodeArgs {
    pub fn to_spec(&self) -> TransactionSpec {
        let spec = TransactionSpec::new(&self.name)
            .with_version(&self.version)
            .with_path(&self.path)
            .with_type(self.lang)
            .init(self.init)
            .with_args(self.args.iter().map(String::as_str));

        self.transient
            .iter()
            .fold(spec, |spec, (name, value)| spec.with_private_data(name, value.as_bytes()))
    }
}

fn parse_transient(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

fn parse_chaincode_type(raw: &str) -> Result<ChaincodeType, String> {
    match raw.to_ascii_lowercase().as_str() {
        "golang" | "go" => Ok(ChaincodeType::Golang),
        "node" => Ok(ChaincodeType::Node),
        "java" => Ok(ChaincodeType::Java),
        other => Err(format!("unsupported chaincode language '{}'", other)),
    }
}
