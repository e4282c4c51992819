//! Command-line client for ledger submission.

pub mod args;
pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::info;

use ledger_orchestrator::{EndorsementVerdict, InvokeReceipt, InvokeStatus, OrchestrationConfig, OrchestrationService};
use ledger_protocols::{
    approve_for_my_org_spec, check_commit_readiness_spec, commit_spec, installed_package_spec, query_committed_spec,
    Ed25519Signer,
};
use ledger_transport::{BroadcastClient, DeliverClient, EndorserClient, Endpoint, TcpOrdererClient, TcpPeerClient};
use ledger_types::{ClientConfig, ProposalResponse, TransactionSpec};

use crate::args::Command;

/// Connect the configured identity, peers and sequencer into a service.
pub fn build_service(config: &ClientConfig, wait_for_commit: bool) -> Result<OrchestrationService> {
    let signer = Ed25519Signer::from_key_file(&config.msp.msp_id, &config.msp.key_path)
        .with_context(|| format!("Failed to load signing key for {}", config.msp.msp_id))?;

    let mut endorsers: Vec<Arc<dyn EndorserClient>> = Vec::with_capacity(config.peers.len());
    let mut observers: Vec<Arc<dyn DeliverClient>> = Vec::with_capacity(config.peers.len());
    for peer in &config.peers {
        let client = Arc::new(TcpPeerClient::new(Endpoint::from_config(peer)?));
        endorsers.push(client.clone());
        observers.push(client);
    }

    let sequencer: Arc<dyn BroadcastClient> =
        Arc::new(TcpOrdererClient::new(Endpoint::from_config(&config.orderer)?));

    let orchestration = OrchestrationConfig {
        wait_for_commit,
        ..OrchestrationConfig::from(config)
    };

    info!(
        "Client for {} on channel {} with {} peers",
        config.msp.msp_id,
        config.channel_id,
        config.peers.len()
    );

    Ok(OrchestrationService::builder()
        .with_config(orchestration)
        .with_signer(Arc::new(signer))
        .with_endorsers(endorsers)
        .with_observers(observers)
        .with_sequencer(sequencer)
        .build()?)
}

/// Run one command. Returns the printable result and whether it succeeded.
pub async fn run(command: Command, config: &ClientConfig) -> Result<(Value, bool)> {
    match command {
        Command::Invoke { chaincode, no_wait } => invoke(config, &chaincode.to_spec(), !no_wait).await,
        Command::Query { chaincode } => {
            let service = build_service(config, false)?;
            let verdict = service.evaluate(&chaincode.to_spec(), &config.channel_id).await?;
            Ok((verdict_json(&verdict), verdict.is_success()))
        }
        Command::Committed { name } => {
            let service = build_service(config, false)?;
            let spec = query_committed_spec(name.as_deref())?;
            let verdict = service.evaluate(&spec, &config.channel_id).await?;
            Ok((verdict_json(&verdict), verdict.is_success()))
        }
        Command::Installed { package_id } => {
            let service = build_service(config, false)?;
            let spec = installed_package_spec(&package_id)?;
            let verdict = service.evaluate(&spec, "").await?;
            Ok((verdict_json(&verdict), verdict.is_success()))
        }
        Command::Approve {
            definition,
            package_id,
            no_wait,
        } => {
            let definition = definition.to_definition().context("Failed to read collection configuration")?;
            let spec = approve_for_my_org_spec(&definition, package_id.as_deref())?;
            invoke(config, &spec, !no_wait).await
        }
        Command::Commit { definition, no_wait } => {
            let definition = definition.to_definition().context("Failed to read collection configuration")?;
            let spec = commit_spec(&definition)?;
            invoke(config, &spec, !no_wait).await
        }
        Command::Readiness { definition } => {
            let service = build_service(config, false)?;
            let definition = definition.to_definition().context("Failed to read collection configuration")?;
            let spec = check_commit_readiness_spec(&definition)?;
            let verdict = service.evaluate(&spec, &config.channel_id).await?;
            Ok((verdict_json(&verdict), verdict.is_success()))
        }
    }
}

async fn invoke(config: &ClientConfig, spec: &TransactionSpec, wait_for_commit: bool) -> Result<(Value, bool)> {
    let service = build_service(config, wait_for_commit)?;
    let receipt = service.submit_and_confirm(spec, &config.channel_id).await?;
    let ok = receipt.status != InvokeStatus::Rejected;
    Ok((receipt_json(&receipt), ok))
}

pub fn receipt_json(receipt: &InvokeReceipt) -> Value {
    json!({
        "tx_id": receipt.tx_id.to_string(),
        "status": receipt.status.to_string(),
        "response": receipt.response.as_ref().map(response_json),
    })
}

pub fn verdict_json(verdict: &EndorsementVerdict) -> Value {
    json!({
        "success": verdict.is_success(),
        "response": verdict.response().map(response_json),
    })
}

fn response_json(response: &ProposalResponse) -> Value {
    json!({
        "peer": response.origin,
        "status": response.status(),
        "message": response.response.message,
        "payload": payload_text(&response.response.payload),
    })
}

/// UTF-8 payloads print as text, anything else as hex.
pub fn payload_text(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => hex::encode(payload),
    }
}
