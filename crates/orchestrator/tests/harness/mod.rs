pub mod mocks;

pub use mocks::*;

use ledger_orchestrator::{OrchestrationConfig, OrchestrationService};
use ledger_protocols::{Ed25519Signer, Signer};
use ledger_transport::{BroadcastClient, DeliverClient, EndorserClient};
use std::sync::Arc;

pub const CHANNEL: &str = "mychannel";

pub fn signer() -> Arc<dyn Signer> {
    Arc::new(Ed25519Signer::from_seed("Org1MSP", [42u8; 32]))
}

/// Wire a service from concrete mocks.
pub fn service(
    config: OrchestrationConfig,
    endorsers: &[Arc<MockEndorser>],
    observers: &[Arc<MockObserver>],
    sequencer: &Arc<MockSequencer>,
) -> OrchestrationService {
    OrchestrationService::builder()
        .with_config(config)
        .with_signer(signer())
        .with_endorsers(endorsers.iter().map(|e| Arc::clone(e) as Arc<dyn EndorserClient>).collect())
        .with_observers(observers.iter().map(|o| Arc::clone(o) as Arc<dyn DeliverClient>).collect())
        .with_sequencer(Arc::clone(sequencer) as Arc<dyn BroadcastClient>)
        .build()
        .expect("service configuration is valid")
}

/// Let aborted tasks run their destructors.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
}
