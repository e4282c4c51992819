//! Transaction Orchestration Service
//!
//! Submits transactions to a permissioned ledger and confirms their commit
//! independently on every observing node.
//!
//! # Components
//!
//! 1. **EndorsementBroadcaster**: one signed proposal to every endorser, concurrently
//! 2. **ResponseEvaluator**: accept or reject based on the representative status code
//! 3. **DeliveryGroup**: per-node filtered-block streams watching one transaction id
//! 4. **OrchestrationService**: sequences the phases and names the one that failed

pub mod broadcaster;
pub mod config;
pub mod delivery_group;
pub mod error;
pub mod evaluator;
pub mod service;

pub use broadcaster::EndorsementBroadcaster;
pub use config::{OrchestrationConfig, OrchestrationConfigBuilder, DEFAULT_ERROR_THRESHOLD};
pub use delivery_group::{DeliveryGroup, DeliveryState};
pub use error::{DeliveryError, DeliveryPhase, OrchestrationError, Result};
pub use evaluator::{EndorsementVerdict, ResponseEvaluator};
pub use service::{InvokeReceipt, InvokeStatus, OrchestrationService, OrchestrationServiceBuilder};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::OrchestrationConfig;
    pub use crate::delivery_group::DeliveryGroup;
    pub use crate::error::{DeliveryError, OrchestrationError, Result};
    pub use crate::evaluator::EndorsementVerdict;
    pub use crate::service::{InvokeReceipt, InvokeStatus, OrchestrationService};
}
