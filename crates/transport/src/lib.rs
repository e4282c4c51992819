//! Transport to endorsing nodes, observing nodes, and the sequencing service.
//!
//! This crate provides:
//! - The `EndorserClient`, `DeliverClient`/`DeliverStream` and `BroadcastClient` traits
//! - A TCP implementation exchanging newline-delimited JSON frames
//! - Per-endpoint connect timeouts and client certificate hashing
//!
//! # Integration Flow
//!
//! 1. **Endorse**: `EndorserClient::process_proposal()` sends one signed proposal
//! 2. **Watch**: `DeliverClient::deliver_filtered()` opens a long-lived stream;
//!    the caller sends a seek envelope and then reads `DeliverResponse` events
//! 3. **Submit**: `BroadcastClient::send()` hands the envelope to the sequencer
//!
//! Streams are owned values: dropping a `DeliverStream` closes the connection.

pub mod client;
pub mod frame;
pub mod tcp;

pub use client::{BroadcastClient, DeliverClient, DeliverStream, EndorserClient, TransportError};
pub use tcp::{Endpoint, TcpOrdererClient, TcpPeerClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
