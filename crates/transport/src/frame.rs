//! Newline-delimited JSON framing over TCP.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use ledger_types::{Envelope, SignedProposal};

use crate::client::TransportError;

/// Frames a client writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    ProcessProposal(SignedProposal),
    /// Opens a filtered-block stream; seek envelopes follow on the same connection
    DeliverFiltered,
    Seek(Envelope),
    Broadcast(Envelope),
}

/// One framed TCP connection.
pub struct FramedConnection {
    address: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl FramedConnection {
    pub async fn connect(address: &str, timeout: Duration) -> Result<Self, TransportError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                address: address.to_string(),
                after: timeout,
            })?
            .map_err(|source| TransportError::Connect {
                address: address.to_string(),
                source,
            })?;

        debug!("Connected to {}", address);
        Ok(Self::from_stream(address, stream))
    }

    pub fn from_stream(address: &str, stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            address: address.to_string(),
            reader: BufReader::new(read_half),
            writer: write_half,
            line: String::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn send<T: Serialize>(&mut self, frame: &T) -> Result<(), TransportError> {
        let mut bytes = serde_json::to_vec(frame).map_err(|e| TransportError::Codec {
            address: self.address.clone(),
            reason: e.to_string(),
        })?;
        bytes.push(b'\n');

        self.writer.write_all(&bytes).await.map_err(|source| self.io(source))?;
        self.writer.flush().await.map_err(|source| self.io(source))
    }

    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<T, TransportError> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .await
            .map_err(|source| TransportError::Io {
                address: self.address.clone(),
                source,
            })?;

        if read == 0 {
            return Err(TransportError::StreamClosed {
                address: self.address.clone(),
            });
        }

        serde_json::from_str(self.line.trim_end()).map_err(|e| TransportError::Codec {
            address: self.address.clone(),
            reason: e.to_string(),
        })
    }

    fn io(&self, source: std::io::Error) -> TransportError {
        TransportError::Io {
            address: self.address.clone(),
            source,
        }
    }
}
