//! Line-delimited JSON-RPC transport over one socket.
//!
//! Each message is a single line terminated by `\n`. Writes are serialized
//! behind an async mutex so concurrent senders never interleave partial
//! lines, and a frame once started is written whole unless the transport
//! closes. The input side has exactly one reader, the owning session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use bridge_protocol::{codec, JsonRpcMessage};

use crate::error::TransportError;

/// Outbound half of a connection, as handed to a collaborator session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one message as one line.
    async fn send(&self, message: &JsonRpcMessage) -> Result<(), TransportError>;

    /// Closes the connection. Idempotent.
    async fn close(&self);

    /// Whether [`Transport::close`] has been called.
    fn is_closed(&self) -> bool;

    /// Diagnostic label for the remote side.
    fn peer(&self) -> &str;
}

/// A full duplex connection: a [`Transport`] that can also be read from.
#[async_trait]
pub trait Connection: Transport {
    /// Reads the next message.
    ///
    /// Returns `Ok(None)` on end of stream or once the connection is closed.
    async fn receive(&self) -> Result<Option<JsonRpcMessage>, TransportError>;
}

/// Transport over the two halves of an accepted `TcpStream`.
pub type TcpConnection = ConnectionTransport<OwnedReadHalf, OwnedWriteHalf>;

/// Owns one connection's input and output streams.
///
/// Generic over reader/writer so tests can run it over in-memory pipes.
pub struct ConnectionTransport<R, W> {
    peer: String,
    reader: Mutex<Option<BufReader<R>>>,
    writer: Arc<Mutex<Option<W>>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl TcpConnection {
    /// Splits an accepted stream into a transport.
    pub fn from_tcp(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (reader, writer) = stream.into_split();
        Self::new(peer, reader, writer)
    }
}

impl<R, W> ConnectionTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a transport over the given reader and writer.
    pub fn new(peer: impl Into<String>, reader: R, writer: W) -> Self {
        let peer = peer.into();
        info!(peer = %peer, "connection transport created");
        Self {
            peer,
            reader: Mutex::new(Some(BufReader::new(reader))),
            writer: Arc::new(Mutex::new(Some(writer))),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    async fn write_frame(&self, message: &JsonRpcMessage) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let line = codec::encode(message)?;
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');

        // The frame is written on its own task, so a caller that stops
        // waiting (a broadcast timeout) cannot leave half a line on the wire.
        // Only closing the transport interrupts a frame in flight.
        let writer = Arc::clone(&self.writer);
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(async move {
            let mut guard = writer.lock_owned().await;
            let writer = guard.as_mut().ok_or(TransportError::Closed)?;
            let written = async {
                writer.write_all(&frame).await?;
                writer.flush().await
            };
            tokio::select! {
                biased;
                () = shutdown.cancelled() => Err(TransportError::Closed),
                result = written => result.map_err(|e| TransportError::Write(e.to_string())),
            }
        });

        match task.await {
            Ok(Ok(())) => {
                trace!(peer = %self.peer, line = %line, "sent line");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => Err(TransportError::Write(format!("frame writer stopped: {e}"))),
        }
    }

    async fn read_message(&self) -> Result<Option<JsonRpcMessage>, TransportError> {
        let mut guard = self.reader.lock().await;
        let Some(reader) = guard.as_mut() else {
            return Ok(None);
        };

        let mut line = Vec::new();
        loop {
            line.clear();
            let bytes_read = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Ok(None),
                read = reader.read_until(b'\n', &mut line) => {
                    read.map_err(|e| TransportError::Read(e.to_string()))?
                }
            };

            if bytes_read == 0 {
                return Ok(None);
            }

            trace!(peer = %self.peer, len = bytes_read, "read line");
            if let Some(message) = codec::decode_bytes(&line)? {
                return Ok(Some(message));
            }
        }
    }

    async fn teardown(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        info!(peer = %self.peer, "closing connection transport");
        // Wakes a pending read or write so the locks below are released.
        self.shutdown.cancel();

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(peer = %self.peer, error = %e, "error shutting down writer");
            }
        }
        drop(self.reader.lock().await.take());
    }
}

#[async_trait]
impl<R, W> Transport for ConnectionTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, message: &JsonRpcMessage) -> Result<(), TransportError> {
        self.write_frame(message).await
    }

    async fn close(&self) {
        self.teardown().await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl<R, W> Connection for ConnectionTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn receive(&self) -> Result<Option<JsonRpcMessage>, TransportError> {
        self.read_message().await
    }
}
