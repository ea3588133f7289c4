//! Bidirectional line relay between a local stream pair and a bridge socket.
//!
//! Two pumps run side by side: input to socket and socket to output. Each
//! copies one line at a time, unchanged, and flushes after every line. The
//! first pump to stop cancels the other.

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use bridge_types::{parse_port, Endpoint};

use crate::error::RelayError;

/// Builds an endpoint from the stub's two positional arguments.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPort`] if `port` is not a valid TCP port.
pub fn parse_endpoint(host: &str, port: &str) -> Result<Endpoint, RelayError> {
    let port = parse_port(port).map_err(|_| RelayError::InvalidPort(port.to_string()))?;
    Ok(Endpoint::new(host, port))
}

/// Connects to a bridge listener, giving up after `timeout`.
///
/// # Errors
///
/// Returns [`RelayError::Connect`] if the connection is refused, fails, or
/// does not complete in time.
pub async fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<TcpStream, RelayError> {
    let attempt = TcpStream::connect(endpoint.as_socket_pair());
    let stream = match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(RelayError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(RelayError::Connect {
                endpoint: endpoint.to_string(),
                reason: format!("timed out after {}ms", timeout.as_millis()),
            })
        }
    };

    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }
    info!(endpoint = %endpoint, "connected to bridge");
    Ok(stream)
}

/// Which side of the link stopped first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    /// Local input reached EOF or failed.
    Input,
    /// The bridge socket reached EOF or failed.
    Socket,
}

impl fmt::Display for LinkSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Socket => f.write_str("socket"),
        }
    }
}

/// How a relay link ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// The side whose pump stopped first.
    pub ended_by: LinkSide,
    /// I/O error that stopped it, if it did not simply reach EOF.
    pub error: Option<String>,
    /// Lines copied from input to the socket.
    pub lines_sent: u64,
    /// Lines copied from the socket to output.
    pub lines_received: u64,
}

struct PumpReport {
    side: LinkSide,
    first: bool,
    lines: u64,
    error: Option<String>,
}

/// An established connection to a bridge listener.
pub struct RelayLink {
    stream: TcpStream,
}

impl RelayLink {
    /// Wraps a connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Relays until either side ends, then closes the socket.
    ///
    /// Returns once both pumps have stopped.
    pub async fn run<I, O>(self, input: I, mut output: O) -> RelayOutcome
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (socket_in, mut socket_out) = self.stream.into_split();
        let shutdown = CancellationToken::new();

        let (up, down) = tokio::join!(
            pump(LinkSide::Input, input, &mut socket_out, &shutdown),
            pump(LinkSide::Socket, socket_in, &mut output, &shutdown),
        );

        if let Err(e) = socket_out.shutdown().await {
            debug!(error = %e, "socket write half already closed");
        }

        let first = if up.first { &up } else { &down };
        let outcome = RelayOutcome {
            ended_by: first.side,
            error: first.error.clone(),
            lines_sent: up.lines,
            lines_received: down.lines,
        };
        info!(
            ended_by = %outcome.ended_by,
            sent = outcome.lines_sent,
            received = outcome.lines_received,
            "relay link closed"
        );
        outcome
    }
}

/// Copies lines from `reader` to `writer` until EOF, error or cancellation.
async fn pump<R, W>(
    side: LinkSide,
    reader: R,
    writer: &mut W,
    shutdown: &CancellationToken,
) -> PumpReport
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut lines = 0u64;

    let error = loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            () = shutdown.cancelled() => break None,
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                debug!(side = %side, "end of stream");
                break None;
            }
            Ok(_) => {
                // A trailing fragment at EOF still goes out as a full line.
                if buf.last() != Some(&b'\n') {
                    buf.push(b'\n');
                }
                trace!(side = %side, len = buf.len(), "relaying line");
                let written = async {
                    writer.write_all(&buf).await?;
                    writer.flush().await
                };
                let result = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break None,
                    result = written => result,
                };
                if let Err(e) = result {
                    warn!(side = %side, error = %e, "relay write failed");
                    break Some(e.to_string());
                }
                lines += 1;
            }
            Err(e) => {
                warn!(side = %side, error = %e, "relay read failed");
                break Some(e.to_string());
            }
        }
    };

    let first = !shutdown.is_cancelled();
    shutdown.cancel();
    PumpReport {
        side,
        first,
        lines,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_endpoint_accepts_valid_port() {
        let ep = parse_endpoint("localhost", "3000").expect("endpoint");
        assert_eq!(ep, Endpoint::new("localhost", 3000));
    }

    #[test]
    fn parse_endpoint_rejects_bad_port() {
        for raw in ["abc", "70000", "-1", ""] {
            match parse_endpoint("localhost", raw) {
                Err(RelayError::InvalidPort(p)) => assert_eq!(p, raw),
                other => panic!("expected InvalidPort for {raw:?}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn pump_copies_lines_verbatim() {
        let input = b"{\"a\":1}\n\n{\"b\":2}\n".to_vec();
        let mut out = Vec::new();
        let token = CancellationToken::new();

        let report = pump(LinkSide::Input, Cursor::new(input.clone()), &mut out, &token).await;

        assert_eq!(out, input);
        assert_eq!(report.lines, 3);
        assert!(report.first);
        assert!(report.error.is_none());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn pump_terminates_trailing_fragment() {
        let mut out = Vec::new();
        let token = CancellationToken::new();
        pump(
            LinkSide::Socket,
            Cursor::new(b"partial".to_vec()),
            &mut out,
            &token,
        )
        .await;
        assert_eq!(out, b"partial\n");
    }

    #[tokio::test]
    async fn pump_stops_when_cancelled() {
        let (_keep_open, idle) = tokio::io::duplex(64);
        let mut out = Vec::new();
        let token = CancellationToken::new();
        token.cancel();

        let report = pump(LinkSide::Socket, idle, &mut out, &token).await;
        assert!(!report.first);
        assert_eq!(report.lines, 0);
    }
}
