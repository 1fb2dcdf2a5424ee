//! Per-connection request/response loop.
//!
//! `AwaitingData -> Processing -> Responding -> AwaitingData`, until the
//! peer leaves, the socket fails, the connection idles out or the pool
//! forces it closed. The slot is released when the worker's guard drops.

use crate::config::ServerTunables;
use crate::handler::{RequestHandler, Response};
use crate::slot_pool::{CloseSignal, SlotGuard};

use models::TextEncoding;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::Error as IoError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};

enum WorkerState {
    AwaitingData,
    Processing(String),
    Responding(Response),
    Terminated(Termination),
}

/// Why a connection ended.
#[derive(Debug)]
pub enum Termination {
    PeerClosed,
    IdleTimeout,
    ForcedClose,
    DecodeFailed,
    Socket(IoError),
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Termination::PeerClosed => f.write_str("peer closed the connection"),
            Termination::IdleTimeout => f.write_str("idle timeout"),
            Termination::ForcedClose => f.write_str("forced close"),
            Termination::DecodeFailed => f.write_str("undecodable request"),
            Termination::Socket(e) => write!(f, "socket error: {e}"),
        }
    }
}

enum ReadEvent {
    Closed,
    Received(std::io::Result<usize>),
    Quiet,
}

pub struct ConnectionWorker {
    stream: TcpStream,
    peer: SocketAddr,
    slot: SlotGuard,
    close: CloseSignal,
    handler: Arc<dyn RequestHandler>,
    encoding: TextEncoding,
    idle_timeout: Duration,
}

impl ConnectionWorker {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        slot: SlotGuard,
        close: CloseSignal,
        handler: Arc<dyn RequestHandler>,
        encoding: TextEncoding,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            peer,
            slot,
            close,
            handler,
            encoding,
            idle_timeout,
        }
    }

    /// Serve the connection to completion. The socket closes and the slot is
    /// released when this returns.
    pub async fn run(mut self) -> Termination {
        info!("Started connection with: {} on slot {}", self.peer, self.slot.index());

        let mut buffer = vec![0u8; ServerTunables::RECEIVE_CHUNK_SIZE];
        let mut last_activity = Instant::now();
        let mut state = WorkerState::AwaitingData;

        let termination = loop {
            state = match state {
                WorkerState::AwaitingData => {
                    self.await_data(&mut buffer, &mut last_activity).await
                }
                WorkerState::Processing(request) => self.process(request).await,
                WorkerState::Responding(response) => self.respond(response).await,
                WorkerState::Terminated(termination) => break termination,
            };
        };

        match &termination {
            Termination::PeerClosed | Termination::IdleTimeout => {
                info!("Connection ended with: {} ({termination})", self.peer)
            }
            Termination::ForcedClose => {
                warn!("Connection with {} closed by shutdown", self.peer)
            }
            Termination::DecodeFailed | Termination::Socket(_) => {
                error!("Connection with {} failed: {termination}", self.peer)
            }
        }
        termination
    }

    async fn await_data(&mut self, buffer: &mut [u8], last_activity: &mut Instant) -> WorkerState {
        if self.close.is_closed() {
            return WorkerState::Terminated(Termination::ForcedClose);
        }

        let event = tokio::select! {
            biased;
            _ = self.close.closed() => ReadEvent::Closed,
            received = self.stream.read(buffer) => ReadEvent::Received(received),
            _ = sleep(ServerTunables::READINESS_POLL_INTERVAL.min(self.idle_timeout)) => ReadEvent::Quiet,
        };

        match event {
            ReadEvent::Closed => WorkerState::Terminated(Termination::ForcedClose),
            ReadEvent::Quiet => {
                if last_activity.elapsed() >= self.idle_timeout {
                    WorkerState::Terminated(Termination::IdleTimeout)
                } else {
                    WorkerState::AwaitingData
                }
            }
            ReadEvent::Received(Ok(0)) => WorkerState::Terminated(Termination::PeerClosed),
            ReadEvent::Received(Ok(count)) => {
                *last_activity = Instant::now();
                let bytes = &buffer[..count];
                debug!("Received data from {}: {bytes:?}", self.peer);
                match self.encoding.decode(bytes) {
                    Ok(text) => {
                        let request = text.trim_end().to_string();
                        debug!("Decoded data from {}: {request}", self.peer);
                        WorkerState::Processing(request)
                    }
                    Err(e) => {
                        error!("Error while decoding data from {}: {e}", self.peer);
                        WorkerState::Terminated(Termination::DecodeFailed)
                    }
                }
            }
            ReadEvent::Received(Err(e)) => WorkerState::Terminated(Termination::Socket(e)),
        }
    }

    async fn process(&self, request: String) -> WorkerState {
        let handler = Arc::clone(&self.handler);
        match tokio::task::spawn_blocking(move || handler.receive(&request)).await {
            Ok(response) => WorkerState::Responding(response),
            Err(e) => {
                error!("Request handler for {} failed: {e}", self.peer);
                WorkerState::Responding(Response::internal_error())
            }
        }
    }

    async fn respond(&mut self, response: Response) -> WorkerState {
        debug!("Sending response to {}: {response}", self.peer);
        let frame = self.encoding.encode(&format!("{response}\n"));

        match timeout(self.idle_timeout, self.stream.write_all(&frame)).await {
            Ok(Ok(())) => WorkerState::AwaitingData,
            Ok(Err(e)) => WorkerState::Terminated(Termination::Socket(e)),
            Err(_) => WorkerState::Terminated(Termination::IdleTimeout),
        }
    }
}
