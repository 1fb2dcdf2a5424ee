//! Listening socket, admission control and shutdown sequencing.

use crate::config::ServerTunables;
use crate::error::server::ServerError;
use crate::handler::RequestHandler;
use crate::shutdown::{ShutdownListener, ShutdownMode};
use crate::slot_pool::{ConnectionEntry, SlotPool};
use crate::worker::ConnectionWorker;

use models::ServerSpec;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpSocket, TcpStream, lookup_host};
use tokio::time::sleep;

/// How a server run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Listener closed, every live connection finished on its own.
    Drained,
    /// Listener closed, `closed` live connections were told to close.
    Killed { closed: usize },
}

pub struct Server {
    spec: ServerSpec,
    handler: Arc<dyn RequestHandler>,
    pool: Arc<SlotPool>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Bind `host:port` with address reuse and the fixed listen backlog.
    ///
    /// Port 0 binds an OS-assigned port; see [`Server::local_addr`].
    pub async fn bind(
        spec: ServerSpec,
        handler: Arc<dyn RequestHandler>,
        host: &str,
        port: u16,
    ) -> Result<Self, ServerError> {
        let address = format!("{host}:{port}");

        let resolved = lookup_host(address.as_str())
            .await
            .map_err(|e| ServerError::resolve(format!("Failed to resolve {address}: {e}")))?
            .next()
            .ok_or_else(|| ServerError::resolve(format!("No address found for {address}")))?;

        let listener = Self::listen(resolved)
            .map_err(|e| ServerError::bind(format!("Failed to bind {address}: {e}"), e))?;
        let local_addr = listener.local_addr().map_err(|e| {
            ServerError::bind(
                format!("Failed to read local address of {address}: {e}"),
                e,
            )
        })?;

        info!("{} listening on {local_addr}", spec.name);
        Ok(Self {
            pool: Arc::new(SlotPool::new(spec.max_conn)),
            spec,
            handler,
            listener,
            local_addr,
        })
    }

    fn listen(address: SocketAddr) -> std::io::Result<TcpListener> {
        let socket = match address {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(address)?;
        socket.listen(ServerTunables::LISTEN_BACKLOG)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn pool(&self) -> Arc<SlotPool> {
        Arc::clone(&self.pool)
    }

    /// Accept connections until shutdown is requested, then drain or kill.
    pub async fn run(self, mut shutdown: ShutdownListener) -> Result<ShutdownOutcome, ServerError> {
        let Server {
            spec,
            handler,
            pool,
            listener,
            ..
        } = self;

        let mode = Self::accept_loop(&spec, &handler, &pool, listener, &mut shutdown).await?;
        info!("Main socket closed");

        match mode {
            ShutdownMode::Kill => Ok(Self::kill(&pool)),
            _ => {
                if !pool.has_active() {
                    info!("No active socket(s)");
                    return Ok(ShutdownOutcome::Drained);
                }

                info!(
                    "{} active connection(s) found, waiting for them to finish",
                    pool.active_count()
                );
                tokio::select! {
                    _ = pool.wait_idle() => {
                        info!("All connections finished");
                        Ok(ShutdownOutcome::Drained)
                    }
                    _ = shutdown.killed() => Ok(Self::kill(&pool)),
                }
            }
        }
    }

    fn kill(pool: &SlotPool) -> ShutdownOutcome {
        let closed = pool.close_all();
        if closed > 0 {
            warn!("Closing {closed} active connection(s), in-flight data may be lost");
        }
        ShutdownOutcome::Killed { closed }
    }

    /// Owns the listener so that leaving this function is the one place it closes.
    async fn accept_loop(
        spec: &ServerSpec,
        handler: &Arc<dyn RequestHandler>,
        pool: &Arc<SlotPool>,
        listener: TcpListener,
        shutdown: &mut ShutdownListener,
    ) -> Result<ShutdownMode, ServerError> {
        loop {
            while pool.is_full() {
                debug!("All {} slots occupied, waiting", pool.capacity());
                tokio::select! {
                    biased;
                    mode = shutdown.stopping() => return Ok(mode),
                    _ = pool.vacancy() => {}
                    _ = sleep(ServerTunables::ADMISSION_POLL_INTERVAL) => {}
                }
            }

            debug!("Listening for new connections...");
            tokio::select! {
                biased;
                mode = shutdown.stopping() => return Ok(mode),
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => Self::dispatch(spec, handler, pool, stream, peer),
                    Err(e) if Self::is_transient(e.kind()) => {
                        warn!("Accept failed, continuing: {e}");
                    }
                    Err(e) => {
                        error!("Listening socket failed: {e}");
                        return Err(ServerError::accept(e));
                    }
                },
            }
        }
    }

    fn is_transient(kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
        )
    }

    fn dispatch(
        spec: &ServerSpec,
        handler: &Arc<dyn RequestHandler>,
        pool: &Arc<SlotPool>,
        stream: TcpStream,
        peer: SocketAddr,
    ) {
        let (entry, close) = ConnectionEntry::new(peer);
        let slot = match pool.acquire_guard(entry) {
            Ok(slot) => slot,
            Err(e) => {
                warn!("Dropping connection from {peer}: {e}");
                return;
            }
        };

        let worker = ConnectionWorker::new(
            stream,
            peer,
            slot,
            close,
            Arc::clone(handler),
            spec.encoding,
            spec.timeout,
        );
        tokio::spawn(worker.run());
    }
}
