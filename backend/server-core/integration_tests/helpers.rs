use server_core::error::server::ServerError;
use server_core::{
    RequestHandler, Response, Server, ShutdownController, ShutdownOutcome, SlotPool,
};

use models::{ServerKind, ServerSpec, ServerSpecBuilder};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

pub const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

pub struct RunningServer {
    pub addr: SocketAddr,
    pub controller: ShutdownController,
    pub pool: Arc<SlotPool>,
    pub task: JoinHandle<Result<ShutdownOutcome, ServerError>>,
}

pub fn time_spec(max_conn: usize, idle_timeout: Duration) -> ServerSpec {
    ServerSpecBuilder::default()
        .with_kind(ServerKind::Time)
        .with_name("test_server")
        .with_max_conn(max_conn)
        .with_timeout(idle_timeout)
        .build()
        .unwrap()
}

pub fn echo_handler() -> Arc<dyn RequestHandler> {
    Arc::new(|request: &str| Response::ok_with(format!("echo {request}")))
}

pub async fn start_server(spec: ServerSpec, handler: Arc<dyn RequestHandler>) -> RunningServer {
    let server = Server::bind(spec, handler, "127.0.0.1", 0).await.unwrap();
    let addr = server.local_addr();
    let pool = server.pool();
    let controller = ShutdownController::new();
    let listener = controller.subscribe();
    let task = tokio::spawn(server.run(listener));
    RunningServer {
        addr,
        controller,
        pool,
        task,
    }
}

pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let (read, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            reader: BufReader::new(read),
            writer,
        }
    }

    pub async fn send(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Next response line without its newline. `None` when the server closed the connection.
    pub async fn reply(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = timeout(REPLY_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("server did not reply in time")
            .ok()?;
        if read == 0 {
            return None;
        }
        Some(line.trim_end_matches('\n').to_string())
    }

    /// Whether a reply arrives within `window`.
    pub async fn replies_within(&mut self, window: Duration) -> bool {
        let mut line = String::new();
        matches!(
            timeout(window, self.reader.read_line(&mut line)).await,
            Ok(Ok(n)) if n > 0
        )
    }

    pub async fn request(&mut self, text: &str) -> Option<String> {
        self.send(format!("{text}\n").as_bytes()).await;
        self.reply().await
    }
}

/// Poll `condition` until it holds or `limit` passes.
pub async fn eventually(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    condition()
}
