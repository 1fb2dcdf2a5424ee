use server_core::ServerProcess;

use models::{ServerKind, ServerSpec, ServerSpecBuilder};

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

pub const STATION_BIN: &str = env!("CARGO_BIN_EXE_station");
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn spec(kind: ServerKind, scratch: &Path) -> ServerSpec {
    let mut builder = ServerSpecBuilder::default()
        .with_kind(kind)
        .with_max_conn(2)
        .with_logs_dir(scratch.join("logs"));
    if kind.needs_storage() {
        builder = builder.with_storage_dir(scratch.join(kind.as_str()));
    }
    builder.build().unwrap()
}

pub fn process(kind: ServerKind, scratch: &Path) -> ServerProcess {
    ServerProcess::with_program(spec(kind, scratch), STATION_BIN)
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

    /// Send one request line; `None` when the server closed the connection.
    pub async fn request(&mut self, text: &str) -> Option<String> {
        self.writer
            .write_all(format!("{text}\n").as_bytes())
            .await
            .ok()?;
        self.reply().await
    }

    pub async fn reply(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("server did not reply in time")
            .ok()?;
        (read > 0).then(|| line.trim_end_matches('\n').to_string())
    }
}
