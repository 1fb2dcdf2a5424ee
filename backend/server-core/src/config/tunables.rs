use std::time::Duration;

/// Fixed transport constants. These are not user configuration.
pub struct ServerTunables;

impl ServerTunables {
    /// Pending-connection queue handed to `listen(2)`.
    pub const LISTEN_BACKLOG: u32 = 5;

    /// Upper bound on bytes read per receive call. Larger requests are
    /// split across reads and processed as separate requests.
    pub const RECEIVE_CHUNK_SIZE: usize = 4096;

    /// How long a worker waits for readability before re-checking for
    /// forced closure and idle expiry.
    pub const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Upper bound on how long the accept loop sleeps while the pool is full.
    /// A slot release wakes it earlier.
    pub const ADMISSION_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// How long a parent waits for a freshly spawned server to announce its address.
    pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
}
