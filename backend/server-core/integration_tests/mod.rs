mod error;
mod handlers;
mod helpers;
mod lifecycle;
mod shutdown;
mod transport;
mod worker;
