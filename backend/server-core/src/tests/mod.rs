mod handlers;
mod lifecycle;
mod shutdown;
mod storage;
