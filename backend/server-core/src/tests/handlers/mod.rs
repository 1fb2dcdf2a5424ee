mod data;
mod log;
mod time;
