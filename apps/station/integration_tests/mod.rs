mod helpers;
mod server_process;
mod supervisor;
