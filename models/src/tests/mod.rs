mod encoding;
mod server_kind;
mod server_spec;
