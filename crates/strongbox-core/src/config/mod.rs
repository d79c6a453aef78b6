//! Configuration for the server and the client.

mod client;
mod server;

pub use client::ClientConfig;
pub use server::ServerConfig;
