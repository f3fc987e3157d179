mod client;
mod server;

pub use client::IpcClient;
pub use server::{IpcCommandWithResponse, IpcServer};

pub const SOCKET_PATH: &str = "/tmp/whichspace.sock";
