use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use anyhow::{Context, Result};

use whichspace_ipc::{Command, Response};

use super::SOCKET_PATH;

pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    pub fn connect() -> Result<Self> {
        Self::connect_to(Path::new(SOCKET_PATH))
    }

    pub fn connect_to(socket_path: &Path) -> Result<Self> {
        let stream =
            UnixStream::connect(socket_path).context("Failed to connect to whichspace daemon")?;
        Ok(Self { stream })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let json = serde_json::to_string(cmd)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.is_empty() {
            anyhow::bail!("Connection closed by daemon");
        }

        let response: Response = serde_json::from_str(&line)?;
        Ok(response)
    }
}
