use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};

use whichspace_ipc::{Command, Response};

pub type IpcCommandWithResponse = (Command, oneshot::Sender<Response>);

/// Line-oriented JSON request/response server. Every request is forwarded
/// to the main thread and answered in order on the same connection.
pub struct IpcServer {
    socket_path: PathBuf,
    cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
}

impl IpcServer {
    pub fn new(
        socket_path: impl Into<PathBuf>,
        cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let listener = self.bind()?;

        loop {
            let stream = match listener.accept().await {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    tracing::warn!("IPC accept failed: {}", e);
                    continue;
                }
            };
            let cmd_tx = self.cmd_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_client(stream, cmd_tx).await {
                    tracing::debug!("IPC client dropped: {}", e);
                }
            });
        }
    }

    fn bind(&self) -> Result<UnixListener> {
        // A previous instance may have left its socket behind
        match std::fs::remove_file(&self.socket_path) {
            Ok(()) => tracing::debug!("Removed stale socket {:?}", self.socket_path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove {:?}", self.socket_path))
            }
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind {:?}", self.socket_path))?;
        tracing::info!("IPC listening on {:?}", self.socket_path);
        Ok(listener)
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn serve_client(
    stream: UnixStream,
    cmd_tx: mpsc::Sender<IpcCommandWithResponse>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut requests = BufReader::new(reader).lines();

    while let Some(line) = requests.next_line().await? {
        let request = line.trim();
        if request.is_empty() {
            continue;
        }

        let response = respond(request, &cmd_tx).await;
        let mut reply = serde_json::to_vec(&response)?;
        reply.push(b'\n');
        writer.write_all(&reply).await?;
    }

    Ok(())
}

/// Decode one request line and wait for the main thread's answer.
async fn respond(request: &str, cmd_tx: &mpsc::Sender<IpcCommandWithResponse>) -> Response {
    let cmd = match serde_json::from_str::<Command>(request) {
        Ok(cmd) => cmd,
        Err(e) => return error_response(format!("Invalid command: {}", e)),
    };
    tracing::debug!("IPC request: {:?}", cmd);

    let (resp_tx, resp_rx) = oneshot::channel();
    if cmd_tx.send((cmd, resp_tx)).await.is_err() {
        return error_response("Daemon is shutting down");
    }
    resp_rx
        .await
        .unwrap_or_else(|_| error_response("Daemon dropped the request"))
}

fn error_response(message: impl Into<String>) -> Response {
    Response::Error {
        message: message.into(),
    }
}
