use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use core_foundation_sys::runloop::{
    CFRunLoopGetMain, CFRunLoopSourceRef, CFRunLoopSourceSignal, CFRunLoopWakeUp,
};
use tokio::sync::mpsc;

use crate::ipc::{IpcCommandWithResponse, IpcServer, SOCKET_PATH};
use crate::trigger::{trigger_channel, TriggerReceiver, TriggerSender, Waker};

/// Pointer to the main thread's CFRunLoopSource, set once the source exists.
pub type RunLoopSourceSlot = Arc<AtomicPtr<c_void>>;

pub struct TokioChannels {
    pub ipc_cmd_tx: std_mpsc::Sender<IpcCommandWithResponse>,
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub server_rx: mpsc::Receiver<IpcCommandWithResponse>,
    pub wake: Waker,
}

pub struct MainChannels {
    pub ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
    pub triggers: TriggerSender,
    pub trigger_rx: TriggerReceiver,
    pub runloop_source: RunLoopSourceSlot,
}

/// Signal the main run loop source and wake the main run loop.
fn wake_main(slot: &RunLoopSourceSlot) {
    let source = slot.load(Ordering::Acquire);
    if !source.is_null() {
        unsafe {
            CFRunLoopSourceSignal(source as CFRunLoopSourceRef);
            CFRunLoopWakeUp(CFRunLoopGetMain());
        }
    }
}

pub fn create_channels() -> (TokioChannels, MainChannels) {
    // Shared pointer to CFRunLoopSource (will be set by main thread)
    let runloop_source: RunLoopSourceSlot = Arc::new(AtomicPtr::new(ptr::null_mut()));
    let slot = Arc::clone(&runloop_source);
    let wake: Waker = Arc::new(move || wake_main(&slot));

    // Channel: IPC commands (tokio -> main thread)
    let (ipc_cmd_tx, ipc_cmd_rx) = std_mpsc::channel::<IpcCommandWithResponse>();

    // Channel for IPC server (tokio internal)
    let (server_tx, server_rx) = mpsc::channel::<IpcCommandWithResponse>(16);

    // Channel: every trigger source -> main thread
    let (triggers, trigger_rx) = trigger_channel(Arc::clone(&wake));

    let tokio_channels = TokioChannels {
        ipc_cmd_tx,
        server_tx,
        server_rx,
        wake,
    };

    let main_channels = MainChannels {
        ipc_cmd_rx,
        triggers,
        trigger_rx,
        runloop_source,
    };

    (tokio_channels, main_channels)
}

pub async fn run_async(channels: TokioChannels) {
    let TokioChannels {
        ipc_cmd_tx,
        server_tx,
        server_rx: mut ipc_rx,
        wake,
    } = channels;

    tracing::info!("Tokio runtime started");

    let ipc_server = IpcServer::new(SOCKET_PATH, server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    while let Some((cmd, resp_tx)) = ipc_rx.recv().await {
        // Forward IPC commands to main thread
        if ipc_cmd_tx.send((cmd, resp_tx)).is_err() {
            tracing::error!("Failed to forward IPC command to main thread");
            break;
        }
        wake();
    }

    tracing::info!("Tokio runtime exiting");
}
