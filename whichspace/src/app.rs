mod channels;

use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::atomic::Ordering;
use std::sync::mpsc as std_mpsc;

use anyhow::{Context, Result};
use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_foundation_sys::base::kCFAllocatorDefault;
use core_foundation_sys::runloop::{CFRunLoopSourceContext, CFRunLoopSourceCreate};
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
use objc2_foundation::MainThreadMarker;
use whichspace_ipc::Command;

use crate::core::Config;
use crate::dispatch::handle_ipc_command;
use crate::ipc::IpcCommandWithResponse;
use crate::macos::{SpaceNotificationWatcher, StatusItem};
use crate::platform::MacOSSpaceDataSource;
use crate::tracker::SpaceTracker;
use crate::trigger::{Trigger, TriggerReceiver};
use crate::watcher::{ChangeWatcher, PlatformMonitor};

use channels::{create_channels, run_async, MainChannels};

type MacOSTracker = SpaceTracker<MacOSSpaceDataSource, StatusItem>;

struct RunLoopContext {
    ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
    trigger_rx: TriggerReceiver,
    tracker: RefCell<MacOSTracker>,
}

impl RunLoopContext {
    fn process(&self) {
        let triggers = self.trigger_rx.drain();
        self.tracker.borrow_mut().handle_triggers(triggers);

        while let Ok((cmd, resp_tx)) = self.ipc_cmd_rx.try_recv() {
            tracing::debug!("Received IPC command: {:?}", cmd);
            let response = handle_ipc_command(&mut self.tracker.borrow_mut(), &cmd);
            let _ = resp_tx.send(response);

            // Handle Quit command after sending response
            if cmd == Command::Quit {
                terminate();
            }
        }
    }
}

extern "C" fn perform_callback(info: *const c_void) {
    let ctx = unsafe { &*(info as *const RunLoopContext) };
    ctx.process();
}

#[allow(unused_unsafe)]
fn terminate() {
    if let Some(mtm) = MainThreadMarker::new() {
        unsafe { NSApplication::sharedApplication(mtm).terminate(None) };
    }
}

pub struct App {}

impl App {
    pub fn run(config: Config) -> Result<()> {
        let mtm = MainThreadMarker::new().context("Must be started from the main thread")?;
        let (tokio_channels, main_channels) = create_channels();

        // Spawn tokio runtime in separate thread
        std::thread::Builder::new()
            .name("ipc".to_string())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(run_async(tokio_channels)),
                Err(e) => tracing::error!("Failed to start tokio runtime: {}", e),
            })
            .context("Failed to spawn IPC thread")?;

        let app = App {};
        app.run_main_loop(config, main_channels, mtm)
    }

    #[allow(unused_unsafe)]
    fn run_main_loop(
        self,
        config: Config,
        channels: MainChannels,
        mtm: MainThreadMarker,
    ) -> Result<()> {
        let MainChannels {
            ipc_cmd_rx,
            triggers,
            trigger_rx,
            runloop_source,
        } = channels;

        let ns_app = NSApplication::sharedApplication(mtm);
        // Accessory: no Dock icon, no main menu
        ns_app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

        let status_item = StatusItem::new(mtm, &config.unknown_label);
        let mut tracker = SpaceTracker::new(MacOSSpaceDataSource::new(), status_item, &config);

        // Never show a stale state at launch
        tracker.refresh(Trigger::Startup);

        let context = Box::new(RunLoopContext {
            ipc_cmd_rx,
            trigger_rx,
            tracker: RefCell::new(tracker),
        });
        let mut source_context = CFRunLoopSourceContext {
            version: 0,
            info: Box::into_raw(context) as *mut c_void,
            retain: None,
            release: None,
            copyDescription: None,
            equal: None,
            hash: None,
            schedule: None,
            cancel: None,
            perform: perform_callback,
        };
        let source = unsafe {
            CFRunLoopSource::wrap_under_create_rule(CFRunLoopSourceCreate(
                kCFAllocatorDefault,
                0,
                &mut source_context,
            ))
        };
        CFRunLoop::get_main().add_source(&source, unsafe { kCFRunLoopCommonModes });
        runloop_source.store(
            source.as_concrete_TypeRef() as *mut c_void,
            Ordering::Release,
        );

        let _notification_watcher = SpaceNotificationWatcher::new(triggers.clone(), mtm);

        // Blocks the watcher thread until the main thread has resolved, so
        // the watch is only re-armed after handling.
        let file_triggers = triggers.clone();
        let watcher = ChangeWatcher::new(config.spaces_file.clone(), PlatformMonitor, move || {
            if file_triggers
                .fire_and_wait(Trigger::SpacesFileDeleted)
                .is_none()
            {
                tracing::warn!("Spaces file change was not resolved");
            }
        });
        if let Err(e) = watcher.spawn() {
            tracing::warn!("Failed to start spaces file watcher: {}", e);
        }

        tracing::info!("Entering run loop");
        unsafe { ns_app.run() };
        tracing::info!("Run loop exited");

        drop(source);
        Ok(())
    }
}
