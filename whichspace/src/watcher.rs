use std::io;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

#[cfg(target_os = "linux")]
mod inotify;
#[cfg(target_os = "macos")]
mod kqueue;

#[cfg(target_os = "linux")]
pub use inotify::InotifyMonitor as PlatformMonitor;
#[cfg(target_os = "macos")]
pub use kqueue::KqueueMonitor as PlatformMonitor;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to open {path:?} for watching")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("watch on {path:?} failed")]
    Wait {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Filesystem notification backend.
pub trait FileMonitor {
    type Watch: FileWatch;

    /// Open `path` and register a one-shot delete notification on it.
    fn open(&self, path: &Path) -> io::Result<Self::Watch>;
}

/// One registered watch on one generation of a file.
pub trait FileWatch {
    /// Block until the watched file is deleted.
    fn wait_for_delete(&mut self) -> io::Result<()>;

    /// Deregister the notification, then close the descriptor.
    fn cancel(self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Armed,
    Firing,
}

/// Watches the spaces file and calls `on_fire` each time the window server
/// deletes it.
///
/// The notification does not survive the delete/recreate cycle, so every
/// fire cancels the old watch, runs the callback once and only then opens
/// the freshly written file again.
pub struct ChangeWatcher<M, F> {
    path: PathBuf,
    monitor: M,
    on_fire: F,
    state: WatcherState,
}

impl<M: FileMonitor, F: FnMut()> ChangeWatcher<M, F> {
    pub fn new(path: impl Into<PathBuf>, monitor: M, on_fire: F) -> Self {
        Self {
            path: path.into(),
            monitor,
            on_fire,
            state: WatcherState::Idle,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Idle -> Armed. On failure the watcher stays idle.
    pub fn arm(&mut self) -> Result<M::Watch, WatchError> {
        match self.monitor.open(&self.path) {
            Ok(watch) => {
                self.state = WatcherState::Armed;
                tracing::debug!("Watching {:?}", self.path);
                Ok(watch)
            }
            Err(source) => {
                self.state = WatcherState::Idle;
                tracing::warn!("Failed to open {:?}: {}", self.path, source);
                Err(WatchError::Setup {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    /// Armed -> Firing -> Armed for a delivered delete event.
    pub fn fire(&mut self, watch: M::Watch) -> Result<M::Watch, WatchError> {
        self.state = WatcherState::Firing;
        watch.cancel();
        (self.on_fire)();
        self.arm()
    }

    /// Arm and keep handling delete events until the watch can't be
    /// re-established.
    pub fn run(mut self) -> Result<(), WatchError> {
        let mut watch = self.arm()?;
        loop {
            if let Err(source) = watch.wait_for_delete() {
                watch.cancel();
                self.state = WatcherState::Idle;
                return Err(WatchError::Wait {
                    path: self.path.clone(),
                    source,
                });
            }
            tracing::debug!("{:?} deleted", self.path);
            watch = self.fire(watch)?;
        }
    }
}

impl<M, F> ChangeWatcher<M, F>
where
    M: FileMonitor + Send + 'static,
    F: FnMut() + Send + 'static,
{
    /// Run on a dedicated background thread for the rest of the process.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("spaces-watcher".to_string())
            .spawn(move || {
                let path = self.path.clone();
                if let Err(e) = self.run() {
                    tracing::warn!("Stopped watching {:?}: {}", path, e);
                }
            })
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::platform::mock::{log_event, EventLog};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted backend. Each queued `opens` entry answers one open,
    /// `false` meaning the file can't be reopened at that point. `deletes`
    /// delete events are delivered in total, after which waiting fails.
    pub struct ScriptedMonitor {
        opens: Mutex<VecDeque<bool>>,
        deletes: Arc<AtomicUsize>,
        log: EventLog,
    }

    pub struct ScriptedWatch {
        deletes: Arc<AtomicUsize>,
        log: EventLog,
    }

    impl ScriptedMonitor {
        pub fn new(opens: &[bool], deletes: usize, log: EventLog) -> Self {
            Self {
                opens: Mutex::new(opens.iter().copied().collect()),
                deletes: Arc::new(AtomicUsize::new(deletes)),
                log,
            }
        }
    }

    impl FileMonitor for ScriptedMonitor {
        type Watch = ScriptedWatch;

        fn open(&self, _path: &Path) -> io::Result<ScriptedWatch> {
            log_event(&self.log, "open");
            match self.opens.lock().unwrap().pop_front() {
                Some(true) => Ok(ScriptedWatch {
                    deletes: Arc::clone(&self.deletes),
                    log: Arc::clone(&self.log),
                }),
                _ => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            }
        }
    }

    impl FileWatch for ScriptedWatch {
        fn wait_for_delete(&mut self) -> io::Result<()> {
            let taken = self
                .deletes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            match taken {
                Ok(_) => Ok(()),
                Err(_) => Err(io::Error::new(io::ErrorKind::Other, "no more events")),
            }
        }

        fn cancel(self) {
            log_event(&self.log, "cancel");
        }
    }
}
