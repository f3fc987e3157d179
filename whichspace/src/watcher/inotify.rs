use std::io;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::inotify::{AddWatchFlags, InitFlags, Inotify, WatchDescriptor};

use super::{FileMonitor, FileWatch};

/// `IN_DELETE_SELF` with `IN_ONESHOT`, the inotify equivalent of a one-shot
/// kqueue delete filter.
pub struct InotifyMonitor;

pub struct InotifyWatch {
    inotify: Inotify,
    wd: Option<WatchDescriptor>,
}

impl FileMonitor for InotifyMonitor {
    type Watch = InotifyWatch;

    fn open(&self, path: &Path) -> io::Result<InotifyWatch> {
        let inotify = Inotify::init(InitFlags::IN_CLOEXEC)?;
        let wd = inotify.add_watch(
            path,
            AddWatchFlags::IN_DELETE_SELF | AddWatchFlags::IN_ONESHOT,
        )?;
        Ok(InotifyWatch {
            inotify,
            wd: Some(wd),
        })
    }
}

impl FileWatch for InotifyWatch {
    fn wait_for_delete(&mut self) -> io::Result<()> {
        loop {
            let events = match self.inotify.read_events() {
                Ok(events) => events,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e.into()),
            };

            if events
                .iter()
                .any(|e| e.mask.contains(AddWatchFlags::IN_DELETE_SELF))
            {
                // IN_ONESHOT already removed the watch
                self.wd = None;
                return Ok(());
            }
            if events
                .iter()
                .any(|e| e.mask.contains(AddWatchFlags::IN_IGNORED))
            {
                self.wd = None;
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "watch removed before delete",
                ));
            }
        }
    }

    fn cancel(self) {
        if let Some(wd) = self.wd {
            let _ = self.inotify.rm_watch(wd);
        }
        drop(self.inotify);
    }
}
