use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::event::{EvFlags, EventFilter, FilterFlag, KEvent, Kqueue};

use super::{FileMonitor, FileWatch};

/// `EVFILT_VNODE`/`NOTE_DELETE` on a descriptor opened with `O_EVTONLY`, so
/// the watch never keeps the volume busy.
pub struct KqueueMonitor;

pub struct KqueueWatch {
    kq: Kqueue,
    file: File,
}

fn vnode_event(fd: &File, flags: EvFlags) -> KEvent {
    KEvent::new(
        fd.as_raw_fd() as usize,
        EventFilter::EVFILT_VNODE,
        flags,
        FilterFlag::NOTE_DELETE,
        0,
        0,
    )
}

impl FileMonitor for KqueueMonitor {
    type Watch = KqueueWatch;

    fn open(&self, path: &Path) -> io::Result<KqueueWatch> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_EVTONLY)
            .open(path)?;
        let kq = Kqueue::new()?;

        let change = vnode_event(
            &file,
            EvFlags::EV_ADD | EvFlags::EV_ONESHOT | EvFlags::EV_CLEAR,
        );
        let mut no_events: [KEvent; 0] = [];
        kq.kevent(&[change], &mut no_events, None)?;

        Ok(KqueueWatch { kq, file })
    }
}

impl FileWatch for KqueueWatch {
    fn wait_for_delete(&mut self) -> io::Result<()> {
        let mut events = [vnode_event(&self.file, EvFlags::empty())];
        loop {
            match self.kq.kevent(&[], &mut events, None) {
                Ok(0) | Err(Errno::EINTR) => continue,
                Ok(_) if events[0].fflags().contains(FilterFlag::NOTE_DELETE) => return Ok(()),
                Ok(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("unexpected vnode event {:?}", events[0].fflags()),
                    ))
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn cancel(self) {
        // Already gone if the one-shot event was delivered.
        let change = vnode_event(&self.file, EvFlags::EV_DELETE);
        let mut no_events: [KEvent; 0] = [];
        let _ = self.kq.kevent(&[change], &mut no_events, None);
        drop(self.kq);
        drop(self.file);
    }
}
