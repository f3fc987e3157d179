use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use crate::core::ResolvedState;

/// Anything that asks for the active space to be resolved again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    /// The window server deleted (and will recreate) the spaces file.
    SpacesFileDeleted,
    ActiveSpaceChanged,
    ApplicationUpdated,
    Ipc,
}

/// Wakes whichever thread drains the triggers.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// A queued trigger, optionally with a sender blocked until it has been
/// resolved.
pub struct PendingTrigger {
    trigger: Trigger,
    done: Option<std_mpsc::Sender<ResolvedState>>,
}

impl PendingTrigger {
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Report the resolution back to a waiting sender, if any.
    pub fn complete(self, state: ResolvedState) {
        if let Some(done) = self.done {
            let _ = done.send(state);
        }
    }
}

/// Producer side of the single "resolve now" pipeline. Cheap to clone, one
/// per trigger source.
#[derive(Clone)]
pub struct TriggerSender {
    tx: std_mpsc::Sender<PendingTrigger>,
    wake: Waker,
}

impl TriggerSender {
    /// Queue without waiting. Returns false once the receiving side is gone.
    pub fn fire(&self, trigger: Trigger) -> bool {
        self.send(PendingTrigger {
            trigger,
            done: None,
        })
    }

    /// Queue and block until the draining thread has resolved this trigger.
    /// Must not be called from the draining thread itself.
    pub fn fire_and_wait(&self, trigger: Trigger) -> Option<ResolvedState> {
        let (done_tx, done_rx) = std_mpsc::channel();
        let queued = self.send(PendingTrigger {
            trigger,
            done: Some(done_tx),
        });
        if !queued {
            return None;
        }
        done_rx.recv().ok()
    }

    fn send(&self, pending: PendingTrigger) -> bool {
        let trigger = pending.trigger;
        if self.tx.send(pending).is_err() {
            tracing::warn!("Trigger {:?} dropped, pipeline closed", trigger);
            return false;
        }
        (self.wake)();
        true
    }
}

pub struct TriggerReceiver {
    rx: std_mpsc::Receiver<PendingTrigger>,
}

impl TriggerReceiver {
    /// Everything queued so far, without blocking.
    pub fn drain(&self) -> Vec<PendingTrigger> {
        self.rx.try_iter().collect()
    }
}

pub fn trigger_channel(wake: Waker) -> (TriggerSender, TriggerReceiver) {
    let (tx, rx) = std_mpsc::channel();
    (TriggerSender { tx, wake }, TriggerReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn triggers(pending: Vec<PendingTrigger>) -> Vec<Trigger> {
        pending.iter().map(PendingTrigger::trigger).collect()
    }

    #[test]
    fn test_fire_queues_and_wakes() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (tx, rx) = trigger_channel(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(tx.fire(Trigger::Startup));
        assert!(tx.clone().fire(Trigger::ActiveSpaceChanged));

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(
            triggers(rx.drain()),
            vec![Trigger::Startup, Trigger::ActiveSpaceChanged]
        );
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_fire_from_other_thread() {
        let (tx, rx) = trigger_channel(Arc::new(|| {}));
        std::thread::spawn(move || {
            tx.fire(Trigger::SpacesFileDeleted);
        })
        .join()
        .unwrap();
        assert_eq!(triggers(rx.drain()), vec![Trigger::SpacesFileDeleted]);
    }

    #[test]
    fn test_fire_after_receiver_dropped() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (tx, rx) = trigger_channel(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        drop(rx);

        assert!(!tx.fire(Trigger::Ipc));
        assert_eq!(tx.fire_and_wait(Trigger::SpacesFileDeleted), None);
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fire_and_wait_blocks_until_completed() {
        let (wake_tx, wake_rx) = std_mpsc::channel();
        let (tx, rx) = trigger_channel(Arc::new(move || {
            let _ = wake_tx.send(());
        }));

        let waiter = std::thread::spawn(move || tx.fire_and_wait(Trigger::SpacesFileDeleted));

        wake_rx.recv().unwrap();
        let mut pending = rx.drain();
        assert_eq!(pending.len(), 1);
        let pending = pending.remove(0);
        assert_eq!(pending.trigger(), Trigger::SpacesFileDeleted);
        assert!(!waiter.is_finished());

        let state = ResolvedState::Active(NonZeroU32::new(3).unwrap());
        pending.complete(state);
        assert_eq!(waiter.join().unwrap(), Some(state));
    }

    #[test]
    fn test_fire_and_wait_unblocks_when_dropped_unresolved() {
        let (wake_tx, wake_rx) = std_mpsc::channel();
        let (tx, rx) = trigger_channel(Arc::new(move || {
            let _ = wake_tx.send(());
        }));

        let waiter = std::thread::spawn(move || tx.fire_and_wait(Trigger::SpacesFileDeleted));

        wake_rx.recv().unwrap();
        drop(rx.drain());
        assert_eq!(waiter.join().unwrap(), None);
    }
}
