use crate::core::{Config, ResolvedState, SpaceResolver};
use crate::platform::{SpaceDataSource, StatusPublisher};
use crate::trigger::{PendingTrigger, Trigger};
use whichspace_ipc::SpaceInfo;

/// Query → resolve → publish, the one entry point every trigger ends up in.
///
/// Owns the publisher and the last published state. Lives on the main
/// thread.
pub struct SpaceTracker<D: SpaceDataSource, P: StatusPublisher> {
    data_source: D,
    resolver: SpaceResolver,
    publisher: P,
    unknown_label: String,
    current: Option<ResolvedState>,
}

impl<D: SpaceDataSource, P: StatusPublisher> SpaceTracker<D, P> {
    pub fn new(data_source: D, publisher: P, config: &Config) -> Self {
        Self {
            data_source,
            resolver: SpaceResolver::new(config.main_display.clone()),
            publisher,
            unknown_label: config.unknown_label.clone(),
            current: None,
        }
    }

    /// Resolve the active space now and publish it if it changed.
    /// Data source failures degrade to `Unknown`.
    pub fn refresh(&mut self, trigger: Trigger) -> ResolvedState {
        let state = match self.data_source.query_snapshot() {
            Ok(snapshot) => self.resolver.resolve(&snapshot),
            Err(e) => {
                if self.current == Some(ResolvedState::Unknown) {
                    tracing::debug!("Space query still failing ({:?}): {}", trigger, e);
                } else {
                    tracing::warn!("Space query failed ({:?}): {}", trigger, e);
                }
                ResolvedState::Unknown
            }
        };

        if self.current != Some(state) {
            tracing::info!("Active {} ({:?})", state, trigger);
            self.publisher.publish(&state.label(&self.unknown_label));
            self.current = Some(state);
        } else {
            tracing::trace!("Active {} unchanged ({:?})", state, trigger);
        }

        state
    }

    /// Resolve once per queued trigger, in order, and release any sender
    /// waiting on its result. Returns the last resolved state.
    pub fn handle_triggers(&mut self, pending: Vec<PendingTrigger>) -> Option<ResolvedState> {
        let mut last = None;
        for pending in pending {
            let state = self.refresh(pending.trigger());
            pending.complete(state);
            last = Some(state);
        }
        last
    }

    pub fn current(&self) -> ResolvedState {
        self.current.unwrap_or(ResolvedState::Unknown)
    }

    pub fn space_info(&self) -> SpaceInfo {
        let state = self.current();
        SpaceInfo {
            number: state.number(),
            label: state.label(&self.unknown_label),
        }
    }

    pub fn data_source(&self) -> &D {
        &self.data_source
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}
