use std::num::NonZeroU32;

use super::space::{ResolvedState, Snapshot, SpaceId};

/// Numbers spaces across displays and finds the active one.
///
/// Pure over the snapshot: the same snapshot always resolves to the same
/// state.
#[derive(Debug, Clone)]
pub struct SpaceResolver {
    primary_display: String,
}

impl SpaceResolver {
    pub fn new(primary_display: impl Into<String>) -> Self {
        Self {
            primary_display: primary_display.into(),
        }
    }

    pub fn primary_display(&self) -> &str {
        &self.primary_display
    }

    /// The space id the window server considers current.
    ///
    /// Each display is checked against the primary identifier and the active
    /// display identifier independently, so when both match different
    /// displays the later one in snapshot order wins.
    pub fn active_space_id(&self, snapshot: &Snapshot) -> Option<SpaceId> {
        let mut active = None;
        for display in &snapshot.displays {
            let is_primary = display.identifier == self.primary_display;
            let is_active = snapshot
                .active_display
                .as_deref()
                .is_some_and(|id| display.identifier == id);
            if is_primary || is_active {
                active = Some(display.current_space_id);
            }
        }
        active
    }

    /// Every numbered space as `(number, id)`, in display order then space
    /// order. Full-screen tiles get no number.
    pub fn numbering(&self, snapshot: &Snapshot) -> Vec<(NonZeroU32, SpaceId)> {
        snapshot
            .displays
            .iter()
            .flat_map(|d| d.spaces.iter())
            .filter(|s| !s.is_fullscreen_tile)
            .zip(1u32..)
            .filter_map(|(space, n)| NonZeroU32::new(n).map(|n| (n, space.id)))
            .collect()
    }

    pub fn resolve(&self, snapshot: &Snapshot) -> ResolvedState {
        let Some(active_id) = self.active_space_id(snapshot) else {
            return ResolvedState::Unknown;
        };

        // A full-screen active space has no number and falls through to Unknown.
        self.numbering(snapshot)
            .into_iter()
            .find(|&(_, id)| id == active_id)
            .map_or(ResolvedState::Unknown, |(n, _)| ResolvedState::Active(n))
    }
}
