use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Opaque handle the window server assigns to a space ("ManagedSpaceID").
pub type SpaceId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Space {
    pub id: SpaceId,
    /// Space hosting a single full-screen or tiled app.
    pub is_fullscreen_tile: bool,
}

impl Space {
    pub fn new(id: SpaceId) -> Self {
        Self {
            id,
            is_fullscreen_tile: false,
        }
    }

    pub fn fullscreen(id: SpaceId) -> Self {
        Self {
            id,
            is_fullscreen_tile: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub identifier: String,
    pub current_space_id: SpaceId,
    pub spaces: Vec<Space>,
}

/// One atomic read of every display and its spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub displays: Vec<Display>,
    /// Display the window server reports as owning the active menu bar.
    pub active_display: Option<String>,
}

impl Snapshot {
    /// Build a snapshot from raw window server records.
    ///
    /// Displays missing an identifier, a current space id or a space list are
    /// skipped. Spaces without an id are dropped, so they never get a number.
    pub fn from_record(record: SnapshotRecord) -> Self {
        let mut displays = Vec::with_capacity(record.displays.len());

        for raw in record.displays {
            let (Some(identifier), Some(current_space_id), Some(raw_spaces)) = (
                raw.identifier,
                raw.current_space.and_then(|s| s.managed_space_id),
                raw.spaces,
            ) else {
                tracing::debug!("Skipping incomplete display record");
                continue;
            };

            let spaces = raw_spaces
                .into_iter()
                .filter_map(|s| {
                    let Some(id) = s.managed_space_id else {
                        tracing::debug!("Dropping space without id on display {}", identifier);
                        return None;
                    };
                    Some(Space {
                        id,
                        is_fullscreen_tile: s.tile_layout_manager.is_some(),
                    })
                })
                .collect();

            displays.push(Display {
                identifier,
                current_space_id,
                spaces,
            });
        }

        Self {
            displays,
            active_display: record.active_display,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedState {
    Active(NonZeroU32),
    Unknown,
}

impl ResolvedState {
    pub fn number(&self) -> Option<u32> {
        match self {
            ResolvedState::Active(n) => Some(n.get()),
            ResolvedState::Unknown => None,
        }
    }

    /// Text for the status item, `placeholder` when unknown.
    pub fn label(&self, placeholder: &str) -> String {
        match self {
            ResolvedState::Active(n) => n.to_string(),
            ResolvedState::Unknown => placeholder.to_string(),
        }
    }
}

impl fmt::Display for ResolvedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedState::Active(n) => write!(f, "space {}", n),
            ResolvedState::Unknown => write!(f, "unknown"),
        }
    }
}

// Raw records as the window server hands them out. Every field is optional
// because nothing guarantees the private dictionaries keep their shape.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default)]
    pub displays: Vec<DisplayRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    #[serde(
        rename = "Display Identifier",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub identifier: Option<String>,
    #[serde(
        rename = "Current Space",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_space: Option<SpaceRecord>,
    #[serde(rename = "Spaces", default, skip_serializing_if = "Option::is_none")]
    pub spaces: Option<Vec<SpaceRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRecord {
    #[serde(
        rename = "ManagedSpaceID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub managed_space_id: Option<SpaceId>,
    #[serde(
        rename = "TileLayoutManager",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tile_layout_manager: Option<TileLayout>,
}

impl SpaceRecord {
    pub fn new(id: SpaceId) -> Self {
        Self {
            managed_space_id: Some(id),
            tile_layout_manager: None,
        }
    }

    pub fn tiled(id: SpaceId) -> Self {
        Self {
            managed_space_id: Some(id),
            tile_layout_manager: Some(TileLayout::default()),
        }
    }
}

/// Presence marker for the layout manager attached to full-screen tiles.
/// Its contents are irrelevant here and ignored when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayout {}

#[cfg(test)]
mod tests {
    use super::*;

    fn display_record(id: &str, current: SpaceId, spaces: Vec<SpaceRecord>) -> DisplayRecord {
        DisplayRecord {
            identifier: Some(id.to_string()),
            current_space: Some(SpaceRecord::new(current)),
            spaces: Some(spaces),
        }
    }

    #[test]
    fn test_from_record_keeps_order_and_tiles() {
        let record = SnapshotRecord {
            displays: vec![display_record(
                "Main",
                5,
                vec![SpaceRecord::tiled(4), SpaceRecord::new(5), SpaceRecord::new(6)],
            )],
            active_display: Some("Main".to_string()),
        };

        let snapshot = Snapshot::from_record(record);
        assert_eq!(snapshot.active_display.as_deref(), Some("Main"));
        assert_eq!(snapshot.displays.len(), 1);
        assert_eq!(
            snapshot.displays[0].spaces,
            vec![Space::fullscreen(4), Space::new(5), Space::new(6)]
        );
        assert_eq!(snapshot.displays[0].current_space_id, 5);
    }

    #[test]
    fn test_from_record_skips_incomplete_displays() {
        let mut no_identifier = display_record("X", 1, vec![SpaceRecord::new(1)]);
        no_identifier.identifier = None;
        let mut no_current = display_record("Y", 2, vec![SpaceRecord::new(2)]);
        no_current.current_space = Some(SpaceRecord::default());
        let mut no_spaces = display_record("Z", 3, vec![]);
        no_spaces.spaces = None;

        let record = SnapshotRecord {
            displays: vec![
                no_identifier,
                no_current,
                no_spaces,
                display_record("Main", 9, vec![SpaceRecord::new(9)]),
            ],
            active_display: None,
        };

        let snapshot = Snapshot::from_record(record);
        assert_eq!(snapshot.displays.len(), 1);
        assert_eq!(snapshot.displays[0].identifier, "Main");
    }

    #[test]
    fn test_from_record_drops_spaces_without_id() {
        let record = SnapshotRecord {
            displays: vec![display_record(
                "Main",
                2,
                vec![SpaceRecord::default(), SpaceRecord::new(2)],
            )],
            active_display: None,
        };

        let snapshot = Snapshot::from_record(record);
        assert_eq!(snapshot.displays[0].spaces, vec![Space::new(2)]);
    }

    #[test]
    fn test_record_json_uses_window_server_keys() {
        let json = r#"{
            "displays": [{
                "Display Identifier": "Main",
                "Current Space": {"ManagedSpaceID": 42, "uuid": ""},
                "Spaces": [
                    {"ManagedSpaceID": 7},
                    {"ManagedSpaceID": 42},
                    {"ManagedSpaceID": 50, "TileLayoutManager": {"Age": 3}}
                ]
            }],
            "active_display": "Main"
        }"#;

        let record: SnapshotRecord = serde_json::from_str(json).unwrap();
        let snapshot = Snapshot::from_record(record);
        assert_eq!(
            snapshot.displays[0].spaces,
            vec![Space::new(7), Space::new(42), Space::fullscreen(50)]
        );
    }

    #[test]
    fn test_label_uses_placeholder_when_unknown() {
        let active = ResolvedState::Active(NonZeroU32::new(3).unwrap());
        assert_eq!(active.label("?"), "3");
        assert_eq!(active.number(), Some(3));
        assert_eq!(ResolvedState::Unknown.label("?"), "?");
        assert_eq!(ResolvedState::Unknown.number(), None);
    }
}
