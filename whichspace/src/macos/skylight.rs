use std::ffi::c_void;

use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::TCFType;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_foundation_sys::array::CFArrayGetTypeID;
use core_foundation_sys::base::{CFGetTypeID, CFTypeID};
use core_foundation_sys::dictionary::CFDictionaryGetTypeID;
use core_foundation_sys::number::CFNumberGetTypeID;
use core_foundation_sys::string::CFStringGetTypeID;

use crate::core::{DisplayRecord, SpaceId, SpaceRecord, TileLayout};

pub type ConnectionId = i32;

// Private window server calls, re-exported by CoreGraphics from SkyLight.
// Read-only: nothing here changes window server state.
#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn _CGSDefaultConnection() -> ConnectionId;
    fn CGSCopyManagedDisplaySpaces(cid: ConnectionId) -> CFArrayRef;
    fn CGSCopyActiveMenuBarDisplayIdentifier(cid: ConnectionId) -> CFStringRef;
}

pub fn default_connection() -> ConnectionId {
    unsafe { _CGSDefaultConnection() }
}

/// One record per display, in window server order. `None` when the window
/// server returned nothing at all.
pub fn copy_managed_display_spaces(cid: ConnectionId) -> Option<Vec<DisplayRecord>> {
    let ptr = unsafe { CGSCopyManagedDisplaySpaces(cid) };
    if ptr.is_null() {
        return None;
    }
    let displays: CFArray = unsafe { CFArray::wrap_under_create_rule(ptr) };

    let mut records = Vec::with_capacity(displays.len().max(0) as usize);
    for i in 0..displays.len() {
        let item = unsafe { *displays.get_unchecked(i) };
        let Some(dict) = as_dictionary(item) else {
            tracing::debug!("Display entry {} is not a dictionary", i);
            continue;
        };
        records.push(parse_display(&dict));
    }

    Some(records)
}

/// Identifier of the display that currently owns the menu bar.
pub fn copy_active_menu_bar_display(cid: ConnectionId) -> Option<String> {
    let ptr = unsafe { CGSCopyActiveMenuBarDisplayIdentifier(cid) };
    if ptr.is_null() {
        return None;
    }
    let identifier = unsafe { CFString::wrap_under_create_rule(ptr) };
    Some(identifier.to_string())
}

fn parse_display(dict: &CFDictionary) -> DisplayRecord {
    DisplayRecord {
        identifier: get_string(dict, "Display Identifier"),
        current_space: get_dictionary(dict, "Current Space").map(|d| parse_space(&d)),
        spaces: get_array(dict, "Spaces").map(|spaces| {
            (0..spaces.len())
                .map(|i| {
                    let item = unsafe { *spaces.get_unchecked(i) };
                    as_dictionary(item)
                        .map(|d| parse_space(&d))
                        .unwrap_or_default()
                })
                .collect()
        }),
    }
}

fn parse_space(dict: &CFDictionary) -> SpaceRecord {
    SpaceRecord {
        managed_space_id: get_number(dict, "ManagedSpaceID")
            .and_then(|n| n.to_i64())
            .and_then(|id| SpaceId::try_from(id).ok()),
        tile_layout_manager: get_dictionary(dict, "TileLayoutManager")
            .map(|_| TileLayout::default()),
    }
}

fn find_typed(dict: &CFDictionary, key: &str, type_id: CFTypeID) -> Option<*const c_void> {
    let key = CFString::new(key);
    let value = *dict.find(key.as_concrete_TypeRef() as *const c_void)?;
    if value.is_null() || unsafe { CFGetTypeID(value) } != type_id {
        return None;
    }
    Some(value)
}

fn as_dictionary(value: *const c_void) -> Option<CFDictionary> {
    if value.is_null() || unsafe { CFGetTypeID(value) } != unsafe { CFDictionaryGetTypeID() } {
        return None;
    }
    Some(unsafe { CFDictionary::wrap_under_get_rule(value as *const _) })
}

fn get_number(dict: &CFDictionary, key: &str) -> Option<CFNumber> {
    let value = find_typed(dict, key, unsafe { CFNumberGetTypeID() })?;
    Some(unsafe { CFNumber::wrap_under_get_rule(value as *const _) })
}

fn get_string(dict: &CFDictionary, key: &str) -> Option<String> {
    let value = find_typed(dict, key, unsafe { CFStringGetTypeID() })?;
    let cf_str = unsafe { CFString::wrap_under_get_rule(value as *const _) };
    Some(cf_str.to_string())
}

fn get_dictionary(dict: &CFDictionary, key: &str) -> Option<CFDictionary> {
    let value = find_typed(dict, key, unsafe { CFDictionaryGetTypeID() })?;
    Some(unsafe { CFDictionary::wrap_under_get_rule(value as *const _) })
}

fn get_array(dict: &CFDictionary, key: &str) -> Option<CFArray> {
    let value = find_typed(dict, key, unsafe { CFArrayGetTypeID() })?;
    Some(unsafe { CFArray::wrap_under_get_rule(value as *const _) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_foundation::base::CFType;

    fn space_dict(id: i64, tiled: bool) -> CFDictionary<CFString, CFType> {
        let mut pairs = vec![(
            CFString::new("ManagedSpaceID"),
            CFNumber::from(id).as_CFType(),
        )];
        if tiled {
            let layout: CFDictionary<CFString, CFType> = CFDictionary::from_CFType_pairs(&[]);
            pairs.push((CFString::new("TileLayoutManager"), layout.as_CFType()));
        }
        CFDictionary::from_CFType_pairs(&pairs)
    }

    #[test]
    fn test_parse_display_dictionary() {
        let spaces = CFArray::from_CFTypes(&[
            space_dict(7, false).as_CFType(),
            space_dict(42, false).as_CFType(),
            space_dict(50, true).as_CFType(),
        ]);
        let display: CFDictionary<CFString, CFType> = CFDictionary::from_CFType_pairs(&[
            (
                CFString::new("Display Identifier"),
                CFString::new("Main").as_CFType(),
            ),
            (
                CFString::new("Current Space"),
                space_dict(42, false).as_CFType(),
            ),
            (CFString::new("Spaces"), spaces.as_CFType()),
        ]);

        let record = parse_display(&display.to_untyped());
        assert_eq!(record.identifier.as_deref(), Some("Main"));
        assert_eq!(record.current_space, Some(SpaceRecord::new(42)));
        assert_eq!(
            record.spaces,
            Some(vec![
                SpaceRecord::new(7),
                SpaceRecord::new(42),
                SpaceRecord::tiled(50)
            ])
        );
    }

    #[test]
    fn test_parse_display_with_wrong_types() {
        let display: CFDictionary<CFString, CFType> = CFDictionary::from_CFType_pairs(&[
            (
                CFString::new("Display Identifier"),
                CFNumber::from(1i64).as_CFType(),
            ),
            (
                CFString::new("Spaces"),
                CFString::new("not an array").as_CFType(),
            ),
        ]);

        let record = parse_display(&display.to_untyped());
        assert_eq!(record, DisplayRecord::default());
    }
}
