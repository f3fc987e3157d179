use objc2::rc::Retained;
use objc2::{sel, AllocAnyThread};
use objc2_app_kit::{
    NSBezierPath, NSCellImagePosition, NSColor, NSFont, NSImage, NSMenu, NSMenuItem,
    NSStatusBar, NSStatusItem,
};
use objc2_foundation::{ns_string, MainThreadMarker, NSPoint, NSRect, NSSize, NSString};

use crate::platform::StatusPublisher;

const ITEM_WIDTH: f64 = 27.0;
const FONT_SIZE: f64 = 11.0;

const OUTLINE_SIZE: f64 = 16.0;
const OUTLINE_RADIUS: f64 = 3.0;
const OUTLINE_LINE_WIDTH: f64 = 1.5;
const OUTLINE_ALPHA: f64 = 0.85;

/// The square the outline is stroked along, centred in a `width` x `height`
/// item.
fn outline_rect(width: f64, height: f64) -> NSRect {
    NSRect::new(
        NSPoint::new((width - OUTLINE_SIZE) / 2.0, (height - OUTLINE_SIZE) / 2.0),
        NSSize::new(OUTLINE_SIZE, OUTLINE_SIZE),
    )
}

/// Rounded square drawn behind the number. A template image, so AppKit
/// recolours it for light and dark menu bars.
#[allow(deprecated, unused_unsafe)]
fn outline_image(width: f64, height: f64) -> Retained<NSImage> {
    let image = unsafe { NSImage::initWithSize(NSImage::alloc(), NSSize::new(width, height)) };

    unsafe {
        image.lockFocus();
        NSColor::blackColor()
            .colorWithAlphaComponent(OUTLINE_ALPHA)
            .setStroke();
        let path = NSBezierPath::bezierPathWithRoundedRect_xRadius_yRadius(
            outline_rect(width, height),
            OUTLINE_RADIUS,
            OUTLINE_RADIUS,
        );
        path.setLineWidth(OUTLINE_LINE_WIDTH);
        path.stroke();
        image.unlockFocus();
        image.setTemplate(true);
    }
    image
}

/// Menu bar item showing the space number, with a Quit entry.
pub struct StatusItem {
    item: Retained<NSStatusItem>,
    _menu: Retained<NSMenu>,
    mtm: MainThreadMarker,
}

impl StatusItem {
    pub fn new(mtm: MainThreadMarker, initial_label: &str) -> Self {
        let status_bar = NSStatusBar::systemStatusBar();
        let item = status_bar.statusItemWithLength(ITEM_WIDTH);

        let menu = NSMenu::new(mtm);
        let quit = unsafe {
            NSMenuItem::initWithTitle_action_keyEquivalent(
                mtm.alloc(),
                ns_string!("Quit WhichSpace"),
                Some(sel!(terminate:)),
                ns_string!("q"),
            )
        };
        menu.addItem(&quit);
        item.setMenu(Some(&menu));

        if let Some(button) = item.button(mtm) {
            button.setFont(Some(&NSFont::boldSystemFontOfSize(FONT_SIZE)));
            button.setImage(Some(&outline_image(ITEM_WIDTH, status_bar.thickness())));
            button.setImagePosition(NSCellImagePosition::ImageOverlaps);
        }

        let status_item = Self {
            item,
            _menu: menu,
            mtm,
        };
        status_item.set_title(initial_label);
        status_item
    }

    fn set_title(&self, label: &str) {
        match self.item.button(self.mtm) {
            Some(button) => button.setTitle(&NSString::from_str(label)),
            None => tracing::warn!("Status item has no button, dropping label {:?}", label),
        }
    }
}

impl StatusPublisher for StatusItem {
    fn publish(&mut self, label: &str) {
        tracing::debug!("Status item -> {}", label);
        self.set_title(label);
    }
}
