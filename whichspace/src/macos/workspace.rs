use objc2::rc::Retained;
use objc2::{define_class, msg_send, sel, DefinedClass};
use objc2_app_kit::NSWorkspace;
use objc2_foundation::{
    MainThreadMarker, NSNotification, NSNotificationCenter, NSObject, NSObjectProtocol, NSString,
};

use crate::trigger::{Trigger, TriggerSender};

struct Ivars {
    triggers: TriggerSender,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[ivars = Ivars]
    struct SpaceObserver;

    unsafe impl NSObjectProtocol for SpaceObserver {}

    impl SpaceObserver {
        #[unsafe(method(activeSpaceDidChange:))]
        fn active_space_did_change(&self, _notification: &NSNotification) {
            tracing::debug!("Active space did change");
            self.ivars().triggers.fire(Trigger::ActiveSpaceChanged);
        }

        #[unsafe(method(applicationDidUpdate:))]
        fn application_did_update(&self, _notification: &NSNotification) {
            self.ivars().triggers.fire(Trigger::ApplicationUpdated);
        }
    }
);

impl SpaceObserver {
    fn new(triggers: TriggerSender, mtm: MainThreadMarker) -> Retained<Self> {
        let this = mtm.alloc::<Self>();
        let this = this.set_ivars(Ivars { triggers });
        unsafe { msg_send![super(this), init] }
    }
}

/// Secondary triggers in case a spaces file event is missed: the workspace
/// active-space notification and this application's did-update
/// notification.
pub struct SpaceNotificationWatcher {
    _observer: Retained<SpaceObserver>,
}

impl SpaceNotificationWatcher {
    pub fn new(triggers: TriggerSender, mtm: MainThreadMarker) -> Self {
        let observer = SpaceObserver::new(triggers, mtm);

        unsafe {
            let workspace = NSWorkspace::sharedWorkspace();
            let active_space_name = NSString::from_str("NSWorkspaceActiveSpaceDidChangeNotification");
            workspace.notificationCenter().addObserver_selector_name_object(
                &observer,
                sel!(activeSpaceDidChange:),
                Some(&active_space_name),
                None,
            );

            let did_update_name = NSString::from_str("NSApplicationDidUpdateNotification");
            NSNotificationCenter::defaultCenter().addObserver_selector_name_object(
                &observer,
                sel!(applicationDidUpdate:),
                Some(&did_update_name),
                None,
            );
        }

        tracing::info!("Space notification watcher started");

        Self {
            _observer: observer,
        }
    }
}
