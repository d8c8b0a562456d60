use super::bridge::{TriggerSender, TRIGGER_LISTENER_DOWN};
use super::combo::ComboMatcher;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, info, warn};

static DEGRADED_REPORTED: AtomicBool = AtomicBool::new(false);

/// Start global key capture on a detached background thread.
///
/// The thread never touches application state: every recognised
/// combination is forwarded to `sender` as a trigger name. The thread is not
/// joined and does not keep the process alive.
pub fn spawn_listener(matcher: ComboMatcher, sender: TriggerSender) -> Result<()> {
    thread::Builder::new()
        .name("hotkey-listener".to_string())
        .spawn(move || run_listener(matcher, sender))?;
    Ok(())
}

fn run_listener(mut matcher: ComboMatcher, sender: TriggerSender) {
    info!(bindings = matcher.bindings().len(), "Starting global hotkey listener");

    let callback_sender = sender.clone();
    let result = rdev::listen(move |event: rdev::Event| {
        if let Some(trigger) = matcher.feed(&event.event_type) {
            debug!(trigger, "Hotkey pressed");
            callback_sender.fire(trigger);
        }
    });

    // listen() only returns when capture could not be set up.
    if let Err(e) = result {
        report_degraded(&sender, &format!("{:?}", e));
    }
}

/// Log the loss of global hotkeys and tell the UI thread, once per process.
pub fn report_degraded(sender: &TriggerSender, reason: &str) {
    if DEGRADED_REPORTED.swap(true, Ordering::SeqCst) {
        return;
    }
    warn!(
        reason,
        "Global hotkeys are unavailable; use the in-app keys instead"
    );
    sender.fire(TRIGGER_LISTENER_DOWN);
}
