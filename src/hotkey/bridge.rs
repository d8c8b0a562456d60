//! Hand-off from the key listener thread to the UI thread.
//!
//! The listener only ever sends trigger names. Handlers are registered on
//! the [`HotkeyBridge`], which stays on the UI thread, and run there when the
//! UI loop drains the channel. Nothing the handlers touch has to be `Send`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, warn};

pub const TRIGGER_SEARCH: &str = "search";
pub const TRIGGER_CASCADE: &str = "cascade";
/// Sent once by the listener when global key capture is not available.
pub const TRIGGER_LISTENER_DOWN: &str = "listener-unavailable";

/// Cloneable sending half, safe to move to any thread.
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: Sender<String>,
}

impl TriggerSender {
    /// Queue `trigger` for the UI thread. Returns `false` once the bridge has
    /// been dropped.
    pub fn fire(&self, trigger: &str) -> bool {
        self.tx.send(trigger.to_string()).is_ok()
    }
}

pub type Handler<S> = Box<dyn FnMut(&mut S)>;

/// Single-consumer dispatch queue with per-trigger handlers over state `S`.
pub struct HotkeyBridge<S> {
    rx: Receiver<String>,
    tx: Sender<String>,
    handlers: HashMap<String, Handler<S>>,
}

impl<S> Default for HotkeyBridge<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> HotkeyBridge<S> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            rx,
            tx,
            handlers: HashMap::new(),
        }
    }

    /// Bind `handler` to `trigger`, replacing any earlier binding.
    pub fn register(&mut self, trigger: impl Into<String>, handler: impl FnMut(&mut S) + 'static) {
        self.handlers.insert(trigger.into(), Box::new(handler));
    }

    pub fn is_registered(&self, trigger: &str) -> bool {
        self.handlers.contains_key(trigger)
    }

    pub fn sender(&self) -> TriggerSender {
        TriggerSender {
            tx: self.tx.clone(),
        }
    }

    /// Run handlers for everything queued so far, oldest first, and return
    /// how many triggers were taken off the queue.
    pub fn dispatch_pending(&mut self, state: &mut S) -> usize {
        let mut count = 0;
        while let Ok(trigger) = self.rx.try_recv() {
            self.dispatch(&trigger, state);
            count += 1;
        }
        count
    }

    /// Like [`dispatch_pending`](Self::dispatch_pending), but waits up to
    /// `timeout` for the first trigger when the queue is empty.
    pub fn dispatch_timeout(&mut self, state: &mut S, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(trigger) => {
                self.dispatch(&trigger, state);
                1 + self.dispatch_pending(state)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn dispatch(&mut self, trigger: &str, state: &mut S) {
        match self.handlers.get_mut(trigger) {
            Some(handler) => {
                debug!(trigger, "Dispatching trigger");
                handler(state);
            }
            None => warn!(trigger, "No handler registered for trigger"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Default)]
    struct Seen {
        order: Vec<&'static str>,
        threads: Vec<thread::ThreadId>,
    }

    fn bridge() -> HotkeyBridge<Seen> {
        let mut bridge = HotkeyBridge::new();
        bridge.register(TRIGGER_SEARCH, |seen: &mut Seen| {
            seen.order.push("search");
            seen.threads.push(thread::current().id());
        });
        bridge.register(TRIGGER_CASCADE, |seen: &mut Seen| {
            seen.order.push("cascade");
            seen.threads.push(thread::current().id());
        });
        bridge
    }

    #[test]
    fn test_handlers_run_on_dispatching_thread() {
        let mut bridge = bridge();
        let sender = bridge.sender();
        let listener = thread::spawn(move || {
            assert!(sender.fire(TRIGGER_SEARCH));
            thread::current().id()
        });
        let listener_id = listener.join().unwrap();

        let mut seen = Seen::default();
        assert_eq!(bridge.dispatch_pending(&mut seen), 1);
        assert_eq!(seen.threads, vec![thread::current().id()]);
        assert_ne!(seen.threads[0], listener_id);
    }

    #[test]
    fn test_burst_is_dispatched_in_arrival_order() {
        let mut bridge = bridge();
        let sender = bridge.sender();
        thread::spawn(move || {
            sender.fire(TRIGGER_CASCADE);
            sender.fire(TRIGGER_SEARCH);
            sender.fire(TRIGGER_CASCADE);
        })
        .join()
        .unwrap();

        let mut seen = Seen::default();
        assert_eq!(bridge.dispatch_pending(&mut seen), 3);
        assert_eq!(seen.order, vec!["cascade", "search", "cascade"]);
        assert_eq!(bridge.dispatch_pending(&mut seen), 0);
    }

    #[test]
    fn test_unknown_trigger_is_consumed_without_handler() {
        let mut bridge = bridge();
        bridge.sender().fire("nope");
        bridge.sender().fire(TRIGGER_SEARCH);

        let mut seen = Seen::default();
        assert_eq!(bridge.dispatch_pending(&mut seen), 2);
        assert_eq!(seen.order, vec!["search"]);
    }

    #[test]
    fn test_dispatch_timeout_waits_for_first_trigger() {
        let mut bridge = bridge();
        let sender = bridge.sender();
        let mut seen = Seen::default();
        assert_eq!(
            bridge.dispatch_timeout(&mut seen, Duration::from_millis(5)),
            0
        );

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sender.fire(TRIGGER_CASCADE);
        });
        assert_eq!(
            bridge.dispatch_timeout(&mut seen, Duration::from_secs(5)),
            1
        );
        worker.join().unwrap();
        assert_eq!(seen.order, vec!["cascade"]);
    }
}
