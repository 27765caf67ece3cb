//! Four-channel remote receiver
//!
//! Each receiver channel is a rising-edge input. Edges are debounced per
//! channel and fanned out to subscribers: wildcard subscribers first, then
//! the channel's own subscribers, each group in registration order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use marquee_core::input::{ButtonEvent, InputError, BUTTON_COUNT};
use marquee_hal::{EdgeInput, GpioError, LineProvider};
use tracing::{debug, trace, warn};

/// Consumer label reported to the GPIO character device
const CONSUMER: &str = "marquee-remote";

/// How long a watcher blocks before re-checking for shutdown
const EDGE_POLL: Duration = Duration::from_millis(100);

/// Who receives a subscription's events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One receiver channel (0-3)
    Pin(u8),
    /// Every channel
    Any,
}

/// Handle returned by [`InputDispatcher::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(ButtonEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    target: Target,
    callback: Callback,
}

#[derive(Default)]
struct State {
    subscribers: Vec<Subscriber>,
    last_accepted: [Option<Instant>; BUTTON_COUNT],
    next_id: u64,
}

/// Debounces edges and fans them out to subscribers
///
/// Shared between the edge watcher threads and whoever subscribes.
/// Callbacks run on the watcher thread and must not block.
pub struct InputDispatcher {
    debounce: Duration,
    state: Mutex<State>,
}

impl InputDispatcher {
    /// Create a dispatcher with the given per-channel debounce window
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking subscriber must not take input down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a callback for one channel or for all of them
    pub fn subscribe<F>(&self, target: Target, callback: F) -> Result<SubscriptionId, InputError>
    where
        F: Fn(ButtonEvent) + Send + Sync + 'static,
    {
        if let Target::Pin(pin) = target {
            if usize::from(pin) >= BUTTON_COUNT {
                return Err(InputError::InvalidSubscription);
            }
        }

        let mut state = self.lock();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.subscribers.push(Subscriber {
            id,
            target,
            callback: Arc::new(callback),
        });
        debug!("Input subscription {:?} for {:?}", id, target);
        Ok(id)
    }

    /// Remove a subscription; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.lock();
        state.subscribers.retain(|s| s.id != id);
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Feed one rising edge detected on `pin` at `at`
    ///
    /// Returns false if the edge fell inside the debounce window of the
    /// channel's last accepted edge (or named an unknown channel).
    pub fn handle_edge(&self, pin: u8, at: Instant) -> bool {
        let slot = usize::from(pin);
        if slot >= BUTTON_COUNT {
            warn!("Edge on unknown receiver channel {}", pin);
            return false;
        }

        let callbacks: Vec<Callback> = {
            let mut state = self.lock();
            if let Some(last) = state.last_accepted[slot] {
                if at.saturating_duration_since(last) < self.debounce {
                    trace!("Debounced edge on channel {}", pin);
                    return false;
                }
            }
            state.last_accepted[slot] = Some(at);

            let wildcard = state
                .subscribers
                .iter()
                .filter(|s| s.target == Target::Any);
            let specific = state
                .subscribers
                .iter()
                .filter(|s| s.target == Target::Pin(pin));
            wildcard.chain(specific).map(|s| s.callback.clone()).collect()
        };

        // Delivered outside the lock so callbacks may (un)subscribe
        let event = ButtonEvent::new(pin, at);
        for callback in callbacks {
            callback(event);
        }
        true
    }
}

/// Claimed receiver lines with one watcher thread per channel
///
/// Dropping the receiver stops the watchers and releases the lines.
pub struct RemoteReceiver {
    stop: Arc<AtomicBool>,
    watchers: Vec<JoinHandle<()>>,
}

impl RemoteReceiver {
    /// Claim the receiver lines and start watching them
    ///
    /// `lines[i]` is the GPIO line of receiver channel `i`.
    pub fn start<L>(
        provider: &mut L,
        lines: &[u32; BUTTON_COUNT],
        dispatcher: Arc<InputDispatcher>,
    ) -> Result<Self, GpioError>
    where
        L: LineProvider,
        L::Edges: 'static,
    {
        let mut inputs = Vec::with_capacity(BUTTON_COUNT);
        for &line in lines {
            inputs.push(provider.claim_rising_edges(line, CONSUMER)?);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let watchers = inputs
            .into_iter()
            .enumerate()
            .map(|(channel, input)| {
                let stop = stop.clone();
                let dispatcher = dispatcher.clone();
                // BUTTON_COUNT fits in u8
                let pin = channel as u8;
                thread::spawn(move || watch(pin, input, &dispatcher, &stop))
            })
            .collect();

        debug!("Remote receiver watching lines {:?}", lines);
        Ok(Self { stop, watchers })
    }

    /// Stop the watchers and release the lines
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for watcher in self.watchers.drain(..) {
            if watcher.join().is_err() {
                warn!("Remote receiver watcher panicked");
            }
        }
    }
}

impl Drop for RemoteReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch<E: EdgeInput>(pin: u8, mut input: E, dispatcher: &InputDispatcher, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match input.wait_for_edge(EDGE_POLL) {
            Ok(true) => {
                dispatcher.handle_edge(pin, Instant::now());
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Receiver channel {} read failed: {}", pin, e);
                thread::sleep(EDGE_POLL);
            }
        }
    }
    trace!("Receiver channel {} watcher exiting", pin);
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_hal::OutputPin;
    use std::sync::mpsc;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn recorder(dispatcher: &InputDispatcher, target: Target, tag: &'static str) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        dispatcher
            .subscribe(target, move |e| sink.lock().unwrap().push(format!("{tag}:{}", e.pin)))
            .unwrap();
        log
    }

    #[test]
    fn test_debounce_window() {
        let dispatcher = InputDispatcher::new(DEBOUNCE);
        let log = recorder(&dispatcher, Target::Pin(3), "d");
        let t0 = Instant::now();

        assert!(dispatcher.handle_edge(3, t0));
        assert!(!dispatcher.handle_edge(3, t0 + Duration::from_millis(40)));
        assert!(dispatcher.handle_edge(3, t0 + Duration::from_millis(150)));

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_debounce_is_per_channel() {
        let dispatcher = InputDispatcher::new(DEBOUNCE);
        let t0 = Instant::now();

        assert!(dispatcher.handle_edge(0, t0));
        assert!(dispatcher.handle_edge(1, t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_wildcard_delivered_before_pin_subscribers() {
        let dispatcher = InputDispatcher::new(DEBOUNCE);
        let log = Arc::new(Mutex::new(Vec::new()));

        for (target, tag) in [
            (Target::Pin(2), "pin-first"),
            (Target::Any, "any-first"),
            (Target::Pin(2), "pin-second"),
            (Target::Any, "any-second"),
            (Target::Pin(1), "other"),
        ] {
            let sink = log.clone();
            dispatcher
                .subscribe(target, move |_| sink.lock().unwrap().push(tag))
                .unwrap();
        }

        dispatcher.handle_edge(2, Instant::now());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["any-first", "any-second", "pin-first", "pin-second"]
        );
    }

    #[test]
    fn test_invalid_subscription() {
        let dispatcher = InputDispatcher::new(DEBOUNCE);
        assert_eq!(
            dispatcher.subscribe(Target::Pin(4), |_| {}),
            Err(InputError::InvalidSubscription)
        );
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let dispatcher = InputDispatcher::new(DEBOUNCE);
        let log = Arc::new(Mutex::new(0));
        let sink = log.clone();
        let id = dispatcher
            .subscribe(Target::Any, move |_| *sink.lock().unwrap() += 1)
            .unwrap();

        dispatcher.unsubscribe(id);
        dispatcher.unsubscribe(id);
        dispatcher.handle_edge(0, Instant::now());

        assert_eq!(*log.lock().unwrap(), 0);
    }

    #[test]
    fn test_unknown_channel_ignored() {
        let dispatcher = InputDispatcher::new(DEBOUNCE);
        let log = recorder(&dispatcher, Target::Any, "any");
        assert!(!dispatcher.handle_edge(7, Instant::now()));
        assert!(log.lock().unwrap().is_empty());
    }

    /// Edge input fed from a channel; one message is one edge
    struct ScriptedEdges(mpsc::Receiver<()>);

    impl EdgeInput for ScriptedEdges {
        fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool, GpioError> {
            Ok(self.0.recv_timeout(timeout).is_ok())
        }
    }

    struct NullPin;

    impl OutputPin for NullPin {
        fn set_high(&mut self) {}
        fn set_low(&mut self) {}
    }

    struct ScriptedProvider {
        senders: Vec<(u32, mpsc::Sender<()>)>,
    }

    impl LineProvider for ScriptedProvider {
        type Output = NullPin;
        type Edges = ScriptedEdges;

        fn claim_output(&mut self, _line: u32, _consumer: &str) -> Result<NullPin, GpioError> {
            Ok(NullPin)
        }

        fn claim_rising_edges(&mut self, line: u32, _consumer: &str) -> Result<ScriptedEdges, GpioError> {
            let (tx, rx) = mpsc::channel();
            self.senders.push((line, tx));
            Ok(ScriptedEdges(rx))
        }
    }

    #[test]
    fn test_receiver_routes_lines_to_channels() {
        let dispatcher = Arc::new(InputDispatcher::new(DEBOUNCE));
        let (tx, rx) = mpsc::channel();
        dispatcher
            .subscribe(Target::Any, move |e| {
                let _ = tx.send(e.pin);
            })
            .unwrap();

        let mut provider = ScriptedProvider { senders: Vec::new() };
        let mut receiver = RemoteReceiver::start(&mut provider, &[7, 8, 15, 14], dispatcher).unwrap();

        let line_15 = provider.senders.iter().find(|(line, _)| *line == 15).unwrap();
        line_15.1.send(()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(2));
        receiver.stop();
    }
}
