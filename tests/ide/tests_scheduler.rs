//! ParseScheduler behaviour across threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use abl::ide::{CompletionItem, OutlineItem, ParseListener, ParseScheduler, RequestOutcome, SourceProvider};
use abl::parser::{ParseEnvironment, ParseResult};

use crate::helpers::init_tracing;
use crate::helpers::source_fixtures::PROCEDURE_FILE;

const WAIT: Duration = Duration::from_secs(5);

/// Serves one text for every id. The first read of `gated` reports that it
/// started, then waits for the test to open the gate.
struct GatedProvider {
    text: String,
    gated: &'static str,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    delay: Duration,
}

/// Test side of the gate.
struct Gate {
    entered: Receiver<()>,
    open: Sender<()>,
}

impl GatedProvider {
    fn new(text: &str, gated: &'static str) -> (Self, Gate) {
        let (open, gate) = mpsc::channel();
        let (enter, entered) = mpsc::channel();
        let provider = Self {
            text: text.to_string(),
            gated,
            gate: Mutex::new(Some((enter, gate))),
            delay: Duration::ZERO,
        };
        (provider, Gate { entered, open })
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl SourceProvider for GatedProvider {
    fn text(&self, id: &str) -> Option<String> {
        if id == self.gated {
            let gate = self.gate.lock().unwrap().take();
            if let Some((enter, gate)) = gate {
                let _ = enter.send(());
                let _ = gate.recv_timeout(WAIT);
            }
        }
        thread::sleep(self.delay);
        Some(self.text.clone())
    }
}

/// Tracks concurrent parses and reports each finished one.
struct Tracker {
    active: AtomicUsize,
    max_active: AtomicUsize,
    events: Mutex<Vec<String>>,
    done: Mutex<Sender<String>>,
}

impl Tracker {
    fn new() -> (Arc<Self>, Receiver<String>) {
        let (done, finished) = mpsc::channel();
        let tracker = Self {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            done: Mutex::new(done),
        };
        (Arc::new(tracker), finished)
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ParseListener for Tracker {
    fn on_start(&self, id: &str) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.record(format!("start {id}"));
    }

    fn on_completion_items(&self, id: &str, items: &[CompletionItem]) {
        self.record(format!("completion {id} {}", items.len()));
    }

    fn on_outline_items(&self, id: &str, items: &[OutlineItem]) {
        self.record(format!("outline {id} {}", items.len()));
    }

    fn on_parser_items(&self, id: &str, result: &ParseResult) {
        self.record(format!("items {id} {}", result.items.len()));
    }

    fn on_end(&self, id: &str) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.record(format!("end {id}"));
        let _ = self.done.lock().unwrap().send(id.to_string());
    }
}

fn wait_idle(scheduler: &ParseScheduler, id: &str) {
    let deadline = Instant::now() + WAIT;
    while scheduler.is_parsing(id) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!scheduler.is_parsing(id));
}

#[test]
fn test_requests_during_a_parse_coalesce_into_one_rerun() {
    init_tracing();
    let (provider, gate) = GatedProvider::new(PROCEDURE_FILE, "orders.p");
    let scheduler = ParseScheduler::new(ParseEnvironment::default(), Arc::new(provider));
    let (tracker, finished) = Tracker::new();
    scheduler.add_listener(tracker.clone());

    assert_eq!(scheduler.request_parse("orders.p"), RequestOutcome::Started);
    gate.entered.recv_timeout(WAIT).unwrap();
    assert_eq!(scheduler.request_parse("orders.p"), RequestOutcome::Coalesced);
    assert_eq!(scheduler.request_parse("orders.p"), RequestOutcome::Coalesced);
    assert!(scheduler.is_parsing("orders.p"));

    gate.open.send(()).unwrap();
    assert_eq!(finished.recv_timeout(WAIT).unwrap(), "orders.p");
    assert_eq!(finished.recv_timeout(WAIT).unwrap(), "orders.p");
    assert!(finished.recv_timeout(Duration::from_millis(300)).is_err());

    assert_eq!(tracker.max_active.load(Ordering::SeqCst), 1);
    wait_idle(&scheduler, "orders.p");
    assert!(scheduler.results("orders.p").is_some());
}

#[test]
fn test_different_sources_parse_in_parallel() {
    init_tracing();
    let (provider, _gate) = GatedProvider::new(PROCEDURE_FILE, "none");
    let provider = provider.with_delay(Duration::from_millis(300));
    let scheduler = ParseScheduler::new(ParseEnvironment::default(), Arc::new(provider));
    let (tracker, finished) = Tracker::new();
    scheduler.add_listener(tracker.clone());

    assert_eq!(scheduler.request_parse("a.p"), RequestOutcome::Started);
    assert_eq!(scheduler.request_parse("b.p"), RequestOutcome::Started);
    let mut ended = vec![finished.recv_timeout(WAIT).unwrap(), finished.recv_timeout(WAIT).unwrap()];
    ended.sort();
    assert_eq!(ended, vec!["a.p", "b.p"]);
    assert_eq!(tracker.max_active.load(Ordering::SeqCst), 2);
}

#[test]
fn test_listener_callback_order() {
    let (provider, _gate) = GatedProvider::new(PROCEDURE_FILE, "none");
    let scheduler = ParseScheduler::new(ParseEnvironment::default(), Arc::new(provider));
    let (tracker, finished) = Tracker::new();
    scheduler.add_listener(tracker.clone());

    scheduler.request_parse("orders.p");
    finished.recv_timeout(WAIT).unwrap();

    let events = tracker.events.lock().unwrap().clone();
    let steps: Vec<&str> = events.iter().map(|e| e.split(' ').next().unwrap()).collect();
    assert_eq!(steps, vec!["start", "completion", "outline", "items", "end"]);

    let parsed = scheduler.results("orders.p").unwrap();
    assert_eq!(events[1], format!("completion orders.p {}", parsed.completion_items.len()));
    assert_eq!(events[3], format!("items orders.p {}", parsed.result.items.len()));
}

#[test]
fn test_scope_of_line_after_parse() {
    let (provider, _gate) = GatedProvider::new(PROCEDURE_FILE, "none");
    let scheduler = ParseScheduler::new(ParseEnvironment::default(), Arc::new(provider));
    let (tracker, finished) = Tracker::new();
    scheduler.add_listener(tracker);

    assert!(scheduler.scope_of_line("orders.p", 11).is_none());
    scheduler.request_parse("orders.p");
    finished.recv_timeout(WAIT).unwrap();

    let scope = scheduler.scope_of_line("orders.p", 11).unwrap();
    assert_eq!(scope.name, "loadOrders");
    let scope = scheduler.scope_of_line("orders.p", 18).unwrap();
    assert_eq!(scope.name, "logCount");

    scheduler.remove("orders.p");
    assert!(scheduler.results("orders.p").is_none());
}
