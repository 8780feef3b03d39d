//! Parse scheduler: runs parses off the caller's thread.
//!
//! ```text
//!  request_parse(id) ──► flight record for id
//!                          running? ── yes ──► set rerun, Coalesced
//!                             │ no
//!                             ▼
//!                        spawn worker ──► parse ─► listeners ─► rerun set? ─► parse again
//!                                                               │ no
//!                                                               ▼
//!                                         provider.current() != id? ─► request_parse(current)
//! ```
//!
//! The caller never blocks: a request either starts a worker or marks the
//! running one for one more pass. At most one worker runs per identity;
//! different identities parse in parallel. Workers are detached and run to
//! completion.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHasher};
use smol_str::SmolStr;

use super::completion::{parsed_completion_items, CompletionItem};
use super::outline::{outline, OutlineItem};
use crate::base::constants::DEFAULT_DEBOUNCE;
use crate::parser::{parse, ParseEnvironment, ParseResult, ParsedItem};

/// Identity of a source (usually its path, or a buffer name).
pub type SourceId = SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    pub debounce: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Where the scheduler reads sources from.
pub trait SourceProvider: Send + Sync {
    /// Current text of a source; `None` when it is gone.
    fn text(&self, id: &str) -> Option<String>;

    /// File path used to resolve includes relative to the source.
    fn path(&self, _id: &str) -> Option<PathBuf> {
        None
    }

    /// The source the user is looking at now, if any.
    fn current(&self) -> Option<SourceId> {
        None
    }
}

/// Parse events. Result callbacks run on the worker thread, after the
/// parse has completed, in this order: completion items, outline items,
/// parser items; `on_end` follows them.
pub trait ParseListener: Send + Sync {
    fn on_start(&self, _id: &str) {}
    fn on_completion_items(&self, _id: &str, _items: &[CompletionItem]) {}
    fn on_outline_items(&self, _id: &str, _items: &[OutlineItem]) {}
    /// Errors, line info and items of the parse.
    fn on_parser_items(&self, _id: &str, _result: &ParseResult) {}
    fn on_end(&self, _id: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A worker was spawned
    Started,
    /// A worker for this identity is already running; it will parse once
    /// more after its current pass
    Coalesced,
}

/// Output of the last completed parse of one source.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub id: SourceId,
    pub result: ParseResult,
    /// Hash of the parsed text
    pub fingerprint: u64,
    pub completion_items: Vec<CompletionItem>,
    pub outline: Vec<OutlineItem>,
}

/// Fingerprint of a source text.
pub fn fingerprint(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Default)]
struct Flight {
    running: AtomicBool,
    rerun: AtomicBool,
}

/// Clears `running` if a worker unwinds, so the identity can be parsed again.
struct FlightGuard(Arc<Flight>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.running.store(false, Ordering::Release);
        }
    }
}

struct Inner {
    env: ParseEnvironment,
    provider: Arc<dyn SourceProvider>,
    config: SchedulerConfig,
    listeners: RwLock<Vec<Arc<dyn ParseListener>>>,
    flights: Mutex<FxHashMap<SourceId, Arc<Flight>>>,
    debounce: Mutex<FxHashMap<SourceId, u64>>,
    results: RwLock<FxHashMap<SourceId, Arc<ParsedSource>>>,
}

/// Schedules parses per source identity. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ParseScheduler {
    inner: Arc<Inner>,
}

impl ParseScheduler {
    pub fn new(env: ParseEnvironment, provider: Arc<dyn SourceProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                env,
                provider,
                config: SchedulerConfig::default(),
                listeners: RwLock::new(Vec::new()),
                flights: Mutex::new(FxHashMap::default()),
                debounce: Mutex::new(FxHashMap::default()),
                results: RwLock::new(FxHashMap::default()),
            }),
        }
    }

    /// Must be called before the scheduler is cloned or used.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.config = config,
            None => tracing::warn!("scheduler already shared, config ignored"),
        }
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn add_listener(&self, listener: Arc<dyn ParseListener>) {
        self.inner.listeners.write().push(listener);
    }

    /// Parse `id` on a worker. Never blocks.
    pub fn request_parse(&self, id: impl Into<SourceId>) -> RequestOutcome {
        Inner::request(&self.inner, id.into())
    }

    /// Parse `id` after the configured delay, unless another debounced
    /// request for `id` arrives meanwhile (the newest one wins).
    pub fn request_parse_debounced(&self, id: impl Into<SourceId>) {
        let id = id.into();
        let generation = {
            let mut pending = self.inner.debounce.lock();
            let generation = pending.entry(id.clone()).or_insert(0);
            *generation += 1;
            *generation
        };
        let inner = Arc::clone(&self.inner);
        let delay = inner.config.debounce;
        let spawned = thread::Builder::new()
            .name(format!("abl-debounce-{id}"))
            .spawn(move || {
                thread::sleep(delay);
                let latest = inner.debounce.lock().get(&id).copied();
                if latest == Some(generation) {
                    Inner::request(&inner, id);
                } else {
                    tracing::trace!(%id, generation, "debounced request superseded");
                }
            });
        if let Err(err) = spawned {
            tracing::warn!(%err, "could not start debounce timer");
        }
    }

    /// Last completed parse of `id`.
    pub fn results(&self, id: &str) -> Option<Arc<ParsedSource>> {
        self.inner.results.read().get(id).cloned()
    }

    /// Innermost scope item at a root-file line of the last parse of `id`.
    pub fn scope_of_line(&self, id: &str, line: u32) -> Option<ParsedItem> {
        self.results(id)?.result.scope_of_line(line).cloned()
    }

    /// A worker for `id` is running.
    pub fn is_parsing(&self, id: &str) -> bool {
        self.inner
            .flights
            .lock()
            .get(id)
            .is_some_and(|flight| flight.running.load(Ordering::Acquire))
    }

    /// Forget the results of `id`. Its flight is dropped too unless a
    /// worker is still running for it.
    pub fn remove(&self, id: &str) {
        self.inner.results.write().remove(id);
        self.inner.debounce.lock().remove(id);
        let mut flights = self.inner.flights.lock();
        if flights
            .get(id)
            .is_some_and(|flight| !flight.running.load(Ordering::Acquire))
        {
            flights.remove(id);
        }
    }
}

impl Inner {
    fn request(this: &Arc<Self>, id: SourceId) -> RequestOutcome {
        let flight = {
            let mut flights = this.flights.lock();
            let flight = Arc::clone(flights.entry(id.clone()).or_default());
            if flight
                .running
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                flight.rerun.store(true, Ordering::Release);
                tracing::debug!(%id, "parse already running, request coalesced");
                return RequestOutcome::Coalesced;
            }
            flight
        };

        let inner = Arc::clone(this);
        let worker_flight = Arc::clone(&flight);
        let worker_id = id.clone();
        let spawned = thread::Builder::new()
            .name(format!("abl-parse-{id}"))
            .spawn(move || inner.work(worker_id, worker_flight));
        match spawned {
            Ok(_) => {
                tracing::debug!(%id, "parse worker started");
                RequestOutcome::Started
            }
            Err(err) => {
                tracing::warn!(%id, %err, "could not start parse worker");
                flight.running.store(false, Ordering::Release);
                RequestOutcome::Coalesced
            }
        }
    }

    /// Worker body: parse until no rerun is pending, then release the
    /// flight and follow the provider's current source.
    fn work(self: Arc<Self>, id: SourceId, flight: Arc<Flight>) {
        let _guard = FlightGuard(Arc::clone(&flight));
        loop {
            flight.rerun.store(false, Ordering::Release);
            self.parse_once(&id);
            if flight.rerun.load(Ordering::Acquire) {
                continue;
            }
            flight.running.store(false, Ordering::Release);
            // A request may have set `rerun` between the check and the store.
            let reclaimed = flight.rerun.load(Ordering::Acquire) && self.reclaim(&id, &flight);
            if !reclaimed {
                break;
            }
        }

        if let Some(current) = self.provider.current()
            && current != id
            && !self.is_fresh(&current)
        {
            tracing::debug!(parsed = %id, %current, "current source changed during parse");
            Self::request(&self, current);
        }
    }

    fn parse_once(&self, id: &SourceId) {
        let listeners: Vec<Arc<dyn ParseListener>> = self.listeners.read().clone();
        for listener in &listeners {
            listener.on_start(id);
        }

        if let Some(text) = self.provider.text(id) {
            let path = self.provider.path(id);
            let result = parse(&text, path.as_deref(), &self.env);
            let parsed = Arc::new(ParsedSource {
                id: id.clone(),
                completion_items: parsed_completion_items(&result),
                outline: outline(&result),
                fingerprint: fingerprint(&text),
                result,
            });
            tracing::debug!(
                %id,
                items = parsed.result.items.len(),
                errors = parsed.result.errors.len(),
                "parse finished"
            );
            self.results.write().insert(id.clone(), Arc::clone(&parsed));

            for listener in &listeners {
                listener.on_completion_items(id, &parsed.completion_items);
            }
            for listener in &listeners {
                listener.on_outline_items(id, &parsed.outline);
            }
            for listener in &listeners {
                listener.on_parser_items(id, &parsed.result);
            }
        } else {
            tracing::debug!(%id, "source not available, nothing parsed");
        }

        for listener in &listeners {
            listener.on_end(id);
        }
    }

    /// Take `flight` back for another pass, unless it was removed or a new
    /// request already started a worker for it.
    fn reclaim(&self, id: &str, flight: &Arc<Flight>) -> bool {
        let flights = self.flights.lock();
        flights.get(id).is_some_and(|current| Arc::ptr_eq(current, flight))
            && flight
                .running
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// The stored results of `id` match its current text.
    fn is_fresh(&self, id: &str) -> bool {
        let Some(stored) = self.results.read().get(id).map(|parsed| parsed.fingerprint) else {
            return false;
        };
        self.provider
            .text(id)
            .is_some_and(|text| fingerprint(&text) == stored)
    }
}
