//! Shared collaborators for the integration tests

#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nebula_wiring::prelude::*;
use parking_lot::Mutex;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// In-memory sink for formatted log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Runs `f` with a thread-local subscriber writing into this buffer.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Lines at `level` (e.g. `"WARN"`) containing `needle`.
    pub fn lines_at(&self, level: &str, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|line| line.contains(level) && line.contains(needle))
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Handler that records every result it receives.
pub struct Recorder<T> {
    seen: Mutex<Vec<T>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<T> {
        self.seen.lock().clone()
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl<T: Clone + Send + 'static> ResultHandler<T> for Recorder<T> {
    fn handle_result(&self, result: &T) {
        self.seen.lock().push(result.clone());
    }
}

/// Handler that appends `"{tag}:{result}"` to a shared log.
pub fn tagged<T: std::fmt::Display + 'static>(
    tag: &'static str,
    log: &Arc<Mutex<Vec<String>>>,
) -> ResultHandlerRef<T> {
    let log = Arc::clone(log);
    Arc::new(move |result: &T| log.lock().push(format!("{tag}:{result}")))
}

/// Provider whose value can be changed between firings.
pub struct Settable<D> {
    value: Mutex<D>,
}

impl<D: Clone + Send + 'static> Settable<D> {
    pub fn new(value: D) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value),
        })
    }

    pub fn set(&self, value: D) {
        *self.value.lock() = value;
    }
}

impl<D: Clone + Send + 'static> DataProvider<D> for Settable<D> {
    fn data(&self) -> D {
        self.value.lock().clone()
    }
}

/// Records, into a shared log, the order in which collaborators are disposed.
#[derive(Clone, Default)]
pub struct DisposalLog(Arc<Mutex<Vec<&'static str>>>);

impl DisposalLog {
    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }

    fn push(&self, name: &'static str) {
        self.0.lock().push(name);
    }
}

/// A collaborator of every kind that logs its disposal under `name`.
pub struct Tracked {
    name: &'static str,
    log: DisposalLog,
    disposals: AtomicUsize,
    listeners: TriggerListeners,
}

impl Tracked {
    pub fn new(name: &'static str, log: &DisposalLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            disposals: AtomicUsize::new(0),
            listeners: TriggerListeners::new(),
        })
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    pub fn fire(&self) {
        self.listeners.fire(self);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Disposable for Tracked {
    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        self.log.push(self.name);
    }
}

impl Trigger for Tracked {
    fn add_trigger_listener(&self, listener: Arc<dyn TriggerListener>) {
        self.listeners.add(listener);
    }

    fn remove_trigger_listener(&self, listener: &Arc<dyn TriggerListener>) {
        self.listeners.remove(listener);
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl DataProvider<u32> for Tracked {
    fn data(&self) -> u32 {
        1
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl Rule<u32, bool> for Tracked {
    fn validate(&self, data: &u32) -> bool {
        *data > 0
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl ResultHandler<bool> for Tracked {
    fn handle_result(&self, _result: &bool) {}

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}
