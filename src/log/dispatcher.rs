use std::{
    collections::HashMap,
    fmt,
    panic::Location,
    process,
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};

use crate::{
    diag_error, diag_warn,
    log::{
        adapter_registry::AdapterRegistry,
        caller_context,
        diag_sink::{DiagSink, StderrDiagSink},
        file_sink::FileSinkConfig,
        lock,
        log_envelope::LogEnvelope,
        log_error::LogError,
        log_level::LogLevel,
        log_sink::LogSink,
        sink_kind::SinkKind,
    },
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// How often a blocked `drain` re-checks whether the dispatcher was closed.
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Report a dropped-envelope diagnostic every this many drops.
const DROP_REPORT_EVERY: u64 = 1_000;

/// What `submit` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Block the caller until the loop frees a slot (back-pressure).
    #[default]
    Block,
    /// Evict the oldest queued envelope to make room.
    DropOldest,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "block" => Ok(Self::Block),
            "drop_oldest" => Ok(Self::DropOldest),
            other => Err(format!("unknown overflow policy: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,
    pub min_level: LogLevel,
    pub overflow: OverflowPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            min_level: LogLevel::Trace,
            overflow: OverflowPolicy::Block,
        }
    }
}

enum Command {
    Deliver(LogEnvelope),
    /// Barrier: acknowledged once every earlier envelope has been delivered.
    Drain(Sender<()>),
}

type SinkMap = HashMap<SinkKind, Arc<dyn LogSink>>;

/// Bounded, asynchronous fan-out logger.
///
/// # Architecture
///
/// 1. **Producers**: Application threads call `submit` or one of the level
///    helpers; filtering and caller-context capture happen on their thread.
/// 2. **Queue**: A bounded channel buffers envelopes. A separate quit channel
///    stops the loop, so the data queue is never closed under a producer.
/// 3. **Consumer**: A dedicated thread hands each envelope to every registered
///    sink in turn. A slow sink delays the others.
///
/// Delivery is at-most-once: envelopes still queued when `close` runs are lost
/// unless `drain` was called first.
pub struct Dispatcher {
    registry: AdapterRegistry,
    sinks: Arc<Mutex<SinkMap>>,
    min_level: AtomicU8,
    overflow: OverflowPolicy,
    tx: Sender<Command>,
    /// Extra receiver used only to evict under [`OverflowPolicy::DropOldest`].
    evict: Option<Receiver<Command>>,
    quit_tx: Sender<()>,
    closed: AtomicBool,
    dropped: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
    diag: Arc<dyn DiagSink>,
}

impl Dispatcher {
    /// Starts the delivery loop. No sinks are active until [`add_sink`](Self::add_sink).
    ///
    /// # Errors
    ///
    /// [`LogError::WorkerSpawn`] if the loop thread cannot be started.
    pub fn new(
        registry: AdapterRegistry,
        config: DispatcherConfig,
        diag: Arc<dyn DiagSink>,
    ) -> Result<Self, LogError> {
        let (tx, rx) = channel::bounded::<Command>(config.queue_capacity.max(1));
        let (quit_tx, quit_rx) = channel::bounded::<()>(1);
        let sinks: Arc<Mutex<SinkMap>> = Arc::default();

        let evict = match config.overflow {
            OverflowPolicy::Block => None,
            OverflowPolicy::DropOldest => Some(rx.clone()),
        };

        let worker_sinks = Arc::clone(&sinks);
        let worker_diag = Arc::clone(&diag);
        let worker = thread::Builder::new()
            .name("fanlog-dispatcher".into())
            .spawn(move || run(&rx, &quit_rx, &worker_sinks, worker_diag.as_ref()))
            .map_err(LogError::WorkerSpawn)?;

        Ok(Self {
            registry,
            sinks,
            min_level: AtomicU8::new(config.min_level as u8),
            overflow: config.overflow,
            tx,
            evict,
            quit_tx,
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            worker: Mutex::new(Some(worker)),
            diag,
        })
    }

    /// Default registry, default settings, console sink attached.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new) and [`add_sink`](Self::add_sink).
    pub fn with_console() -> Result<Self, LogError> {
        let diag: Arc<dyn DiagSink> = Arc::new(StderrDiagSink);
        let registry = AdapterRegistry::with_defaults(FileSinkConfig::default(), Arc::clone(&diag));
        let dispatcher = Self::new(registry, DispatcherConfig::default(), diag)?;
        dispatcher.add_sink(SinkKind::Console)?;
        Ok(dispatcher)
    }

    #[must_use]
    pub fn min_level(&self) -> LogLevel {
        let idx = usize::from(self.min_level.load(Ordering::Relaxed));
        LogLevel::ALL.get(idx).copied().unwrap_or(LogLevel::Fatal)
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Envelopes evicted under [`OverflowPolicy::DropOldest`].
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Kinds that currently have a live sink.
    #[must_use]
    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        lock(&self.sinks).keys().cloned().collect()
    }

    /// Builds a sink of `kind` and installs it.
    ///
    /// A live sink of the same kind is removed and closed before its
    /// replacement is built, so the two never hold the same file open at once.
    /// The sink map is only locked around the removal and the insertion;
    /// delivery carries on while the new sink is being built.
    ///
    /// # Errors
    ///
    /// [`LogError::UnknownSinkKind`] if `kind` is not in the registry; the
    /// current sink is left alone. [`LogError::SinkConstruction`] if building
    /// failed; the kind is then left without a sink.
    pub fn add_sink(&self, kind: SinkKind) -> Result<(), LogError> {
        if !self.registry.contains(&kind) {
            return Err(LogError::UnknownSinkKind(kind));
        }
        let previous = lock(&self.sinks).remove(&kind);
        if let Some(previous) = previous {
            previous.close();
        }
        let sink = self.registry.construct(&kind)?;
        // A concurrent add of the same kind may have landed meanwhile.
        let displaced = lock(&self.sinks).insert(kind, sink);
        if let Some(displaced) = displaced {
            displaced.close();
        }
        Ok(())
    }

    /// Closes and removes the sink of `kind`.
    ///
    /// # Errors
    ///
    /// [`LogError::SinkNotRegistered`] if no sink of that kind is active.
    pub fn remove_sink(&self, kind: &SinkKind) -> Result<(), LogError> {
        let removed = lock(&self.sinks)
            .remove(kind)
            .ok_or_else(|| LogError::SinkNotRegistered(kind.clone()))?;
        removed.close();
        Ok(())
    }

    /// Filters, enriches and enqueues one record.
    ///
    /// Records below [`min_level`](Self::min_level) are dropped silently.
    /// Caller context is attached from `Error` upwards; `skip` counts frames
    /// outward from the caller of this method.
    ///
    /// # Errors
    ///
    /// [`LogError::DispatcherClosed`] after [`close`](Self::close).
    #[track_caller]
    pub fn submit(
        &self,
        level: LogLevel,
        skip: usize,
        args: fmt::Arguments<'_>,
    ) -> Result<(), LogError> {
        self.enqueue(level, skip, args.to_string(), Location::caller())
    }

    #[track_caller]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.tagged(LogLevel::Trace, 0, args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.tagged(LogLevel::Debug, 0, args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.tagged(LogLevel::Info, 0, args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.tagged(LogLevel::Warn, 0, args);
    }

    #[track_caller]
    pub fn error(&self, skip: usize, args: fmt::Arguments<'_>) {
        self.tagged(LogLevel::Error, skip, args);
    }

    #[track_caller]
    pub fn critical(&self, skip: usize, args: fmt::Arguments<'_>) {
        self.tagged(LogLevel::Critical, skip, args);
    }

    /// Logs at `Fatal`, waits for everything queued so far to be delivered,
    /// flushes and closes, then exits the process with status 1.
    #[track_caller]
    pub fn fatal(&self, skip: usize, args: fmt::Arguments<'_>) -> ! {
        self.tagged(LogLevel::Fatal, skip, args);
        self.drain();
        self.flush();
        self.close();
        process::exit(1)
    }

    #[track_caller]
    fn tagged(&self, level: LogLevel, skip: usize, args: fmt::Arguments<'_>) {
        let text = format!("{}{args}", level.tag());
        let _ = self.enqueue(level, skip, text, Location::caller());
    }

    fn enqueue(
        &self,
        level: LogLevel,
        skip: usize,
        text: String,
        anchor: &Location<'_>,
    ) -> Result<(), LogError> {
        if level < self.min_level() {
            return Ok(());
        }
        if self.is_closed() {
            return Err(LogError::DispatcherClosed);
        }
        let text = caller_context::enrich(level, skip, text, anchor);
        self.send(Command::Deliver(LogEnvelope::new(skip, level, text.trim())))
    }

    fn send(&self, cmd: Command) -> Result<(), LogError> {
        match (&self.overflow, &self.evict) {
            (OverflowPolicy::DropOldest, Some(evict)) => self.send_evicting(cmd, evict),
            _ => self.tx.send(cmd).map_err(|_| LogError::DispatcherClosed),
        }
    }

    fn send_evicting(&self, mut cmd: Command, evict: &Receiver<Command>) -> Result<(), LogError> {
        loop {
            match self.tx.try_send(cmd) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(_)) => return Err(LogError::DispatcherClosed),
                Err(TrySendError::Full(back)) => {
                    cmd = back;
                    // An evicted barrier drops its ack, which releases its waiter.
                    if evict.try_recv().is_ok() {
                        let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        if n % DROP_REPORT_EVERY == 1 {
                            diag_warn!(self.diag, "queue full, dropped {n} envelope(s) so far");
                        }
                    }
                }
            }
        }
    }

    /// Waits for a free slot whatever the overflow policy; a barrier never
    /// evicts the envelopes it is meant to wait for.
    fn send_barrier(&self, mut cmd: Command) -> Result<(), LogError> {
        loop {
            match self.tx.send_timeout(cmd, DRAIN_POLL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) if !self.is_closed() => cmd = back,
                Err(_) => return Err(LogError::DispatcherClosed),
            }
        }
    }

    /// Blocks until every envelope enqueued before this call has been handed
    /// to the sinks, or the dispatcher is closed.
    pub fn drain(&self) {
        if self.is_closed() {
            return;
        }
        let (ack_tx, ack_rx) = channel::bounded::<()>(1);
        if self.send_barrier(Command::Drain(ack_tx)).is_err() {
            return;
        }
        loop {
            match ack_rx.recv_timeout(DRAIN_POLL) {
                Err(RecvTimeoutError::Timeout) if !self.is_closed() => continue,
                _ => return,
            }
        }
    }

    /// Flushes every registered sink. Queued envelopes are not drained.
    pub fn flush(&self) {
        for (kind, sink) in self.snapshot() {
            if let Err(e) = sink.flush() {
                diag_warn!(self.diag, "unable to flush {kind} sink: {e}");
            }
        }
    }

    /// Stops the loop after its current envelope, then closes and removes
    /// every sink. Further calls do nothing.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.quit_tx.try_send(());
        if let Some(worker) = lock(&self.worker).take() {
            if worker.join().is_err() {
                diag_error!(self.diag, "dispatcher loop panicked");
            }
        }
        let sinks: Vec<_> = lock(&self.sinks).drain().collect();
        for (_, sink) in sinks {
            sink.close();
        }
    }

    fn snapshot(&self) -> Vec<(SinkKind, Arc<dyn LogSink>)> {
        snapshot(&self.sinks)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("sinks", &self.sink_kinds())
            .field("min_level", &self.min_level())
            .field("overflow", &self.overflow)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn snapshot(sinks: &Mutex<SinkMap>) -> Vec<(SinkKind, Arc<dyn LogSink>)> {
    lock(sinks)
        .iter()
        .map(|(kind, sink)| (kind.clone(), Arc::clone(sink)))
        .collect()
}

fn run(
    rx: &Receiver<Command>,
    quit: &Receiver<()>,
    sinks: &Mutex<SinkMap>,
    diag: &dyn DiagSink,
) {
    loop {
        channel::select! {
            recv(quit) -> _ => return,
            recv(rx) -> cmd => match cmd {
                Ok(Command::Deliver(envelope)) => deliver(&envelope, sinks, diag),
                Ok(Command::Drain(ack)) => {
                    let _ = ack.send(());
                }
                Err(_) => return,
            },
        }
    }
}

fn deliver(envelope: &LogEnvelope, sinks: &Mutex<SinkMap>, diag: &dyn DiagSink) {
    for (kind, sink) in snapshot(sinks) {
        if let Err(e) = sink.write(&envelope.text, envelope.level) {
            diag_error!(diag, "unable to write to {kind} sink: {e}");
        }
    }
}
