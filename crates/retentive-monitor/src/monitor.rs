//! Sampling loop, thresholds, and alert fan-out

use crate::alert::{Alert, AlertLevel, Metric};
use crate::probe::{MemoryProbe, MemorySample};
use parking_lot::{Mutex, RwLock};
use retentive_core::config::MonitorSettings;
use retentive_core::{MemoryError, MemoryResult};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const HISTORY_LEN: usize = 100;
const TREND_WINDOW: usize = 10;
const MAX_ALERTS: usize = 50;
const MAX_CONSECUTIVE_FAILURES: u32 = 10;
const ALERT_QUEUE_CAP: usize = 64;

/// Fixed proportional shares of the heap ceiling for the secondary metrics
const EXTERNAL_SHARES: (f64, f64) = (0.30, 0.50);
const ARRAY_BUFFER_SHARES: (f64, f64) = (0.20, 0.30);

type Listener = Box<dyn Fn(&Alert) + Send + Sync>;

/// Byte thresholds derived from the configured heap ceiling
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub heap_warning: u64,
    pub heap_critical: u64,
    pub external_warning: u64,
    pub external_critical: u64,
    pub array_buffers_warning: u64,
    pub array_buffers_critical: u64,
}

impl Thresholds {
    fn derive(heap_ceiling_mb: u64, settings: &MonitorSettings) -> Self {
        let ceiling = heap_ceiling_mb as f64 * 1024.0 * 1024.0;
        Self {
            heap_warning: (ceiling * settings.warning_ratio) as u64,
            heap_critical: (ceiling * settings.critical_ratio) as u64,
            external_warning: (ceiling * EXTERNAL_SHARES.0) as u64,
            external_critical: (ceiling * EXTERNAL_SHARES.1) as u64,
            array_buffers_warning: (ceiling * ARRAY_BUFFER_SHARES.0) as u64,
            array_buffers_critical: (ceiling * ARRAY_BUFFER_SHARES.1) as u64,
        }
    }

    fn for_metric(&self, metric: Metric) -> (u64, u64) {
        match metric {
            Metric::HeapUsed => (self.heap_warning, self.heap_critical),
            Metric::External => (self.external_warning, self.external_critical),
            Metric::ArrayBuffers => (self.array_buffers_warning, self.array_buffers_critical),
            Metric::Sampler => (u64::MAX, u64::MAX),
        }
    }
}

/// Counters exposed for observability
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    pub samples_taken: u64,
    pub alerts_emitted: u64,
    pub dropped_alerts: u64,
    pub listener_failures: u64,
    pub reclaim_invocations: u64,
    pub consecutive_failures: u32,
    pub running: bool,
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

struct MonitorState {
    history: VecDeque<MemorySample>,
    alerts: VecDeque<Alert>,
    consecutive_failures: u32,
}

struct MonitorInner {
    settings: MonitorSettings,
    thresholds: Thresholds,
    heap_ceiling_bytes: u64,
    probe: Box<dyn MemoryProbe>,
    state: Mutex<MonitorState>,
    listeners: RwLock<Vec<(u64, Listener)>>,
    alert_tx: crossbeam_channel::Sender<Alert>,
    alert_rx: crossbeam_channel::Receiver<Alert>,
    delivery_lock: Mutex<()>,
    running: AtomicBool,
    next_listener_id: AtomicU64,
    samples_taken: AtomicU64,
    alerts_emitted: AtomicU64,
    dropped_alerts: AtomicU64,
    listener_failures: AtomicU64,
    reclaim_invocations: AtomicU64,
}

/// Process-wide memory watchdog
///
/// Construct one during bootstrap and share it; components must receive it
/// as an explicit dependency, not reach for a global.
pub struct MemoryMonitor {
    inner: Arc<MonitorInner>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    stop_tx: Mutex<Option<crossbeam_channel::Sender<()>>>,
}

impl MemoryMonitor {
    pub fn new(settings: MonitorSettings, heap_ceiling_mb: u64, probe: Box<dyn MemoryProbe>) -> Self {
        let settings = validate_settings(settings);
        let thresholds = Thresholds::derive(heap_ceiling_mb, &settings);
        let (alert_tx, alert_rx) = crossbeam_channel::bounded(ALERT_QUEUE_CAP);
        Self {
            inner: Arc::new(MonitorInner {
                settings,
                thresholds,
                heap_ceiling_bytes: heap_ceiling_mb * 1024 * 1024,
                probe,
                state: Mutex::new(MonitorState {
                    history: VecDeque::with_capacity(HISTORY_LEN),
                    alerts: VecDeque::with_capacity(MAX_ALERTS),
                    consecutive_failures: 0,
                }),
                listeners: RwLock::new(Vec::new()),
                alert_tx,
                alert_rx,
                delivery_lock: Mutex::new(()),
                running: AtomicBool::new(false),
                next_listener_id: AtomicU64::new(1),
                samples_taken: AtomicU64::new(0),
                alerts_emitted: AtomicU64::new(0),
                dropped_alerts: AtomicU64::new(0),
                listener_failures: AtomicU64::new(0),
                reclaim_invocations: AtomicU64::new(0),
            }),
            threads: Mutex::new(Vec::new()),
            stop_tx: Mutex::new(None),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.inner.thresholds
    }

    /// Begin background sampling; a second call warns and does nothing
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("memory monitor already started; ignoring");
            return;
        }
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        *self.stop_tx.lock() = Some(stop_tx);

        let interval = Duration::from_millis(self.inner.settings.interval_ms);
        let sampler = {
            let inner = Arc::clone(&self.inner);
            std::thread::spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        if !inner.running.load(Ordering::SeqCst) {
                            break;
                        }
                        tick(&inner);
                    }
                    _ => break,
                }
            })
        };

        let dispatcher = {
            let inner = Arc::clone(&self.inner);
            std::thread::spawn(move || loop {
                match inner.alert_rx.recv_timeout(Duration::from_millis(200)) {
                    Ok(alert) => deliver(&inner, &alert),
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                        if !inner.running.load(Ordering::SeqCst) {
                            break;
                        }
                    }
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                }
            })
        };

        let mut threads = self.threads.lock();
        threads.push(sampler);
        threads.push(dispatcher);
        tracing::info!(
            interval_ms = self.inner.settings.interval_ms,
            "memory monitor started"
        );
    }

    /// Halt sampling; after this returns, no listener will be called again
    pub fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.try_send(());
        }
        let handles: Vec<_> = self.threads.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
        tracing::info!("memory monitor stopped");
    }

    /// Run one sampling tick on the caller's thread
    pub fn tick_once(&self) -> Option<MemorySample> {
        tick(&self.inner)
    }

    /// Deliver any queued alerts on the caller's thread; returns the count
    ///
    /// Only needed when running without `start()` (tests, one-shot CLI).
    pub fn deliver_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(alert) = self.inner.alert_rx.try_recv() {
            deliver(&self.inner, &alert);
            delivered += 1;
        }
        delivered
    }

    /// Fresh reading from the probe
    pub fn current(&self) -> MemoryResult<MemorySample> {
        self.inner
            .probe
            .sample()
            .map_err(|e| MemoryError::SamplerFailure(e.to_string()))
    }

    /// Copy of the sample ring buffer, oldest first
    pub fn history(&self) -> Vec<MemorySample> {
        self.inner.state.lock().history.iter().cloned().collect()
    }

    /// Copy of retained alerts, oldest first
    pub fn alerts(&self) -> Vec<Alert> {
        self.inner.state.lock().alerts.iter().cloned().collect()
    }

    /// Signed byte delta of a metric over the last `window` samples; zero
    /// when there is not enough history
    pub fn trend(&self, metric: Metric, window: usize) -> i64 {
        let state = self.inner.state.lock();
        if window < 2 || state.history.len() < window {
            return 0;
        }
        let newest = state.history.back().unwrap().metric_value(metric);
        let oldest = state.history[state.history.len() - window].metric_value(metric);
        newest as i64 - oldest as i64
    }

    /// Default-window trend
    pub fn trend_default(&self, metric: Metric) -> i64 {
        self.trend(metric, TREND_WINDOW)
    }

    /// Register a listener invoked for every generated alert
    pub fn subscribe(&self, listener: impl Fn(&Alert) + Send + Sync + 'static) -> ListenerHandle {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.write().push((id, Box::new(listener)));
        ListenerHandle(id)
    }

    pub fn unsubscribe(&self, handle: ListenerHandle) {
        self.inner.listeners.write().retain(|(id, _)| *id != handle.0);
    }

    /// Ask the runtime to shed memory; reports whether a hook existed
    pub fn force_reclaim(&self) -> bool {
        let supported = self.inner.probe.force_reclaim();
        if supported {
            self.inner.reclaim_invocations.fetch_add(1, Ordering::SeqCst);
        }
        supported
    }

    /// Heap pressure: last sampled heap-used over the configured ceiling
    pub fn pressure(&self) -> f64 {
        let state = self.inner.state.lock();
        match state.history.back() {
            Some(sample) if self.inner.heap_ceiling_bytes > 0 => {
                sample.heap_used as f64 / self.inner.heap_ceiling_bytes as f64
            }
            _ => 0.0,
        }
    }

    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            samples_taken: self.inner.samples_taken.load(Ordering::SeqCst),
            alerts_emitted: self.inner.alerts_emitted.load(Ordering::SeqCst),
            dropped_alerts: self.inner.dropped_alerts.load(Ordering::SeqCst),
            listener_failures: self.inner.listener_failures.load(Ordering::SeqCst),
            reclaim_invocations: self.inner.reclaim_invocations.load(Ordering::SeqCst),
            consecutive_failures: self.inner.state.lock().consecutive_failures,
            running: self.inner.running.load(Ordering::SeqCst),
        }
    }
}

impl Drop for MemoryMonitor {
    fn drop(&mut self) {
        if self.inner.running.load(Ordering::SeqCst) {
            self.stop();
        }
    }
}

/// Warning must sit strictly below critical; bad ratios self-correct
fn validate_settings(mut settings: MonitorSettings) -> MonitorSettings {
    let defaults = MonitorSettings::default();
    let invalid = !(0.0..=1.0).contains(&settings.warning_ratio)
        || !(0.0..=1.0).contains(&settings.critical_ratio)
        || settings.warning_ratio >= settings.critical_ratio;
    if invalid {
        tracing::warn!(
            warning = settings.warning_ratio,
            critical = settings.critical_ratio,
            "invalid monitor thresholds; using defaults"
        );
        settings.warning_ratio = defaults.warning_ratio;
        settings.critical_ratio = defaults.critical_ratio;
    }
    if settings.interval_ms == 0 {
        tracing::warn!("monitor interval of 0 ms corrected to default");
        settings.interval_ms = defaults.interval_ms;
    }
    settings
}

fn tick(inner: &MonitorInner) -> Option<MemorySample> {
    let sample = match inner.probe.sample() {
        Ok(sample) => sample,
        Err(e) => {
            let failures = {
                let mut state = inner.state.lock();
                state.consecutive_failures += 1;
                state.consecutive_failures
            };
            tracing::warn!(failures, "memory sample failed: {e}");
            if failures >= MAX_CONSECUTIVE_FAILURES {
                let alert = Alert {
                    level: AlertLevel::Critical,
                    metric: Metric::Sampler,
                    value: failures as u64,
                    threshold: MAX_CONSECUTIVE_FAILURES as u64,
                    message: format!("sampler failed {failures} consecutive times; monitor stopping"),
                    timestamp: chrono::Utc::now(),
                };
                emit(inner, alert);
                inner.running.store(false, Ordering::SeqCst);
                tracing::error!("memory monitor stopped after repeated sampler failures");
            }
            return None;
        }
    };

    inner.samples_taken.fetch_add(1, Ordering::SeqCst);
    {
        let mut state = inner.state.lock();
        state.consecutive_failures = 0;
        state.history.push_back(sample.clone());
        while state.history.len() > HISTORY_LEN {
            state.history.pop_front();
        }
    }

    for metric in [Metric::HeapUsed, Metric::External, Metric::ArrayBuffers] {
        let value = sample.metric_value(metric);
        let (warning, critical) = inner.thresholds.for_metric(metric);
        // At or above critical the warning tier is suppressed for the tick.
        if value >= critical {
            emit(inner, Alert::new(AlertLevel::Critical, metric, value, critical));
            if inner.settings.enable_forced_reclaim {
                let supported = inner.probe.force_reclaim();
                if supported {
                    inner.reclaim_invocations.fetch_add(1, Ordering::SeqCst);
                }
                tracing::info!(metric = metric.name(), supported, "forced reclaim requested");
            }
        } else if value >= warning {
            emit(inner, Alert::new(AlertLevel::Warning, metric, value, warning));
        }
    }

    Some(sample)
}

fn emit(inner: &MonitorInner, alert: Alert) {
    tracing::debug!(metric = alert.metric.name(), ?alert.level, "alert generated");
    inner.alerts_emitted.fetch_add(1, Ordering::SeqCst);
    {
        let mut state = inner.state.lock();
        state.alerts.push_back(alert.clone());
        while state.alerts.len() > MAX_ALERTS {
            state.alerts.pop_front();
        }
    }
    // Fire-and-forget: a slow consumer drops the newest alert, counted.
    if inner.alert_tx.try_send(alert).is_err() {
        inner.dropped_alerts.fetch_add(1, Ordering::SeqCst);
    }
}

fn deliver(inner: &MonitorInner, alert: &Alert) {
    let _guard = inner.delivery_lock.lock();
    let listeners = inner.listeners.read();
    for (id, listener) in listeners.iter() {
        if catch_unwind(AssertUnwindSafe(|| listener(alert))).is_err() {
            inner.listener_failures.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(listener = *id, "alert listener panicked; swallowed");
        }
    }
}
