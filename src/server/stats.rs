use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Minimal server-lifetime bookkeeping, kept separate from session counting
/// (which the accept loop's semaphore already enforces and the session
/// lifecycle macros already log) — this just answers "since when has the
/// proxy been up".
pub struct ProxyServerStats {
    is_started: AtomicBool,
    started_ts_millis: AtomicI64,
}

impl ProxyServerStats {
    pub fn new() -> ProxyServerStats {
        ProxyServerStats { is_started: AtomicBool::new(false), started_ts_millis: AtomicI64::new(0) }
    }

    pub fn on_server_started(&self) {
        assert!(!self.is_started.load(Ordering::Relaxed), "server shouldn't be started yet");
        self.started_ts_millis.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        self.is_started.store(true, Ordering::Relaxed);
    }

    pub fn on_server_finished(&self) {
        /* Not implemented */
    }

    pub fn is_server_started(&self) -> bool {
        self.is_started.load(Ordering::Relaxed)
    }

    pub fn get_uptime(&self) -> Duration {
        assert!(self.is_started.load(Ordering::Relaxed), "server should be already started");
        Utc::now() - self.get_started_utc_timestamp()
    }

    pub fn get_started_utc_timestamp(&self) -> DateTime<Utc> {
        assert!(self.is_started.load(Ordering::Relaxed), "server should be already started");
        DateTime::from_timestamp_millis(self.started_ts_millis.load(Ordering::Relaxed)).expect("valid datetime")
    }
}

impl Default for ProxyServerStats {
    fn default() -> Self {
        Self::new()
    }
}
