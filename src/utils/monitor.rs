use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

/// Per-stage timing for one ETL invocation. A disabled monitor does nothing.
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    last_mark: Instant,
    #[cfg(feature = "cli")]
    process: Option<(Mutex<System>, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            last_mark: now,
            #[cfg(feature = "cli")]
            process: if enabled { process_handle() } else { None },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs the time spent since the previous mark and resets it.
    pub fn mark(&mut self, stage: &str) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        let spent = now.duration_since(self.last_mark);
        self.last_mark = now;

        match self.memory_mb() {
            Some(mb) => tracing::info!("📊 {} took {:?}, memory {}MB", stage, spent, mb),
            None => tracing::info!("📊 {} took {:?}", stage, spent),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_final_stats(&self) {
        if self.enabled {
            tracing::info!("📊 Total time: {:?}", self.elapsed());
        }
    }

    #[cfg(feature = "cli")]
    fn memory_mb(&self) -> Option<u64> {
        let (system, pid) = self.process.as_ref()?;
        let mut system = system.lock().ok()?;
        system.refresh_all();
        system.process(*pid).map(|p| p.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn memory_mb(&self) -> Option<u64> {
        None
    }
}

#[cfg(feature = "cli")]
fn process_handle() -> Option<(Mutex<System>, Pid)> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new_with_specifics(RefreshKind::everything());
    system.refresh_all();
    Some((Mutex::new(system), pid))
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
