// src/scheduler/task.rs
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

/// One unit of periodic work. Implementations must contain their own errors.
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    async fn run(&self);

    fn name(&self) -> &'static str;
}

/// A named periodic task with explicit start/stop/is_running state.
///
/// The cycle is awaited inline, so at most one cycle is in flight; ticks that
/// fall due while a cycle is still running are skipped.
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    running: Arc<AtomicBool>,
    completed: Arc<AtomicU64>,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

/// Clears the running flag however the loop exits.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PeriodicTask {
    pub fn new(name: &'static str, period: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            name,
            period,
            running: Arc::new(AtomicBool::new(false)),
            completed: Arc::new(AtomicU64::new(0)),
            handle: Mutex::new(None),
            shutdown_tx,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cycles that finished, including ones that panicked.
    pub fn completed_cycles(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Spawns the loop unless one is already running or the period is zero.
    /// Returns whether it started.
    pub fn start(&self, first_delay: Duration, cycle: Arc<dyn Cycle>) -> bool {
        if self.period.is_zero() {
            error!(task = self.name, "Refusing to start with a zero period");
            return false;
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(task = self.name, "Already running, start ignored");
            return false;
        }

        self.shutdown_tx.send_replace(false);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let guard = RunningGuard(self.running.clone());
        let completed = self.completed.clone();
        let name = self.name;
        let period = self.period;

        info!(
            task = name,
            "Starting periodic task: first fire in {:?}, then every {:?}", first_delay, period
        );

        let handle = tokio::spawn(async move {
            let _guard = guard;

            tokio::select! {
                _ = sleep(first_delay) => {}
                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!(task = name, "Stopped before first fire");
                    return;
                }
            }

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let result = AssertUnwindSafe(cycle.run()).catch_unwind().await;
                        if let Err(panic) = result {
                            error!(task = name, "Cycle panicked: {}", panic_message(&*panic));
                        }
                        completed.fetch_add(1, Ordering::SeqCst);
                    }
                    _ = shutdown_requested(&mut shutdown_rx) => {
                        info!(task = name, "Periodic task shutting down");
                        break;
                    }
                }
            }
        });

        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    /// Signals the loop to exit after any in-flight cycle.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// `stop` and wait for the loop to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(task = self.name, "Task join error: {}", e);
            }
        }
    }
}

/// Resolves once shutdown is flagged or the sender is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        panic_on_first: bool,
        work: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl Cycle for Counting {
        async fn run(&self) {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.work.is_zero() {
                sleep(self.work).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panic_on_first && call == 0 {
                panic!("boom");
            }
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_delay_then_fixed_period() {
        let task = PeriodicTask::new("probe", Duration::from_secs(60));
        let cycle = Arc::new(Counting::default());
        assert!(task.start(Duration::from_secs(120), cycle.clone()));

        sleep(Duration::from_secs(119)).await;
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_ignored() {
        let task = PeriodicTask::new("render", Duration::from_secs(10));
        let cycle = Arc::new(Counting::default());

        assert!(task.start(Duration::ZERO, cycle.clone()));
        assert!(!task.start(Duration::ZERO, cycle.clone()));
        assert!(task.is_running());

        sleep(Duration::from_secs(25)).await;
        // 0s, 10s, 20s with a single timer
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_cycle_does_not_stop_task() {
        let task = PeriodicTask::new("render", Duration::from_secs(10));
        let cycle = Arc::new(Counting {
            panic_on_first: true,
            ..Default::default()
        });
        task.start(Duration::ZERO, cycle.clone());

        sleep(Duration::from_secs(25)).await;
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 3);
        assert_eq!(task.completed_cycles(), 3);
        assert!(task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycles_never_overlap() {
        let task = PeriodicTask::new("probe", Duration::from_secs(10));
        let cycle = Arc::new(Counting {
            work: Duration::from_secs(25),
            ..Default::default()
        });
        task.start(Duration::ZERO, cycle.clone());

        sleep(Duration::from_secs(100)).await;
        assert_eq!(cycle.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(cycle.calls.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_rejected() {
        let task = PeriodicTask::new("zero", Duration::ZERO);
        let cycle = Arc::new(Counting::default());

        assert!(!task.start(Duration::ZERO, cycle.clone()));
        assert!(!task.is_running());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 0);
        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_after_poisoned_handle_lock() {
        let task = Arc::new(PeriodicTask::new("probe", Duration::from_secs(10)));
        let cycle = Arc::new(Counting::default());
        assert!(task.start(Duration::ZERO, cycle.clone()));

        let poisoner = task.clone();
        let _ = std::thread::spawn(move || {
            let _slot = poisoner.handle.lock().unwrap();
            panic!("poison the handle lock");
        })
        .join();
        assert!(task.handle.is_poisoned());

        task.shutdown().await;
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let task = PeriodicTask::new("probe", Duration::from_secs(10));
        let cycle = Arc::new(Counting::default());
        task.start(Duration::from_secs(300), cycle.clone());

        task.shutdown().await;
        assert!(!task.is_running());
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 0);

        // can be started again once fully stopped
        assert!(task.start(Duration::ZERO, cycle.clone()));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 1);
    }
}
