use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::{task::JoinHandle, time};

const TICK: Duration = Duration::from_secs(1);

/// Countdown gating repeated generation requests.
///
/// Owns its ticking task: starting again replaces the running countdown,
/// and `stop` or dropping the cooldown cancels it.
#[derive(Debug, Default)]
pub struct Cooldown {
    remaining: Arc<AtomicU64>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    in_flight: AtomicBool,
}

/// Held while a generation runs. At most one exists per cooldown.
///
/// Dropping it without calling `finish` releases the gate without arming
/// the countdown.
#[derive(Debug)]
pub struct GenerationPermit<'a> {
    cooldown: &'a Cooldown,
}

impl GenerationPermit<'_> {
    /// Arms the countdown, then releases the gate.
    pub fn finish(self, seconds: u64) {
        self.cooldown.start(seconds);
    }
}

impl Drop for GenerationPermit<'_> {
    fn drop(&mut self) {
        self.cooldown.in_flight.store(false, Ordering::SeqCst);
    }
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the countdown. Must be called from within a tokio runtime.
    pub fn start(&self, seconds: u64) {
        self.stop();
        if seconds == 0 {
            return;
        }
        self.remaining.store(seconds, Ordering::SeqCst);

        let remaining = Arc::clone(&self.remaining);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                let left = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
                    .map(|previous| previous - 1)
                    .unwrap_or(0);
                if left == 0 {
                    break;
                }
            }
            log::debug!("Generation cooldown elapsed");
        });

        if let Ok(mut ticker) = self.ticker.lock() {
            *ticker = Some(handle);
        }
    }

    /// Claims the gate for one generation. Returns `None` while the
    /// countdown runs or another generation is still in flight.
    pub fn try_begin(&self) -> Option<GenerationPermit<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let permit = GenerationPermit { cooldown: self };
        if self.is_active() {
            return None;
        }
        Some(permit)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.remaining() > 0
    }

    /// Cancels the ticking task and clears the countdown.
    pub fn stop(&self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
        }
        self.remaining.store(0, Ordering::SeqCst);
    }
}

impl Drop for Cooldown {
    fn drop(&mut self) {
        self.stop();
    }
}
