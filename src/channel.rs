/// Channel hopping controller.
///
/// Cycles the radio through the 2.4 GHz channels in [`HOP_CHANNELS`] order
/// while periodically pulling a hop policy (enabled flag + dwell interval)
/// from a [`ConfigSource`]. Config failures fail open: before the first
/// successful fetch the compiled-in default applies, afterwards the last
/// known-good policy is kept. Radio failures are logged and skipped.
///
/// The loop body is [`ChannelHopper::step_at`], which is pure apart from the
/// two collaborators and is driven directly by tests. [`ChannelHopper::spawn`]
/// runs it on a dedicated thread that waits on a stop channel between hops.
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::defaults::{
    CONFIG_FETCH_TIMEOUT, CONFIG_REFRESH_PERIOD, DEFAULT_HOP_INTERVAL_MS, HOP_CHANNELS,
    MAX_HOP_INTERVAL_MS, MIN_HOP_INTERVAL_MS,
};
use crate::error::{ConfigError, RadioError, SnifferError};

const THREAD_NAME: &str = "chanhop";

// ── Policy ──────────────────────────────────────────────────────────

/// Active hop policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHopConfig {
    pub enabled: bool,
    /// Dwell time per channel, always within [50, 10000].
    pub interval_ms: u32,
}

impl ChannelHopConfig {
    pub const fn new() -> Self {
        Self {
            enabled: true,
            interval_ms: DEFAULT_HOP_INTERVAL_MS,
        }
    }

    /// Merge a fetched update. Absent fields leave the current value.
    pub fn apply(&mut self, update: &HopConfigUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(ms) = update.interval_ms {
            self.interval_ms = clamp_interval(ms);
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.interval_ms))
    }
}

impl Default for ChannelHopConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a requested interval into [50, 10000] ms.
pub fn clamp_interval(ms: i64) -> u32 {
    // Both bounds fit in u32, so the cast after clamping is lossless.
    ms.clamp(i64::from(MIN_HOP_INTERVAL_MS), i64::from(MAX_HOP_INTERVAL_MS)) as u32
}

/// A policy document as fetched; every field optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HopConfigUpdate {
    pub enabled: Option<bool>,
    /// Unclamped, may be out of range or negative.
    pub interval_ms: Option<i64>,
}

// ── Collaborators ───────────────────────────────────────────────────

/// Remote source of hop policy.
pub trait ConfigSource: Send + 'static {
    /// Fetch the current policy, giving up after `timeout`.
    fn fetch(&mut self, timeout: Duration) -> Result<HopConfigUpdate, ConfigError>;
}

/// Something that can retune the capture radio.
pub trait RadioController: Send + 'static {
    fn set_channel(&mut self, interface: &str, channel: u8) -> Result<(), RadioError>;
}

// ── Status ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopState {
    /// Created, not yet spawned.
    Idle,
    Running,
    /// Stop requested, waiting for the thread to exit.
    Stopping,
    Stopped,
}

/// Snapshot of the hopper as seen from outside its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopStatus {
    pub state: HopState,
    /// Last channel successfully tuned.
    pub channel: Option<u8>,
    pub config: ChannelHopConfig,
}

// ── Hopper ──────────────────────────────────────────────────────────

pub struct ChannelHopper<C, R> {
    interface: String,
    source: C,
    radio: R,
    config: ChannelHopConfig,
    /// At least one fetch has succeeded.
    configured: bool,
    last_refresh: Option<Instant>,
    index: usize,
    channel: Option<u8>,
}

impl<C: ConfigSource, R: RadioController> ChannelHopper<C, R> {
    pub fn new(interface: impl Into<String>, source: C, radio: R) -> Self {
        Self {
            interface: interface.into(),
            source,
            radio,
            config: ChannelHopConfig::new(),
            configured: false,
            last_refresh: None,
            index: 0,
            channel: None,
        }
    }

    pub fn config(&self) -> ChannelHopConfig {
        self.config
    }

    /// Last channel successfully tuned.
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    pub fn status(&self) -> HopStatus {
        HopStatus {
            state: HopState::Idle,
            channel: self.channel,
            config: self.config,
        }
    }

    /// Run one iteration at time `now`: refresh policy if due, hop if
    /// enabled, and return how long to wait before the next iteration.
    pub fn step_at(&mut self, now: Instant) -> Duration {
        let due = self
            .last_refresh
            .map_or(true, |last| now.saturating_duration_since(last) >= CONFIG_REFRESH_PERIOD);
        if due {
            self.refresh();
            self.last_refresh = Some(now);
        }

        if self.config.enabled {
            self.hop();
        }

        self.config.interval()
    }

    fn refresh(&mut self) {
        match self.source.fetch(CONFIG_FETCH_TIMEOUT) {
            Ok(update) => {
                let before = self.config;
                self.config.apply(&update);
                self.configured = true;
                if self.config != before {
                    log::info!(
                        "Channel hopping {} ({}ms)",
                        if self.config.enabled { "enabled" } else { "disabled" },
                        self.config.interval_ms
                    );
                }
            }
            Err(e) if self.configured => {
                log::debug!("Hop config fetch failed, keeping last policy: {e}");
            }
            Err(e) => {
                log::debug!("Hop config fetch failed, using defaults: {e}");
                self.config = ChannelHopConfig::new();
            }
        }
    }

    fn hop(&mut self) {
        let ch = HOP_CHANNELS[self.index];
        self.index = (self.index + 1) % HOP_CHANNELS.len();

        match self.radio.set_channel(&self.interface, ch) {
            Ok(()) => self.channel = Some(ch),
            Err(e) => log::debug!("Channel {ch} on {}: {e}", self.interface),
        }
    }

    /// Start hopping on a dedicated thread.
    pub fn spawn(self) -> Result<HopperHandle, SnifferError> {
        let mut hopper = self;
        let status = Arc::new(Mutex::new(HopStatus {
            state: HopState::Running,
            ..hopper.status()
        }));
        let shared = Arc::clone(&status);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || loop {
                let wait = hopper.step_at(Instant::now());
                {
                    let mut s = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    s.channel = hopper.channel;
                    s.config = hopper.config;
                }
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|source| SnifferError::Spawn {
                name: THREAD_NAME,
                source,
            })?;
        log::info!("Channel hop thread spawned");

        Ok(HopperHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
            status,
        })
    }
}

/// Owner's handle on a running hopper. Dropping it stops the hopper.
pub struct HopperHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
    status: Arc<Mutex<HopStatus>>,
}

impl HopperHandle {
    /// Stop the hopper and wait for its thread to exit. Idempotent.
    pub fn stop(&mut self) {
        let Some(tx) = self.stop_tx.take() else {
            return;
        };
        self.set_state(HopState::Stopping);
        // A send error means the thread is already gone.
        let _ = tx.send(());

        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::warn!("Channel hop thread panicked");
            }
        }
        self.set_state(HopState::Stopped);
        log::info!("Channel hopper stopped");
    }

    pub fn status(&self) -> HopStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_stopped(&self) -> bool {
        self.status().state == HopState::Stopped
    }

    fn set_state(&self, state: HopState) {
        self.status.lock().unwrap_or_else(PoisonError::into_inner).state = state;
    }
}

impl Drop for HopperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
