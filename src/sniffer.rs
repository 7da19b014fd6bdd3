/// Sniffer coordinator: capture → parse → track → sink.
///
/// Frames are processed synchronously on the caller's thread, one at a
/// time and in delivery order. The channel hopper and the sink dispatcher
/// run on their own threads. Shutdown order is fixed: the capture loop
/// exits, the hopper is stopped and joined, the capture source is dropped,
/// and finally the sink queue is drained and flushed.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::channel::{ChannelHopper, ConfigSource, HopperHandle, RadioController};
use crate::comm::{self, Notification, Sink, SinkDispatcher};
use crate::defaults::{
    DLT_IEEE802_11_RADIO, MAX_APS, MAX_DEVICES, SINK_QUEUE_DEPTH, STATUS_INTERVAL,
};
use crate::elements::{Encryption, Ssid};
use crate::error::{CaptureError, Result, SnifferError};
use crate::mac::MacAddr;
use crate::protocol::{SnifferMessage, VERSION};
use crate::scanner::{parse_frame, FrameEvent};
use crate::tracker::{Admission, TrackingStore};

/// Runtime configuration for a [`Sniffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnifferConfig {
    /// Monitor-mode interface, used in log lines.
    pub interface: String,
    pub max_devices: usize,
    pub max_aps: usize,
    /// Sink notifications buffered before new ones are dropped.
    pub sink_queue: usize,
    pub status_interval: Duration,
}

impl SnifferConfig {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            max_devices: MAX_DEVICES,
            max_aps: MAX_APS,
            sink_queue: SINK_QUEUE_DEPTH,
            status_interval: STATUS_INTERVAL,
        }
    }
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self::new("wlan0mon")
    }
}

// ── Capture input ───────────────────────────────────────────────────

/// One captured frame, borrowed from the capture source.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub data: &'a [u8],
    /// Bytes actually captured.
    pub len: usize,
    /// Arrival time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Source of radiotap-wrapped 802.11 frames.
pub trait CaptureSource {
    /// pcap link-layer type of the frames this source delivers.
    fn link_type(&self) -> i32;

    /// Next frame. `Ok(None)` on read timeout; `Err(CaptureError::Closed)`
    /// once the source is exhausted.
    fn next_frame(&mut self) -> std::result::Result<Option<RawFrame<'_>>, CaptureError>;
}

// ── Statistics ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames delivered by the capture source.
    pub frames: u64,
    /// Malformed or untracked frames.
    pub ignored: u64,
    pub beacons: u64,
    pub probe_requests: u64,
    pub assoc_requests: u64,
    pub reassoc_requests: u64,
    pub disassocs: u64,
    pub deauths: u64,
    pub data_frames: u64,
    pub data_bytes: u64,
    /// Sightings of group (broadcast / multicast) addresses.
    pub group_addressed: u64,
    /// New addresses turned away by a full store.
    pub rejected: u64,
    /// Sink notifications dropped by a full queue.
    pub sink_dropped: u64,
}

impl CaptureStats {
    fn count(&mut self, event: &FrameEvent) {
        match event {
            FrameEvent::Beacon { .. } => self.beacons += 1,
            FrameEvent::ProbeRequest { .. } => self.probe_requests += 1,
            FrameEvent::AssocRequest { .. } => self.assoc_requests += 1,
            FrameEvent::ReassocRequest { .. } => self.reassoc_requests += 1,
            FrameEvent::Disassoc { .. } => self.disassocs += 1,
            FrameEvent::Deauth { .. } => self.deauths += 1,
            FrameEvent::DataFrame { byte_length } => {
                self.data_frames += 1;
                self.data_bytes += *byte_length as u64;
            }
        }
    }
}

// ── Pipeline ────────────────────────────────────────────────────────

/// Everything the per-frame path mutates, kept apart from the capture
/// source so a borrowed frame and the pipeline can be used together.
struct FramePipeline {
    store: TrackingStore,
    stats: CaptureStats,
    sink: SinkDispatcher,
}

impl FramePipeline {
    fn process(&mut self, frame: &RawFrame<'_>) {
        self.stats.frames += 1;

        let Some(event) = parse_frame(frame.data, frame.len) else {
            self.stats.ignored += 1;
            log::trace!("Ignored {}-byte frame", frame.len);
            return;
        };
        log::trace!("{} frame, {} bytes", event.as_str(), frame.len);
        self.stats.count(&event);

        let ts = frame.timestamp_ms;
        match event {
            FrameEvent::Beacon {
                bssid,
                ssid,
                channel,
                encryption,
                rssi,
            } => self.track_access_point(bssid, ts, rssi, &ssid, channel, encryption),
            FrameEvent::ProbeRequest { source, ssid, rssi } => {
                self.track_device(source, ts, rssi, ssid.as_ref())
            }
            FrameEvent::AssocRequest { source, rssi, .. }
            | FrameEvent::ReassocRequest { source, rssi } => {
                self.track_device(source, ts, rssi, None)
            }
            FrameEvent::Disassoc { .. }
            | FrameEvent::Deauth { .. }
            | FrameEvent::DataFrame { .. } => {}
        }
    }

    fn track_device(&mut self, mac: MacAddr, ts: u64, rssi: i8, probed: Option<&Ssid>) {
        if !mac.is_station() {
            self.stats.group_addressed += 1;
            return;
        }

        match self.store.record_device(mac, ts, rssi, probed) {
            Admission::Rejected => {
                self.stats.rejected += 1;
                log::debug!("Device table full, ignoring {mac}");
            }
            admission => {
                if admission.is_created() {
                    log::debug!("New device {mac} ({rssi} dBm)");
                }
                if let Some(dev) = self.store.device(&mac) {
                    self.sink.notify(Notification::Device(dev.clone()));
                }
            }
        }
    }

    fn track_access_point(
        &mut self,
        bssid: MacAddr,
        ts: u64,
        rssi: i8,
        ssid: &Ssid,
        channel: Option<u8>,
        encryption: Option<Encryption>,
    ) {
        if !bssid.is_station() {
            self.stats.group_addressed += 1;
            return;
        }

        match self
            .store
            .record_access_point(bssid, ts, rssi, ssid, channel, true)
        {
            Admission::Rejected => {
                self.stats.rejected += 1;
                log::debug!("AP table full, ignoring {bssid}");
            }
            admission => {
                if let Some(encryption) = encryption {
                    self.store.set_encryption(&bssid, encryption);
                }
                if admission.is_created() {
                    log::debug!("New AP {bssid} \"{ssid}\" ch {channel:?} ({rssi} dBm)");
                }
                if let Some(ap) = self.store.access_point(&bssid) {
                    self.sink.notify(Notification::AccessPoint(ap.clone()));
                }
            }
        }
    }
}

// ── Coordinator ─────────────────────────────────────────────────────

/// Cloneable handle that ends a running capture loop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request shutdown. Returns true only for the call that stopped it.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }

    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }
}

pub struct Sniffer<S> {
    capture: Option<S>,
    pipeline: FramePipeline,
    config: SnifferConfig,
    running: Arc<AtomicBool>,
}

impl<S: CaptureSource> Sniffer<S> {
    /// Validate the capture link type and start the sink dispatcher.
    pub fn new<K: Sink>(capture: S, sink: K, config: SnifferConfig) -> Result<Self> {
        let found = capture.link_type();
        if found != DLT_IEEE802_11_RADIO {
            return Err(SnifferError::WrongLinkType {
                found,
                expected: DLT_IEEE802_11_RADIO,
            });
        }

        let sink = SinkDispatcher::spawn(sink, config.sink_queue)?;
        Ok(Self {
            capture: Some(capture),
            pipeline: FramePipeline {
                store: TrackingStore::new(config.max_devices, config.max_aps),
                stats: CaptureStats::default(),
                sink,
            },
            config,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn store(&self) -> &TrackingStore {
        &self.pipeline.store
    }

    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            sink_dropped: self.pipeline.sink.dropped(),
            ..self.pipeline.stats
        }
    }

    pub fn config(&self) -> &SnifferConfig {
        &self.config
    }

    /// Capture until stopped or the source closes, without channel hopping.
    pub fn run(&mut self) -> Result<()> {
        self.run_inner(None)
    }

    /// Capture with `hopper` running alongside; it is stopped and joined
    /// before the capture source is released.
    pub fn run_with_hopper<C, R>(&mut self, hopper: ChannelHopper<C, R>) -> Result<()>
    where
        C: ConfigSource,
        R: RadioController,
    {
        if self.capture.is_none() {
            return Err(SnifferError::AlreadyStarted);
        }
        let handle = hopper.spawn()?;
        self.run_inner(Some(handle))
    }

    fn run_inner(&mut self, mut hopper: Option<HopperHandle>) -> Result<()> {
        let mut capture = self.capture.take().ok_or(SnifferError::AlreadyStarted)?;
        log::info!("Sniffer v{} capturing on {}", VERSION, self.config.interface);

        let started = Instant::now();
        let mut last_status = started;

        let result = loop {
            if !self.running.load(Ordering::Acquire) {
                break Ok(());
            }

            match capture.next_frame() {
                Ok(Some(frame)) => self.pipeline.process(&frame),
                Ok(None) => {}
                Err(CaptureError::Closed) => {
                    log::info!("Capture closed");
                    break Ok(());
                }
                Err(e) => break Err(SnifferError::from(e)),
            }

            if last_status.elapsed() >= self.config.status_interval {
                last_status = Instant::now();
                let channel = hopper.as_ref().and_then(|h| h.status().channel);
                self.log_status(true, started.elapsed(), channel);
            }
        };

        self.running.store(false, Ordering::Release);
        if let Some(h) = hopper.as_mut() {
            h.stop();
        }
        drop(capture);
        self.pipeline.sink.shutdown();

        self.log_status(false, started.elapsed(), None);
        result
    }

    fn log_status(&self, running: bool, uptime: Duration, channel: Option<u8>) {
        let stats = self.stats();
        let store = &self.pipeline.store;
        let msg = SnifferMessage::Status {
            running,
            uptime: uptime.as_secs(),
            frames: stats.frames,
            devices: store.device_count() as u32,
            access_points: store.ap_count() as u32,
            channel,
            version: VERSION,
        };
        if let Some(line) = comm::encode(&msg) {
            if let Ok(s) = core::str::from_utf8(&line) {
                log::info!("{}", s.trim_end());
            }
        }
        if stats.rejected > 0 || stats.sink_dropped > 0 {
            log::info!(
                "{} sightings rejected (store full), {} sink notifications dropped",
                stats.rejected,
                stats.sink_dropped
            );
        }
    }
}
