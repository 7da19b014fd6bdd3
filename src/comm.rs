/// Communication layer: NDJSON encoding, hop-config parsing, and sink dispatch.
///
/// Tracking updates leave the capture pipeline through a [`SinkDispatcher`],
/// a bounded queue drained by its own thread, so a slow or failing sink
/// never stalls frame processing. When the queue is full, notifications
/// are dropped and counted.
use std::io::Write;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use crate::channel::HopConfigUpdate;
use crate::elements::Encryption;
use crate::error::{ConfigError, SinkError, SnifferError};
use crate::protocol::{MsgBuffer, RawHopConfig, SnifferMessage, MAX_MSG_LEN};
use crate::tracker::{AccessPoint, Device};

const THREAD_NAME: &str = "sink";

/// Delivery failures logged at warn before dropping to debug.
const LOUD_FAILURES: u32 = 5;

// ── Serialization helpers ──────────────────────────────────────────────

/// Serialize a SnifferMessage to JSON bytes and write to the output buffer.
/// Returns the number of bytes written, or None if serialization failed.
pub fn serialize_message(msg: &SnifferMessage, buf: &mut [u8]) -> Option<usize> {
    match serde_json_core::to_slice(msg, buf) {
        Ok(len) => {
            // Append newline for NDJSON
            if len < buf.len() {
                buf[len] = b'\n';
                Some(len + 1)
            } else {
                Some(len)
            }
        }
        Err(_) => None,
    }
}

/// Serialize into a fresh fixed-capacity buffer.
pub fn encode(msg: &SnifferMessage) -> Option<MsgBuffer> {
    let mut buf = MsgBuffer::new();
    buf.resize_default(MAX_MSG_LEN).ok()?;
    let len = serialize_message(msg, &mut buf)?;
    buf.truncate(len);
    Some(buf)
}

/// Encode a device record as an NDJSON line.
pub fn encode_device(dev: &Device) -> Option<MsgBuffer> {
    let mac = dev.mac.to_mac_string();
    let probe = dev.probe_ssid.as_ref().map(|s| s.to_string_lossy());
    encode(&SnifferMessage::Device {
        mac_address: &mac,
        rssi: dev.rssi,
        probe_ssid: probe.as_deref(),
        vendor: dev.mac.vendor(),
        first_seen: dev.first_seen,
        last_seen: dev.last_seen,
        packet_count: dev.packet_count,
    })
}

/// Encode an access point record as an NDJSON line.
pub fn encode_access_point(ap: &AccessPoint) -> Option<MsgBuffer> {
    let bssid = ap.bssid.to_mac_string();
    let ssid = ap.ssid.to_string_lossy();
    encode(&SnifferMessage::AccessPoint {
        bssid: &bssid,
        ssid: &ssid,
        channel: ap.channel.unwrap_or(0),
        encryption: ap.encryption.map(Encryption::as_str),
        rssi: ap.rssi,
        first_seen: ap.first_seen,
        last_seen: ap.last_seen,
        beacon_count: ap.beacon_count,
    })
}

/// Parse a channel hopping policy document.
pub fn parse_hop_config(data: &[u8]) -> Result<HopConfigUpdate, ConfigError> {
    let trimmed = trim_trailing_whitespace(data);
    if trimmed.is_empty() {
        return Err(ConfigError::Malformed);
    }
    let (raw, _) = serde_json_core::from_slice::<RawHopConfig>(trimmed)
        .map_err(|_| ConfigError::Malformed)?;
    Ok(HopConfigUpdate {
        enabled: raw.enabled,
        interval_ms: raw.timeout_ms,
    })
}

fn trim_trailing_whitespace(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && data[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &data[..end]
}

// ── Sinks ──────────────────────────────────────────────────────────────

/// Downstream consumer of tracking updates.
pub trait Sink: Send + 'static {
    fn on_device_seen(&mut self, device: &Device) -> Result<(), SinkError>;
    fn on_ap_seen(&mut self, ap: &AccessPoint) -> Result<(), SinkError>;

    /// Called once after the last notification.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes every update as an NDJSON line to `W`.
pub struct NdjsonSink<W> {
    out: W,
}

impl<W: Write + Send + 'static> NdjsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: Option<MsgBuffer>) -> Result<(), SinkError> {
        let line = line.ok_or_else(|| SinkError::Delivery("message too large".into()))?;
        self.out
            .write_all(&line)
            .map_err(|e| SinkError::Delivery(e.to_string()))
    }
}

impl<W: Write + Send + 'static> Sink for NdjsonSink<W> {
    fn on_device_seen(&mut self, device: &Device) -> Result<(), SinkError> {
        self.write_line(encode_device(device))
    }

    fn on_ap_seen(&mut self, ap: &AccessPoint) -> Result<(), SinkError> {
        self.write_line(encode_access_point(ap))
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush().map_err(|e| SinkError::Delivery(e.to_string()))
    }
}

/// A queued tracking update.
#[derive(Debug, Clone)]
pub enum Notification {
    Device(Device),
    AccessPoint(AccessPoint),
}

/// Bounded, non-blocking hand-off to a [`Sink`] running on its own thread.
pub struct SinkDispatcher {
    tx: Option<SyncSender<Notification>>,
    join: Option<JoinHandle<()>>,
    dropped: u64,
}

impl SinkDispatcher {
    pub fn spawn<S: Sink>(sink: S, depth: usize) -> Result<Self, SnifferError> {
        let (tx, rx) = mpsc::sync_channel::<Notification>(depth.max(1));
        let join = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || sink_thread(sink, rx))
            .map_err(|source| SnifferError::Spawn {
                name: THREAD_NAME,
                source,
            })?;
        log::info!("Sink thread spawned");

        Ok(Self {
            tx: Some(tx),
            join: Some(join),
            dropped: 0,
        })
    }

    /// Queue a notification. Returns false if it was dropped.
    pub fn notify(&mut self, notification: Notification) -> bool {
        let Some(tx) = &self.tx else {
            self.dropped += 1;
            return false;
        };
        match tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                false
            }
        }
    }

    /// Notifications dropped because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Close the queue, let the worker drain it and flush the sink, then join.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        drop(self.tx.take());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::warn!("Sink thread panicked");
            }
        }
    }
}

impl Drop for SinkDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sink_thread<S: Sink>(mut sink: S, rx: Receiver<Notification>) {
    let mut failures: u32 = 0;

    while let Ok(notification) = rx.recv() {
        let result = match &notification {
            Notification::Device(dev) => sink.on_device_seen(dev),
            Notification::AccessPoint(ap) => sink.on_ap_seen(ap),
        };
        if let Err(e) = result {
            failures = failures.saturating_add(1);
            if failures <= LOUD_FAILURES {
                log::warn!("{e}");
            } else {
                log::debug!("{e}");
            }
        }
    }

    if let Err(e) = sink.flush() {
        log::warn!("Sink flush: {e}");
    }
    log::debug!("Sink thread exiting ({failures} delivery failures)");
}
