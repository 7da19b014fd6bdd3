/// Compiled-in constants for frame parsing, tracking, and channel hopping.
///
/// Runtime-tunable values (store caps, sink queue depth) have their defaults
/// here and are overridden through `SnifferConfig`.
use core::time::Duration;

// ── Frame layout ────────────────────────────────────────────────────

/// Fixed radiotap prefix: version, pad, length (u16), first present word (u32).
pub const RADIOTAP_MIN_LEN: usize = 8;

/// FC + duration + addr1 + addr2 + addr3 + sequence control.
pub const MAC_HEADER_LEN: usize = 24;

/// Timestamp (8) + beacon interval (2) + capability info (2).
pub const BEACON_FIXED_LEN: usize = 12;

/// Longest SSID an information element may carry.
pub const MAX_SSID_LEN: usize = 32;

/// Signal strength reported when the radiotap header carries none.
pub const RSSI_UNKNOWN: i8 = -100;

/// pcap link-layer type for radiotap-wrapped 802.11.
pub const DLT_IEEE802_11_RADIO: i32 = 127;

// ── Tracking store ──────────────────────────────────────────────────

/// Default cap on distinct tracked stations.
pub const MAX_DEVICES: usize = 10_000;

/// Default cap on distinct tracked access points.
pub const MAX_APS: usize = 1_000;

// ── Channel hopping ─────────────────────────────────────────────────

/// Hop order: non-overlapping 2.4 GHz channels first, remainder filling in.
/// Full cycle: 11 channels × 300ms = 3.3s at the default interval.
pub static HOP_CHANNELS: &[u8] = &[1, 6, 11, 2, 7, 3, 8, 4, 9, 5, 10];

pub const DEFAULT_HOP_INTERVAL_MS: u32 = 300;
pub const MIN_HOP_INTERVAL_MS: u32 = 50;
pub const MAX_HOP_INTERVAL_MS: u32 = 10_000;

/// How often the hopper asks the config source for a new policy.
pub const CONFIG_REFRESH_PERIOD: Duration = Duration::from_secs(5);

/// Upper bound on a single config fetch.
pub const CONFIG_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

// ── Coordinator ─────────────────────────────────────────────────────

/// Sink notifications buffered before new ones are dropped.
pub const SINK_QUEUE_DEPTH: usize = 256;

/// Interval between capture statistics log lines.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for ingestion POSTs made by HTTP sinks.
pub const SINK_POST_TIMEOUT: Duration = Duration::from_secs(2);

// ── Vendor OUIs ─────────────────────────────────────────────────────

/// Common vendor OUI prefixes (3-byte prefix, vendor name).
///
/// Deliberately small: enough to label the usual suspects in a capture.
/// Randomized (locally administered) addresses never match.
pub static VENDOR_OUIS: &[([u8; 3], &str)] = &[
    // === Apple ===
    ([0x00, 0x03, 0x93], "Apple"),
    ([0x00, 0x1B, 0x63], "Apple"),
    ([0x00, 0x1E, 0xC2], "Apple"),
    // === Google / Nest ===
    ([0x00, 0x1A, 0x11], "Google"),
    ([0x3C, 0x5A, 0xB4], "Google"),
    ([0xF4, 0xF5, 0xD8], "Google"),
    ([0x18, 0xB4, 0x30], "Nest Labs"),
    // === Amazon ===
    ([0x44, 0x65, 0x0D], "Amazon"),
    // === Samsung ===
    ([0x00, 0x16, 0x6C], "Samsung"),
    // === Intel ===
    ([0x00, 0x13, 0xE8], "Intel"),
    ([0x00, 0x1B, 0x21], "Intel"),
    // === Microsoft ===
    ([0x00, 0x50, 0xF2], "Microsoft"),
    ([0x00, 0x15, 0x5D], "Microsoft"),
    // === Network gear ===
    ([0x00, 0x0F, 0xB5], "Netgear"),
    ([0x00, 0x14, 0x6C], "Netgear"),
    ([0x00, 0x18, 0x0A], "Cisco Meraki"),
    ([0x50, 0xC7, 0xBF], "TP-Link"),
    // === Embedded ===
    ([0xB8, 0x27, 0xEB], "Raspberry Pi"),
    ([0xDC, 0xA6, 0x32], "Raspberry Pi"),
    ([0xE4, 0x5F, 0x01], "Raspberry Pi"),
    ([0x24, 0x0A, 0xC4], "Espressif"),
    ([0x30, 0xAE, 0xA4], "Espressif"),
    ([0x24, 0x6F, 0x28], "Espressif"),
    // === Virtual ===
    ([0x00, 0x0C, 0x29], "VMware"),
    ([0x00, 0x50, 0x56], "VMware"),
    ([0x08, 0x00, 0x27], "VirtualBox"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_channels_cover_2g4_once() {
        let mut seen = [false; 12];
        for &ch in HOP_CHANNELS {
            assert!((1..=11).contains(&ch), "channel {ch} outside 1..=11");
            assert!(!seen[ch as usize], "channel {ch} listed twice");
            seen[ch as usize] = true;
        }
        assert_eq!(HOP_CHANNELS.len(), 11);
        assert_eq!(&HOP_CHANNELS[..3], &[1, 6, 11]);
    }

    #[test]
    fn default_interval_within_bounds() {
        assert!(MIN_HOP_INTERVAL_MS <= DEFAULT_HOP_INTERVAL_MS);
        assert!(DEFAULT_HOP_INTERVAL_MS <= MAX_HOP_INTERVAL_MS);
    }

    #[test]
    fn vendor_ouis_are_globally_administered() {
        for (oui, vendor) in VENDOR_OUIS {
            assert_eq!(oui[0] & 0x03, 0, "{vendor} OUI has local/multicast bits set");
        }
    }
}
