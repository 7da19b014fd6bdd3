/// Deduplicated, bounded store of observed stations and access points.
///
/// One entry per hardware address in each collection. Entries are created
/// on the first valid sighting and updated in place afterwards; nothing is
/// ever evicted. Once a collection reaches its cap, sightings of new
/// addresses are rejected while existing entries keep updating.
use std::collections::hash_map::{Entry, HashMap};

use crate::defaults::{MAX_APS, MAX_DEVICES};
use crate::elements::{Encryption, Ssid};
use crate::mac::MacAddr;

/// A client station seen transmitting probe / association requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub mac: MacAddr,
    /// Milliseconds since the Unix epoch.
    pub first_seen: u64,
    pub last_seen: u64,
    /// Most recent signal sample. -100 means never observed.
    pub rssi: i8,
    pub packet_count: u32,
    /// Most recently probed network name.
    pub probe_ssid: Option<Ssid>,
}

/// A network seen via beacons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub bssid: MacAddr,
    /// Empty for hidden networks.
    pub ssid: Ssid,
    pub channel: Option<u8>,
    /// Last advertised security, if any beacon carried full fixed fields.
    pub encryption: Option<Encryption>,
    pub first_seen: u64,
    pub last_seen: u64,
    pub rssi: i8,
    pub beacon_count: u32,
}

/// Outcome of recording a sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New entry added.
    Created,
    /// Existing entry refreshed.
    Updated,
    /// New address but the collection is full; nothing changed.
    Rejected,
}

impl Admission {
    pub fn is_created(self) -> bool {
        self == Admission::Created
    }

    pub fn is_rejected(self) -> bool {
        self == Admission::Rejected
    }
}

/// Refresh timing and signal, ignoring samples older than what we have.
fn touch(last_seen: &mut u64, rssi: &mut i8, ts: u64, sample: i8) {
    if ts >= *last_seen {
        *last_seen = ts;
        *rssi = sample;
    }
}

pub struct TrackingStore {
    devices: HashMap<MacAddr, Device>,
    access_points: HashMap<MacAddr, AccessPoint>,
    max_devices: usize,
    max_aps: usize,
}

impl TrackingStore {
    pub fn new(max_devices: usize, max_aps: usize) -> Self {
        Self {
            devices: HashMap::new(),
            access_points: HashMap::new(),
            max_devices,
            max_aps,
        }
    }

    /// Record a station sighting.
    ///
    /// `probed` replaces the stored network name only when it is non-empty.
    pub fn record_device(
        &mut self,
        mac: MacAddr,
        ts: u64,
        rssi: i8,
        probed: Option<&Ssid>,
    ) -> Admission {
        let probed = probed.filter(|s| !s.is_empty());
        let at_cap = self.devices.len() >= self.max_devices;

        match self.devices.entry(mac) {
            Entry::Occupied(mut slot) => {
                let dev = slot.get_mut();
                dev.packet_count = dev.packet_count.saturating_add(1);
                touch(&mut dev.last_seen, &mut dev.rssi, ts, rssi);
                if let Some(name) = probed {
                    dev.probe_ssid = Some(name.clone());
                }
                Admission::Updated
            }
            Entry::Vacant(_) if at_cap => Admission::Rejected,
            Entry::Vacant(slot) => {
                slot.insert(Device {
                    mac,
                    first_seen: ts,
                    last_seen: ts,
                    rssi,
                    packet_count: 1,
                    probe_ssid: probed.cloned(),
                });
                Admission::Created
            }
        }
    }

    /// Record an access point sighting.
    ///
    /// The beacon counter advances only when `beacon` is set. A hidden
    /// (empty) name or missing channel never overwrites a known one.
    pub fn record_access_point(
        &mut self,
        bssid: MacAddr,
        ts: u64,
        rssi: i8,
        ssid: &Ssid,
        channel: Option<u8>,
        beacon: bool,
    ) -> Admission {
        let at_cap = self.access_points.len() >= self.max_aps;

        match self.access_points.entry(bssid) {
            Entry::Occupied(mut slot) => {
                let ap = slot.get_mut();
                if beacon {
                    ap.beacon_count = ap.beacon_count.saturating_add(1);
                }
                touch(&mut ap.last_seen, &mut ap.rssi, ts, rssi);
                if !ssid.is_empty() {
                    ap.ssid = ssid.clone();
                }
                if channel.is_some() {
                    ap.channel = channel;
                }
                Admission::Updated
            }
            Entry::Vacant(_) if at_cap => Admission::Rejected,
            Entry::Vacant(slot) => {
                slot.insert(AccessPoint {
                    bssid,
                    ssid: ssid.clone(),
                    channel,
                    encryption: None,
                    first_seen: ts,
                    last_seen: ts,
                    rssi,
                    beacon_count: u32::from(beacon),
                });
                Admission::Created
            }
        }
    }

    /// Record the security an existing access point advertises.
    /// Returns false if the address is not tracked.
    pub fn set_encryption(&mut self, bssid: &MacAddr, encryption: Encryption) -> bool {
        match self.access_points.get_mut(bssid) {
            Some(ap) => {
                ap.encryption = Some(encryption);
                true
            }
            None => false,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn device(&self, mac: &MacAddr) -> Option<&Device> {
        self.devices.get(mac)
    }

    pub fn access_point(&self, bssid: &MacAddr) -> Option<&AccessPoint> {
        self.access_points.get(bssid)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn ap_count(&self) -> usize {
        self.access_points.len()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn access_points(&self) -> impl Iterator<Item = &AccessPoint> {
        self.access_points.values()
    }

    pub fn max_devices(&self) -> usize {
        self.max_devices
    }

    pub fn max_aps(&self) -> usize {
        self.max_aps
    }
}

impl Default for TrackingStore {
    fn default() -> Self {
        Self::new(MAX_DEVICES, MAX_APS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::RSSI_UNKNOWN;

    fn mac(last: u8) -> MacAddr {
        MacAddr([0x00, 0x18, 0x0A, 0x00, 0x00, last])
    }

    fn ssid(name: &str) -> Ssid {
        Ssid::from_bytes(name.as_bytes()).unwrap()
    }

    // ── Devices ─────────────────────────────────────────────────────

    #[test]
    fn first_sighting_creates_device() {
        let mut store = TrackingStore::default();
        let adm = store.record_device(mac(1), 1000, -60, Some(&ssid("HomeNet")));
        assert_eq!(adm, Admission::Created);

        let dev = store.device(&mac(1)).unwrap();
        assert_eq!(dev.first_seen, 1000);
        assert_eq!(dev.last_seen, 1000);
        assert_eq!(dev.rssi, -60);
        assert_eq!(dev.packet_count, 1);
        assert_eq!(dev.probe_ssid, Some(ssid("HomeNet")));
    }

    #[test]
    fn repeat_sighting_updates_in_place() {
        let mut store = TrackingStore::default();
        store.record_device(mac(1), 1000, -60, None);
        let adm = store.record_device(mac(1), 2000, -45, None);
        assert_eq!(adm, Admission::Updated);
        assert_eq!(store.device_count(), 1);

        let dev = store.device(&mac(1)).unwrap();
        assert_eq!(dev.first_seen, 1000);
        assert_eq!(dev.last_seen, 2000);
        assert_eq!(dev.rssi, -45);
        assert_eq!(dev.packet_count, 2);
    }

    #[test]
    fn out_of_order_sighting_keeps_timing() {
        let mut store = TrackingStore::default();
        store.record_device(mac(1), 5000, -50, None);
        store.record_device(mac(1), 4000, -90, None);

        let dev = store.device(&mac(1)).unwrap();
        assert_eq!(dev.last_seen, 5000);
        assert_eq!(dev.rssi, -50);
        assert_eq!(dev.packet_count, 2);
    }

    #[test]
    fn equal_timestamp_takes_latest_signal() {
        let mut store = TrackingStore::default();
        store.record_device(mac(1), 5000, -50, None);
        store.record_device(mac(1), 5000, -40, None);
        assert_eq!(store.device(&mac(1)).unwrap().rssi, -40);
    }

    #[test]
    fn wildcard_probe_keeps_known_name() {
        let mut store = TrackingStore::default();
        store.record_device(mac(1), 1, -60, Some(&ssid("Cafe")));
        store.record_device(mac(1), 2, -60, None);
        store.record_device(mac(1), 3, -60, Some(&Ssid::hidden()));
        assert_eq!(store.device(&mac(1)).unwrap().probe_ssid, Some(ssid("Cafe")));

        store.record_device(mac(1), 4, -60, Some(&ssid("Office")));
        assert_eq!(store.device(&mac(1)).unwrap().probe_ssid, Some(ssid("Office")));
    }

    #[test]
    fn device_cap_rejects_new_but_updates_existing() {
        let mut store = TrackingStore::new(3, MAX_APS);
        for i in 0..3 {
            assert!(store.record_device(mac(i), 1, -60, None).is_created());
        }
        assert!(store.record_device(mac(99), 1, -60, None).is_rejected());
        assert_eq!(store.device_count(), 3);
        assert!(store.device(&mac(99)).is_none());

        assert_eq!(store.record_device(mac(0), 2, -30, None), Admission::Updated);
        assert_eq!(store.device(&mac(0)).unwrap().packet_count, 2);
    }

    #[test]
    fn unknown_signal_sentinel() {
        let mut store = TrackingStore::default();
        store.record_device(mac(1), 1, RSSI_UNKNOWN, None);
        assert_eq!(store.device(&mac(1)).unwrap().rssi, -100);
    }

    #[test]
    fn packet_count_saturates() {
        let mut store = TrackingStore::default();
        store.record_device(mac(1), 1, -60, None);
        store.devices.get_mut(&mac(1)).unwrap().packet_count = u32::MAX;
        store.record_device(mac(1), 2, -60, None);
        assert_eq!(store.device(&mac(1)).unwrap().packet_count, u32::MAX);
    }

    // ── Access points ───────────────────────────────────────────────

    #[test]
    fn same_beacon_twice() {
        let mut store = TrackingStore::default();
        let name = ssid("Flux");
        assert!(store
            .record_access_point(mac(1), 1000, -42, &name, Some(6), true)
            .is_created());
        assert_eq!(store.access_point(&mac(1)).unwrap().beacon_count, 1);

        assert_eq!(
            store.record_access_point(mac(1), 1100, -44, &name, Some(6), true),
            Admission::Updated
        );
        let ap = store.access_point(&mac(1)).unwrap();
        assert_eq!(ap.beacon_count, 2);
        assert_eq!(ap.first_seen, 1000);
        assert_eq!(ap.last_seen, 1100);
        assert_eq!(ap.rssi, -44);
        assert_eq!(ap.ssid, name);
        assert_eq!(ap.channel, Some(6));
    }

    #[test]
    fn non_beacon_sighting_does_not_count() {
        let mut store = TrackingStore::default();
        store.record_access_point(mac(1), 1, -42, &Ssid::hidden(), None, false);
        assert_eq!(store.access_point(&mac(1)).unwrap().beacon_count, 0);
        store.record_access_point(mac(1), 2, -42, &Ssid::hidden(), None, false);
        assert_eq!(store.access_point(&mac(1)).unwrap().beacon_count, 0);
        assert_eq!(store.access_point(&mac(1)).unwrap().last_seen, 2);
    }

    #[test]
    fn hidden_beacon_does_not_erase_name_or_channel() {
        let mut store = TrackingStore::default();
        store.record_access_point(mac(1), 1, -42, &ssid("Flux"), Some(6), true);
        store.record_access_point(mac(1), 2, -42, &Ssid::hidden(), None, true);

        let ap = store.access_point(&mac(1)).unwrap();
        assert_eq!(ap.ssid, ssid("Flux"));
        assert_eq!(ap.channel, Some(6));
    }

    #[test]
    fn hidden_network_learns_name_later() {
        let mut store = TrackingStore::default();
        store.record_access_point(mac(1), 1, -42, &Ssid::hidden(), Some(1), true);
        assert!(store.access_point(&mac(1)).unwrap().ssid.is_hidden());
        store.record_access_point(mac(1), 2, -42, &ssid("Revealed"), Some(11), true);

        let ap = store.access_point(&mac(1)).unwrap();
        assert_eq!(ap.ssid, ssid("Revealed"));
        assert_eq!(ap.channel, Some(11));
    }

    #[test]
    fn encryption_follows_latest_beacon() {
        let mut store = TrackingStore::default();
        store.record_access_point(mac(1), 1, -42, &ssid("Flux"), Some(6), true);
        assert_eq!(store.access_point(&mac(1)).unwrap().encryption, None);

        assert!(store.set_encryption(&mac(1), Encryption::Wpa));
        store.record_access_point(mac(1), 2, -42, &ssid("Flux"), Some(6), true);
        assert_eq!(store.access_point(&mac(1)).unwrap().encryption, Some(Encryption::Wpa));

        assert!(store.set_encryption(&mac(1), Encryption::Wpa2));
        assert_eq!(store.access_point(&mac(1)).unwrap().encryption, Some(Encryption::Wpa2));
    }

    #[test]
    fn encryption_for_untracked_ap_is_ignored() {
        let mut store = TrackingStore::default();
        assert!(!store.set_encryption(&mac(9), Encryption::Open));
        assert_eq!(store.ap_count(), 0);
    }

    #[test]
    fn ap_cap_at_max_aps() {
        let mut store = TrackingStore::default();
        let name = ssid("net");
        for i in 0..MAX_APS {
            let bssid = MacAddr([0x02, 0, 0, 0, (i >> 8) as u8, i as u8]);
            assert!(store
                .record_access_point(bssid, 1, -50, &name, Some(1), true)
                .is_created());
        }
        assert_eq!(store.ap_count(), MAX_APS);

        let extra = MacAddr([0x02, 0xFF, 0, 0, 0, 0]);
        assert!(store
            .record_access_point(extra, 1, -50, &name, Some(1), true)
            .is_rejected());
        assert_eq!(store.ap_count(), MAX_APS);

        let first = MacAddr([0x02, 0, 0, 0, 0, 0]);
        assert_eq!(
            store.record_access_point(first, 2, -50, &name, Some(1), true),
            Admission::Updated
        );
        assert_eq!(store.access_point(&first).unwrap().beacon_count, 2);
    }

    #[test]
    fn collections_are_independent() {
        let mut store = TrackingStore::new(1, 1);
        store.record_device(mac(1), 1, -50, None);
        assert!(store
            .record_access_point(mac(1), 1, -50, &Ssid::hidden(), None, true)
            .is_created());
        assert_eq!(store.devices().count(), 1);
        assert_eq!(store.access_points().count(), 1);
        assert_eq!(store.max_devices(), 1);
        assert_eq!(store.max_aps(), 1);
    }
}
