/// JSON wire formats shared with the ingestion API.
///
/// Outbound sink messages are newline-delimited JSON (NDJSON) whose field
/// names match the `/ingest/device` and `/ingest/access-point` endpoints.
/// Inbound hop policy is the `/config/channel-hopping` document.
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

/// Maximum length for MAC address strings ("aa:bb:cc:dd:ee:ff")
pub type MacString = String<18>;

/// Messages sent from the sniffer to a sink
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum SnifferMessage<'a> {
    /// Station sighting (probe / association / reassociation request)
    #[serde(rename = "device")]
    Device {
        mac_address: &'a str,
        rssi: i8,
        /// Most recently probed network name, omitted if never probed
        #[serde(skip_serializing_if = "Option::is_none")]
        probe_ssid: Option<&'a str>,
        /// OUI vendor name, omitted if unknown or randomized
        #[serde(skip_serializing_if = "Option::is_none")]
        vendor: Option<&'static str>,
        /// Milliseconds since the Unix epoch
        first_seen: u64,
        last_seen: u64,
        packet_count: u32,
    },
    /// Access point beacon
    #[serde(rename = "access_point")]
    AccessPoint {
        bssid: &'a str,
        /// Empty for hidden networks
        ssid: &'a str,
        /// 0 when the beacon carried no DS Parameter Set
        channel: u8,
        /// "Open", "WEP", "WPA" or "WPA2", omitted if never classified
        #[serde(skip_serializing_if = "Option::is_none")]
        encryption: Option<&'static str>,
        rssi: i8,
        first_seen: u64,
        last_seen: u64,
        beacon_count: u32,
    },
    /// Periodic sniffer status report
    #[serde(rename = "status")]
    Status {
        running: bool,
        /// Uptime in seconds
        uptime: u64,
        /// Frames delivered by the capture source
        frames: u64,
        devices: u32,
        access_points: u32,
        /// Last channel the hopper tuned to
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Option<u8>,
        version: &'static str,
    },
}

/// Wire format for the channel hopping policy document.
///
/// Every field is optional: an absent field leaves the current setting
/// unchanged. The API names the hop interval `timeout_ms`; `interval_ms`
/// is accepted as well. Other fields (`channels`, `last_updated`) are
/// ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawHopConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, alias = "interval_ms")]
    pub timeout_ms: Option<i64>,
}

/// Sniffer version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum size of a serialized JSON message
pub const MAX_MSG_LEN: usize = 512;

/// Buffer type for serialized JSON messages
pub type MsgBuffer = Vec<u8, MAX_MSG_LEN>;

#[cfg(test)]
mod tests {
    use super::*;

    fn to_json(msg: &SnifferMessage) -> std::string::String {
        let mut buf = [0u8; MAX_MSG_LEN];
        let len = serde_json_core::to_slice(msg, &mut buf).unwrap();
        core::str::from_utf8(&buf[..len]).unwrap().to_owned()
    }

    // ── SnifferMessage serialization ────────────────────────────────

    #[test]
    fn serialize_device_message() {
        let msg = SnifferMessage::Device {
            mac_address: "b8:27:eb:11:22:33",
            rssi: -61,
            probe_ssid: Some("CoffeeShop"),
            vendor: Some("Raspberry Pi"),
            first_seen: 1_700_000_000_000,
            last_seen: 1_700_000_005_000,
            packet_count: 3,
        };
        let json = to_json(&msg);
        assert!(json.contains(r#""type":"device""#));
        assert!(json.contains(r#""mac_address":"b8:27:eb:11:22:33""#));
        assert!(json.contains(r#""rssi":-61"#));
        assert!(json.contains(r#""probe_ssid":"CoffeeShop""#));
        assert!(json.contains(r#""vendor":"Raspberry Pi""#));
        assert!(json.contains(r#""first_seen":1700000000000"#));
        assert!(json.contains(r#""packet_count":3"#));
    }

    #[test]
    fn serialize_device_omits_absent_optionals() {
        let msg = SnifferMessage::Device {
            mac_address: "da:00:00:00:00:01",
            rssi: -100,
            probe_ssid: None,
            vendor: None,
            first_seen: 0,
            last_seen: 0,
            packet_count: 1,
        };
        let json = to_json(&msg);
        assert!(!json.contains("probe_ssid"));
        assert!(!json.contains("vendor"));
    }

    #[test]
    fn serialize_access_point_message() {
        let msg = SnifferMessage::AccessPoint {
            bssid: "00:18:0a:01:02:03",
            ssid: "Flux",
            channel: 6,
            encryption: Some("WPA2"),
            rssi: -42,
            first_seen: 10,
            last_seen: 20,
            beacon_count: 2,
        };
        let json = to_json(&msg);
        assert!(json.contains(r#""type":"access_point""#));
        assert!(json.contains(r#""bssid":"00:18:0a:01:02:03""#));
        assert!(json.contains(r#""ssid":"Flux""#));
        assert!(json.contains(r#""channel":6"#));
        assert!(json.contains(r#""encryption":"WPA2""#));
        assert!(json.contains(r#""beacon_count":2"#));
    }

    #[test]
    fn serialize_hidden_access_point_has_empty_ssid() {
        let msg = SnifferMessage::AccessPoint {
            bssid: "00:18:0a:01:02:03",
            ssid: "",
            channel: 0,
            encryption: None,
            rssi: -80,
            first_seen: 1,
            last_seen: 1,
            beacon_count: 1,
        };
        let json = to_json(&msg);
        assert!(json.contains(r#""ssid":"""#));
        assert!(!json.contains("encryption"));
    }

    #[test]
    fn serialize_status_message() {
        let msg = SnifferMessage::Status {
            running: true,
            uptime: 120,
            frames: 4321,
            devices: 17,
            access_points: 5,
            channel: Some(11),
            version: "0.1.0",
        };
        let json = to_json(&msg);
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""running":true"#));
        assert!(json.contains(r#""frames":4321"#));
        assert!(json.contains(r#""channel":11"#));
    }

    #[test]
    fn serialize_status_without_channel() {
        let msg = SnifferMessage::Status {
            running: false,
            uptime: 0,
            frames: 0,
            devices: 0,
            access_points: 0,
            channel: None,
            version: VERSION,
        };
        assert!(!to_json(&msg).contains("channel"));
    }

    // ── Version constant ────────────────────────────────────────────

    #[test]
    fn version_is_semver() {
        let parts: heapless::Vec<&str, 4> = VERSION.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "VERSION should be semver (major.minor.patch)"
        );
        for part in &parts {
            assert!(part.parse::<u32>().is_ok(), "'{part}' is not a number");
        }
    }
}
