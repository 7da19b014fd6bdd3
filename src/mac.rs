/// 6-byte hardware addresses: the key type for tracked devices and APs.
use core::fmt;

use crate::defaults::VENDOR_OUIS;
use crate::protocol::MacString;

/// A 6-byte 802.11 hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);

    /// Read an address from the first 6 bytes of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
        Some(MacAddr(octets))
    }

    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Group bit (I/G) of the first octet.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// U/L bit of the first octet. Set on randomized client addresses.
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Individual (unicast) address that can identify a single radio.
    pub fn is_station(&self) -> bool {
        !self.is_multicast()
    }

    /// Vendor name for this address's OUI, if known.
    ///
    /// Locally administered addresses carry no vendor information.
    pub fn vendor(&self) -> Option<&'static str> {
        if self.is_locally_administered() {
            return None;
        }
        let oui = self.oui();
        VENDOR_OUIS
            .iter()
            .find(|(prefix, _)| *prefix == oui)
            .map(|&(_, vendor)| vendor)
    }

    /// Format as "aa:bb:cc:dd:ee:ff" into a fixed-capacity string.
    pub fn to_mac_string(&self) -> MacString {
        let mut buf = MacString::new();
        format_mac(self, &mut buf);
        buf
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Format a MAC address into "aa:bb:cc:dd:ee:ff"
pub fn format_mac(mac: &MacAddr, buf: &mut MacString) {
    use core::fmt::Write;
    buf.clear();
    let _ = write!(buf, "{mac}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_colon_separated() {
        let mac = MacAddr([0xB8, 0x27, 0xEB, 0x0A, 0xBC, 0x01]);
        assert_eq!(mac.to_string(), "b8:27:eb:0a:bc:01");
        assert_eq!(mac.to_mac_string().as_str(), "b8:27:eb:0a:bc:01");
    }

    #[test]
    fn from_slice_requires_six_bytes() {
        assert_eq!(MacAddr::from_slice(&[1, 2, 3, 4, 5]), None);
        assert_eq!(
            MacAddr::from_slice(&[1, 2, 3, 4, 5, 6, 7]),
            Some(MacAddr([1, 2, 3, 4, 5, 6]))
        );
    }

    #[test]
    fn broadcast_is_multicast_not_station() {
        assert!(MacAddr::BROADCAST.is_broadcast());
        assert!(MacAddr::BROADCAST.is_multicast());
        assert!(!MacAddr::BROADCAST.is_station());
    }

    #[test]
    fn multicast_group_bit() {
        let ipv6_mcast = MacAddr([0x33, 0x33, 0x00, 0x00, 0x00, 0x01]);
        assert!(ipv6_mcast.is_multicast());
        assert!(!ipv6_mcast.is_broadcast());
    }

    #[test]
    fn vendor_lookup_known_oui() {
        let pi = MacAddr([0xB8, 0x27, 0xEB, 0x11, 0x22, 0x33]);
        assert_eq!(pi.vendor(), Some("Raspberry Pi"));
    }

    #[test]
    fn vendor_lookup_unknown_oui() {
        let mac = MacAddr([0x00, 0x00, 0x01, 0x11, 0x22, 0x33]);
        assert_eq!(mac.vendor(), None);
    }

    #[test]
    fn randomized_address_has_no_vendor() {
        // 0xDA = 0b1101_1010: U/L bit set
        let mac = MacAddr([0xDA, 0xA6, 0x32, 0x11, 0x22, 0x33]);
        assert!(mac.is_locally_administered());
        assert!(mac.is_station());
        assert_eq!(mac.vendor(), None);
    }
}
