/// Tagged information element scanner for 802.11 management frame bodies.
///
/// Element format: [id] [length] [value...]
/// Elements we care about:
///   0x00 = SSID (0–32 bytes, 0 = hidden / wildcard)
///   0x03 = DS Parameter Set (1 byte, current channel)
///   0x30 = RSN (WPA2)
///   0xDD = Vendor specific (WPA when OUI 00:50:F2 type 1)
///
/// Scanning is best-effort: an element whose declared length runs past the
/// end of the body halts the walk, and whatever was extracted before it is
/// returned. Nothing is ever read outside the body slice.
use heapless::Vec;

use crate::defaults::MAX_SSID_LEN;

/// Element ID: SSID
pub const ELEMENT_SSID: u8 = 0;

/// Element ID: DS Parameter Set (current channel)
pub const ELEMENT_DS_PARAMS: u8 = 3;

/// Element ID: RSN
pub const ELEMENT_RSN: u8 = 48;

/// Element ID: Vendor Specific
pub const ELEMENT_VENDOR: u8 = 221;

/// Microsoft OUI + type 1: the pre-RSN WPA element.
const WPA_OUI_TYPE: [u8; 4] = [0x00, 0x50, 0xF2, 0x01];

/// Bytes in an element's id + length header.
const TAG_HEADER_LEN: usize = 2;

/// A network name, 0–32 raw bytes. Empty means hidden.
///
/// SSIDs are octet strings, not guaranteed UTF-8; use
/// [`Ssid::to_string_lossy`] for display and serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Ssid(Vec<u8, MAX_SSID_LEN>);

impl Ssid {
    /// The hidden (empty) network name.
    pub const fn hidden() -> Self {
        Ssid(Vec::new())
    }

    /// Copy `bytes` into a new SSID. `None` if longer than 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Vec::from_slice(bytes).ok().map(Ssid)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_hidden(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl core::fmt::Display for Ssid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_hidden() {
            f.write_str("(hidden)")
        } else {
            f.write_str(&self.to_string_lossy())
        }
    }
}

/// A single information element borrowed from a frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    pub id: u8,
    pub value: &'a [u8],
}

/// Iterator over the elements of a frame body.
///
/// Stops when fewer than 3 bytes remain or an element overruns the body.
pub struct Elements<'a> {
    body: &'a [u8],
    pos: usize,
}

impl<'a> Elements<'a> {
    /// Walk `body` starting at byte `offset`.
    pub fn new(body: &'a [u8], offset: usize) -> Self {
        Self {
            body,
            pos: offset.min(body.len()),
        }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        let remaining = self.body.len() - self.pos;
        if remaining <= TAG_HEADER_LEN {
            return None;
        }

        let id = self.body[self.pos];
        let len = self.body[self.pos + 1] as usize;
        if len > remaining - TAG_HEADER_LEN {
            // Truncated capture or garbage length; stop for good.
            self.pos = self.body.len();
            return None;
        }

        let start = self.pos + TAG_HEADER_LEN;
        let value = &self.body[start..start + len];
        self.pos = start + len;
        Some(Element { id, value })
    }
}

/// Fields extracted from a frame body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementFields {
    /// Explicit network name. `None` when absent, zero-length, or oversized.
    pub ssid: Option<Ssid>,
    /// Channel from the DS Parameter Set.
    pub channel: Option<u8>,
    /// First RSN (WPA2) or WPA vendor element seen.
    pub security: Option<Encryption>,
}

/// Scan `body` from `offset` for the SSID, DS Parameter Set, and security
/// elements.
///
/// Every well-formed SSID and DS element overwrites the previous one, so
/// the last valid element of each kind wins. The first security element
/// decides between WPA and WPA2.
pub fn scan_elements(body: &[u8], offset: usize) -> ElementFields {
    let mut fields = ElementFields::default();

    for element in Elements::new(body, offset) {
        match element.id {
            ELEMENT_SSID => {
                if (1..=MAX_SSID_LEN).contains(&element.value.len()) {
                    fields.ssid = Ssid::from_bytes(element.value);
                }
            }
            ELEMENT_DS_PARAMS => {
                if let [channel] = element.value {
                    fields.channel = Some(*channel);
                }
            }
            ELEMENT_RSN if fields.security.is_none() => {
                fields.security = Some(Encryption::Wpa2);
            }
            ELEMENT_VENDOR if fields.security.is_none() => {
                if element.value.starts_with(&WPA_OUI_TYPE) {
                    fields.security = Some(Encryption::Wpa);
                }
            }
            _ => {}
        }
    }

    fields
}

// ── Encryption ──────────────────────────────────────────────────────

/// Access point security as advertised in a beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encryption {
    Open,
    Wep,
    Wpa,
    Wpa2,
}

impl Encryption {
    /// Privacy bit clear means open. With it set, the first security
    /// element decides, and WEP remains when there is none.
    pub fn classify(privacy: bool, fields: &ElementFields) -> Self {
        if !privacy {
            return Encryption::Open;
        }
        fields.security.unwrap_or(Encryption::Wep)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Encryption::Open => "Open",
            Encryption::Wep => "WEP",
            Encryption::Wpa => "WPA",
            Encryption::Wpa2 => "WPA2",
        }
    }
}

impl core::fmt::Display for Encryption {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan `body` for the SSID element only (probe requests).
pub fn scan_ssid(body: &[u8]) -> Option<Ssid> {
    Elements::new(body, 0)
        .find(|e| e.id == ELEMENT_SSID && (1..=MAX_SSID_LEN).contains(&e.value.len()))
        .and_then(|e| Ssid::from_bytes(e.value))
}
