/// Radiotap + 802.11 frame classifier.
///
/// Takes the raw bytes delivered by a monitor-mode capture, validates the
/// radiotap preamble and MAC header, pulls out signal strength, and turns
/// the handful of frame subtypes the tracker cares about into a
/// [`FrameEvent`]. Everything else, including truncated or corrupt
/// captures, is silently dropped; dense RF environments produce those
/// continuously.
///
/// Header fields are decoded with shifts and masks over byte slices, so the
/// result doesn't depend on struct layout, packing, or host endianness.
use crate::defaults::{BEACON_FIXED_LEN, MAC_HEADER_LEN, RADIOTAP_MIN_LEN, RSSI_UNKNOWN};
use crate::elements::{scan_elements, scan_ssid, Encryption, Ssid};
use crate::mac::MacAddr;

/// Radiotap present-word bit: another present word follows.
const PRESENT_EXT: u32 = 1 << 31;

/// Radiotap present-word bit: antenna signal (dBm, i8).
pub const PRESENT_ANTENNA_SIGNAL: u32 = 1 << 5;

/// Capability info bit: data confidentiality required.
const CAPABILITY_PRIVACY: u16 = 0x0010;

/// Offset of capability info within the beacon fixed parameters.
const CAPABILITY_OFFSET: usize = 10;

/// Radiotap fields that can precede the antenna signal: (bit, size, alignment).
const FIELDS_BEFORE_SIGNAL: &[(u32, usize, usize)] = &[
    (0, 8, 8), // TSFT
    (1, 1, 1), // Flags
    (2, 1, 1), // Rate
    (3, 4, 2), // Channel (freq u16 + flags u16)
    (4, 2, 1), // FHSS
];

/// Management frame subtypes
pub mod subtype {
    pub const ASSOC_REQ: u8 = 0x0;
    pub const ASSOC_RESP: u8 = 0x1;
    pub const REASSOC_REQ: u8 = 0x2;
    pub const REASSOC_RESP: u8 = 0x3;
    pub const PROBE_REQ: u8 = 0x4;
    pub const PROBE_RESP: u8 = 0x5;
    pub const BEACON: u8 = 0x8;
    pub const DISASSOC: u8 = 0xA;
    pub const AUTH: u8 = 0xB;
    pub const DEAUTH: u8 = 0xC;
    pub const ACTION: u8 = 0xD;
}

// ── Radiotap ────────────────────────────────────────────────────────

/// The fixed part of a radiotap header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadiotapHeader {
    pub version: u8,
    /// Total header length, declared in-band.
    pub len: u16,
    /// First present-flags word.
    pub present: u32,
}

impl RadiotapHeader {
    /// Read the fixed 8-byte prefix. `None` if `frame` is shorter.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let prefix = frame.get(..RADIOTAP_MIN_LEN)?;
        Some(Self {
            version: prefix[0],
            len: u16::from_le_bytes([prefix[2], prefix[3]]),
            present: u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]),
        })
    }

    pub fn has_signal(&self) -> bool {
        self.present & PRESENT_ANTENNA_SIGNAL != 0
    }

    /// Antenna signal in dBm, or [`RSSI_UNKNOWN`] if absent.
    ///
    /// `frame` must start at the radiotap header.
    pub fn signal(&self, frame: &[u8]) -> i8 {
        self.signal_offset(frame)
            .and_then(|offset| frame.get(offset))
            .map_or(RSSI_UNKNOWN, |&b| b as i8)
    }

    /// Byte offset of the antenna signal field, honoring the size and
    /// alignment of every present field ahead of it. When the signal is the
    /// first optional field this is the byte right after the fixed prefix.
    fn signal_offset(&self, frame: &[u8]) -> Option<usize> {
        if !self.has_signal() {
            return None;
        }
        let header_len = self.len as usize;

        // Skip any extended present words.
        let mut offset = RADIOTAP_MIN_LEN;
        let mut word = self.present;
        while word & PRESENT_EXT != 0 {
            let next = frame.get(offset..offset + 4)?;
            word = u32::from_le_bytes([next[0], next[1], next[2], next[3]]);
            offset += 4;
        }

        for &(bit, size, align) in FIELDS_BEFORE_SIGNAL {
            if self.present & (1 << bit) != 0 {
                offset = align_up(offset, align) + size;
            }
        }

        (offset < header_len).then_some(offset)
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

// ── 802.11 MAC header ───────────────────────────────────────────────

/// Frame type from the frame-control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameKind {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => FrameKind::Management,
            1 => FrameKind::Control,
            2 => FrameKind::Data,
            _ => FrameKind::Extension,
        }
    }
}

/// Decoded frame-control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl {
    /// Protocol version (low 2 bits)
    pub version: u8,
    /// Type (next 2 bits)
    pub kind: FrameKind,
    /// Subtype (top 4 bits)
    pub subtype: u8,
    /// Second byte: ToDS, FromDS, retry, protected, ...
    pub flags: u8,
}

impl FrameControl {
    pub fn decode(fc: [u8; 2]) -> Self {
        Self {
            version: fc[0] & 0x3,
            kind: FrameKind::from_bits(fc[0] >> 2),
            subtype: (fc[0] >> 4) & 0xF,
            flags: fc[1],
        }
    }
}

/// The 24-byte three-address MAC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacHeader {
    pub fc: FrameControl,
    pub duration: u16,
    /// Receiver / destination
    pub addr1: MacAddr,
    /// Transmitter / source
    pub addr2: MacAddr,
    /// BSSID for management frames
    pub addr3: MacAddr,
    pub seq_ctrl: u16,
}

impl MacHeader {
    /// Decode the header from the start of `bytes`. `None` if shorter than 24.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let h = bytes.get(..MAC_HEADER_LEN)?;
        Some(Self {
            fc: FrameControl::decode([h[0], h[1]]),
            duration: u16::from_le_bytes([h[2], h[3]]),
            addr1: MacAddr::from_slice(&h[4..10])?,
            addr2: MacAddr::from_slice(&h[10..16])?,
            addr3: MacAddr::from_slice(&h[16..22])?,
            seq_ctrl: u16::from_le_bytes([h[22], h[23]]),
        })
    }
}

// ── Frame events ────────────────────────────────────────────────────

/// A classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Beacon {
        bssid: MacAddr,
        /// Hidden networks carry an empty name.
        ssid: Ssid,
        channel: Option<u8>,
        /// `None` when the fixed parameters were truncated.
        encryption: Option<Encryption>,
        rssi: i8,
    },
    ProbeRequest {
        source: MacAddr,
        /// `None` for wildcard probes.
        ssid: Option<Ssid>,
        rssi: i8,
    },
    AssocRequest {
        source: MacAddr,
        dest: MacAddr,
        rssi: i8,
    },
    ReassocRequest {
        source: MacAddr,
        rssi: i8,
    },
    Disassoc {
        source: MacAddr,
    },
    Deauth {
        source: MacAddr,
    },
    DataFrame {
        byte_length: usize,
    },
}

impl FrameEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameEvent::Beacon { .. } => "beacon",
            FrameEvent::ProbeRequest { .. } => "probe_req",
            FrameEvent::AssocRequest { .. } => "assoc_req",
            FrameEvent::ReassocRequest { .. } => "reassoc_req",
            FrameEvent::Disassoc { .. } => "disassoc",
            FrameEvent::Deauth { .. } => "deauth",
            FrameEvent::DataFrame { .. } => "data",
        }
    }
}

/// Parse a radiotap-wrapped 802.11 frame into a [`FrameEvent`].
///
/// `captured_len` is the number of bytes the capture source actually
/// delivered; it is clamped to `data.len()`. Returns `None` for truncated
/// frames and for frame types this engine doesn't track.
pub fn parse_frame(data: &[u8], captured_len: usize) -> Option<FrameEvent> {
    let len = captured_len.min(data.len());
    let frame = &data[..len];

    let radiotap = RadiotapHeader::parse(frame)?;
    let rtap_len = radiotap.len as usize;
    if rtap_len < RADIOTAP_MIN_LEN || len < rtap_len + MAC_HEADER_LEN {
        return None;
    }

    let rssi = radiotap.signal(frame);
    let header = MacHeader::parse(&frame[rtap_len..])?;
    let body = &frame[rtap_len + MAC_HEADER_LEN..];

    classify(&header, body, rssi, len)
}

/// Dispatch on (type, subtype).
fn classify(header: &MacHeader, body: &[u8], rssi: i8, captured_len: usize) -> Option<FrameEvent> {
    match header.fc.kind {
        FrameKind::Management => match header.fc.subtype {
            subtype::BEACON => {
                let fields = scan_elements(body, BEACON_FIXED_LEN);
                let encryption =
                    beacon_privacy(body).map(|privacy| Encryption::classify(privacy, &fields));
                Some(FrameEvent::Beacon {
                    bssid: header.addr3,
                    ssid: fields.ssid.unwrap_or_default(),
                    channel: fields.channel,
                    encryption,
                    rssi,
                })
            }
            subtype::PROBE_REQ => Some(FrameEvent::ProbeRequest {
                source: header.addr2,
                ssid: scan_ssid(body),
                rssi,
            }),
            subtype::ASSOC_REQ => Some(FrameEvent::AssocRequest {
                source: header.addr2,
                dest: header.addr1,
                rssi,
            }),
            subtype::REASSOC_REQ => Some(FrameEvent::ReassocRequest {
                source: header.addr2,
                rssi,
            }),
            subtype::DISASSOC => Some(FrameEvent::Disassoc {
                source: header.addr2,
            }),
            subtype::DEAUTH => Some(FrameEvent::Deauth {
                source: header.addr2,
            }),
            _ => None,
        },
        FrameKind::Data => Some(FrameEvent::DataFrame {
            byte_length: captured_len,
        }),
        FrameKind::Control | FrameKind::Extension => None,
    }
}

/// Privacy bit of the beacon capability info, if the fixed fields are present.
fn beacon_privacy(body: &[u8]) -> Option<bool> {
    let cap = body.get(CAPABILITY_OFFSET..CAPABILITY_OFFSET + 2)?;
    Some(u16::from_le_bytes([cap[0], cap[1]]) & CAPABILITY_PRIVACY != 0)
}
