/// Live pcap capture on a monitor-mode interface.
use fluxsniff::error::CaptureError;
use fluxsniff::sniffer::{CaptureSource, RawFrame};
use pcap::{Active, Capture};

/// Read timeout; bounds how long a stop request can go unnoticed.
const READ_TIMEOUT_MS: i32 = 1000;

pub struct PcapSource {
    cap: Capture<Active>,
}

impl PcapSource {
    pub fn open(interface: &str) -> Result<Self, pcap::Error> {
        let cap = Capture::from_device(interface)?
            .promisc(true)
            .immediate_mode(true)
            .timeout(READ_TIMEOUT_MS)
            .open()?;
        Ok(Self { cap })
    }
}

impl CaptureSource for PcapSource {
    fn link_type(&self) -> i32 {
        self.cap.get_datalink().0
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>, CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => {
                let ts = packet.header.ts;
                let secs = u64::try_from(ts.tv_sec).unwrap_or(0);
                let micros = u64::try_from(ts.tv_usec).unwrap_or(0);
                Ok(Some(RawFrame {
                    data: packet.data,
                    len: packet.header.caplen as usize,
                    timestamp_ms: secs * 1000 + micros / 1000,
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(pcap::Error::NoMorePackets) => Err(CaptureError::Closed),
            Err(e) => Err(CaptureError::Source(e.to_string())),
        }
    }
}
