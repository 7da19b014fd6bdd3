//! fluxsniff library: monitor-mode Wi-Fi capture and analysis engine.
//!
//! Classifies radiotap-wrapped 802.11 frames, tracks the stations and access
//! points they reveal, and keeps the radio hopping across 2.4 GHz channels
//! under a policy that can be changed at runtime. Radio access, capture, and
//! output are traits ([`sniffer::CaptureSource`], [`channel::RadioController`],
//! [`channel::ConfigSource`], [`comm::Sink`]); platform binaries such as
//! `fluxsniff-linux` supply the concrete implementations.
//!
//! Module layout, leaves first:
//! - `defaults`, `mac`, `elements`, `scanner`: frame layout and parsing
//! - `tracker`: bounded, deduplicated device / AP store
//! - `channel`: channel hopping controller
//! - `protocol`, `comm`: NDJSON wire formats and sink dispatch
//! - `sniffer`: the coordinator that ties them together

pub mod channel;
pub mod comm;
pub mod defaults;
pub mod elements;
pub mod error;
pub mod mac;
pub mod protocol;
pub mod scanner;
pub mod sniffer;
pub mod tracker;

pub use error::{Result, SnifferError};
