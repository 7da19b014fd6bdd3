//! fluxsniff: Linux daemon
//!
//! Captures on a monitor-mode interface through libpcap, hops channels with
//! `iw`, and reports sightings either to the ingestion API or, without one,
//! to stdout as NDJSON. Runs until interrupted or the capture closes.

mod capture;
mod http;
mod radio;

use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use fluxsniff::channel::{ChannelHopper, ConfigSource, HopConfigUpdate};
use fluxsniff::comm::NdjsonSink;
use fluxsniff::defaults::{MAX_APS, MAX_DEVICES};
use fluxsniff::error::ConfigError;
use fluxsniff::protocol::VERSION;
use fluxsniff::sniffer::{Sniffer, SnifferConfig};

use capture::PcapSource;
use http::{HttpConfigSource, HttpSink};
use radio::IwRadio;

#[derive(Parser)]
#[command(name = "fluxsniff")]
#[command(version, about = "Monitor-mode WiFi device and access point tracker")]
struct Cli {
    /// Monitor-mode interface to capture on.
    #[arg(short, long, env = "INTERFACE", default_value = "wlan0mon")]
    interface: String,

    /// Ingestion API base URL. Without it, sightings go to stdout.
    #[arg(long, env = "FLUX_API_URL")]
    api_url: Option<String>,

    /// Maximum distinct stations tracked.
    #[arg(long, env = "FLUX_MAX_DEVICES", default_value_t = MAX_DEVICES)]
    max_devices: usize,

    /// Maximum distinct access points tracked.
    #[arg(long, env = "FLUX_MAX_APS", default_value_t = MAX_APS)]
    max_aps: usize,

    /// Stay on the current channel.
    #[arg(long)]
    no_hop: bool,
}

/// Hop policy when no API is configured: always the compiled-in default.
struct DefaultPolicy;

impl ConfigSource for DefaultPolicy {
    fn fetch(&mut self, _timeout: Duration) -> Result<HopConfigUpdate, ConfigError> {
        Ok(HopConfigUpdate::default())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    log::info!("fluxsniff v{} starting on {}", VERSION, cli.interface);

    let capture = PcapSource::open(&cli.interface)
        .with_context(|| format!("opening capture on {}", cli.interface))?;

    let config = SnifferConfig {
        max_devices: cli.max_devices,
        max_aps: cli.max_aps,
        ..SnifferConfig::new(&cli.interface)
    };

    let mut sniffer = match &cli.api_url {
        Some(api) => {
            log::info!("Reporting to {api}");
            Sniffer::new(capture, HttpSink::new(api)?, config)?
        }
        None => {
            log::info!("No API configured, writing NDJSON to stdout");
            Sniffer::new(capture, NdjsonSink::new(io::stdout()), config)?
        }
    };

    let stop = sniffer.stop_handle();
    ctrlc::set_handler(move || {
        if stop.stop() {
            log::info!("Interrupt received, shutting down");
        }
    })
    .context("installing signal handler")?;

    match (&cli.api_url, cli.no_hop) {
        (_, true) => sniffer.run()?,
        (Some(api), false) => {
            let hopper = ChannelHopper::new(&cli.interface, HttpConfigSource::new(api)?, IwRadio);
            sniffer.run_with_hopper(hopper)?
        }
        (None, false) => {
            let hopper = ChannelHopper::new(&cli.interface, DefaultPolicy, IwRadio);
            sniffer.run_with_hopper(hopper)?
        }
    }

    let stats = sniffer.stats();
    log::info!(
        "Done: {} frames, {} devices, {} access points",
        stats.frames,
        sniffer.store().device_count(),
        sniffer.store().ap_count()
    );
    Ok(())
}
