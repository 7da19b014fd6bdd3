/// HTTP collaborators for the ingestion API.
///
/// `GET  {api}/config/channel-hopping`  hop policy
/// `POST {api}/ingest/device`           station sightings
/// `POST {api}/ingest/access-point`     AP sightings
use std::time::Duration;

use fluxsniff::channel::{ConfigSource, HopConfigUpdate};
use fluxsniff::comm::{self, Sink};
use fluxsniff::defaults::SINK_POST_TIMEOUT;
use fluxsniff::error::{ConfigError, SinkError};
use fluxsniff::protocol::MsgBuffer;
use fluxsniff::tracker::{AccessPoint, Device};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

fn endpoint(api: &str, path: &str) -> String {
    format!("{}/{}", api.trim_end_matches('/'), path)
}

pub struct HttpConfigSource {
    client: Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(api: &str) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            url: endpoint(api, "config/channel-hopping"),
        })
    }
}

impl ConfigSource for HttpConfigSource {
    fn fetch(&mut self, timeout: Duration) -> Result<HopConfigUpdate, ConfigError> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ConfigError::Timeout
                } else {
                    ConfigError::Unreachable(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(ConfigError::Unreachable(format!("HTTP {}", resp.status())));
        }
        let body = resp
            .bytes()
            .map_err(|e| ConfigError::Unreachable(e.to_string()))?;
        comm::parse_hop_config(&body)
    }
}

pub struct HttpSink {
    client: Client,
    device_url: String,
    ap_url: String,
}

impl HttpSink {
    pub fn new(api: &str) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(SINK_POST_TIMEOUT).build()?,
            device_url: endpoint(api, "ingest/device"),
            ap_url: endpoint(api, "ingest/access-point"),
        })
    }

    fn post(&self, url: &str, body: Option<MsgBuffer>) -> Result<(), SinkError> {
        let body = body.ok_or_else(|| SinkError::Delivery("message too large".into()))?;
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .and_then(|resp| resp.error_for_status())
            .map(|_| ())
            .map_err(|e| SinkError::Delivery(format!("{url}: {e}")))
    }
}

impl Sink for HttpSink {
    fn on_device_seen(&mut self, device: &Device) -> Result<(), SinkError> {
        self.post(&self.device_url, comm::encode_device(device))
    }

    fn on_ap_seen(&mut self, ap: &AccessPoint) -> Result<(), SinkError> {
        self.post(&self.ap_url, comm::encode_access_point(ap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:8080/", "ingest/device"),
            "http://localhost:8080/ingest/device"
        );
        assert_eq!(
            endpoint("http://api", "config/channel-hopping"),
            "http://api/config/channel-hopping"
        );
    }
}
