//! REST discovery of the device.
//!
//! One `GET http://<host>:<port>/api/v2/` per connection attempt. The body
//! looks like:
//!
//! ```json
//! {"device": {"name": "Frame", ...}, "version": "2.0.25", "isSupport": "{\"remote\":\"true\"}"}
//! ```
//!
//! `isSupport` is a JSON document encoded as a string, so it is parsed a
//! second time. The result is flattened into a single [`DeviceInfo`].

mod device_info;

pub use device_info::DeviceInfo;

use crate::REST_API_PATH;
use crate::error::discovery::DiscoveryError;

use common::HttpStatusCode;

use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

const DEVICE_KEY: &str = "device";
const VERSION_KEY: &str = "version";
const IS_SUPPORT_KEY: &str = "isSupport";
const SUPPORT_KEY: &str = "support";

#[derive(Clone)]
pub struct DiscoveryClient {
    client: Client,
    port: u16,
}

impl DiscoveryClient {
    pub fn new(port: u16, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, port })
    }

    /// REST endpoint for `host`.
    pub fn api_url(&self, host: &str) -> Result<Url, DiscoveryError> {
        Ok(Url::parse(&format!(
            "http://{host}:{}{REST_API_PATH}",
            self.port
        ))?)
    }

    /// Fetch and merge the device description.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::Request`] - timeout, refused connection, DNS failure
    /// - [`DiscoveryError::Http`] - any non-2xx status
    /// - [`DiscoveryError::Payload`] - body is not a JSON object
    pub async fn discover(&self, host: &str) -> Result<DeviceInfo, DiscoveryError> {
        let url = self.api_url(host)?;
        debug!("Requesting device info from {url}");

        let response = self.client.get(url).send().await?;

        let status = HttpStatusCode::from(response.status().as_u16());
        if !status.is_success() {
            return Err(DiscoveryError::http(
                status.0,
                response.text().await.unwrap_or_default(),
            ));
        }

        let body: Value = response.json().await?;
        let info = merge_device_info(body)?;

        debug!(
            "Discovered device '{}' ({} fields)",
            info.name().unwrap_or("unknown"),
            info.fields().len()
        );
        Ok(info)
    }
}

/// Flatten a REST discovery body into one mapping.
///
/// The `device` fields come first, then `version` (always a string) and
/// `support` (the re-parsed `isSupport` document) are added on top. A
/// missing or unparseable `isSupport` yields an empty `support` object.
pub fn merge_device_info(body: Value) -> Result<DeviceInfo, DiscoveryError> {
    let Value::Object(mut body) = body else {
        return Err(DiscoveryError::payload("discovery body is not a JSON object"));
    };

    let mut fields = match body.remove(DEVICE_KEY) {
        Some(Value::Object(device)) => device,
        _ => Map::new(),
    };

    let support = match body.remove(IS_SUPPORT_KEY) {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(support)) => support,
            Ok(_) | Err(_) => {
                debug!("Ignoring unparseable isSupport field");
                Map::new()
            }
        },
        Some(Value::Object(support)) => support,
        _ => Map::new(),
    };

    let version = match body.remove(VERSION_KEY) {
        Some(Value::String(version)) => version,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    fields.insert(SUPPORT_KEY.to_string(), Value::Object(support));
    fields.insert(VERSION_KEY.to_string(), Value::String(version));

    Ok(DeviceInfo::new(fields))
}
