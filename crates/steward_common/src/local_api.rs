//! Local client APIs on the loopback interface
//!
//! - Execution client: JSON-RPC `web3_clientVersion`
//! - Beacon node: REST `/eth/v1/node/version` and `/eth/v1/node/syncing`
//!
//! These are the only way to learn which version is *running*, as opposed to
//! which binary sits on disk.

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const BEACON_VERSION_ENDPOINT: &str = "/eth/v1/node/version";
pub const BEACON_SYNCING_ENDPOINT: &str = "/eth/v1/node/syncing";

/// Beacon node sync report (`/eth/v1/node/syncing` data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub head_slot: u64,
    pub sync_distance: u64,
    pub is_syncing: bool,
}

impl SyncStatus {
    /// Parse the `data` object; the beacon API encodes slots as decimal strings
    pub fn from_data(data: &Value) -> Option<Self> {
        let number = |key: &str| -> Option<u64> {
            match data.get(key)? {
                Value::String(s) => s.parse().ok(),
                Value::Number(n) => n.as_u64(),
                _ => None,
            }
        };

        Some(SyncStatus {
            head_slot: number("head_slot")?,
            sync_distance: number("sync_distance")?,
            is_syncing: data.get("is_syncing")?.as_bool()?,
        })
    }
}

/// Local client API capability
pub trait LocalClientApi {
    /// Agent string of the running execution client
    fn execution_client_version(&self) -> Result<String, ProbeError>;

    /// Agent string of the running beacon node
    fn beacon_node_version(&self) -> Result<String, ProbeError>;

    /// Sync report; `Ok(None)` when the node answered without usable sync data
    fn beacon_sync_status(&self) -> Result<Option<SyncStatus>, ProbeError>;
}

/// HTTP backend against fixed loopback endpoints
pub struct HttpLocalApi {
    execution_rpc_url: String,
    beacon_api_url: String,
    client: reqwest::blocking::Client,
}

impl HttpLocalApi {
    pub fn new(
        execution_rpc_url: impl Into<String>,
        beacon_api_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            execution_rpc_url: execution_rpc_url.into(),
            beacon_api_url: beacon_api_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn beacon_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.beacon_api_url, endpoint)
    }

    fn get_json(&self, url: &str) -> Result<Value, ProbeError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| ProbeError::Connection {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        read_json(url, response)
    }
}

fn read_json(url: &str, response: reqwest::blocking::Response) -> Result<Value, ProbeError> {
    if response.status().as_u16() != 200 {
        return Err(ProbeError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.json::<Value>().map_err(|e| ProbeError::Response {
        url: url.to_string(),
        message: format!("invalid JSON: {}", e),
    })
}

impl LocalClientApi for HttpLocalApi {
    fn execution_client_version(&self) -> Result<String, ProbeError> {
        let url = &self.execution_rpc_url;
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "web3_clientVersion",
            "id": 67,
        });

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .map_err(|e| ProbeError::Connection {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let json = read_json(url, response)?;
        json.get("result")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProbeError::Response {
                url: url.clone(),
                message: "result not found".to_string(),
            })
    }

    fn beacon_node_version(&self) -> Result<String, ProbeError> {
        let url = self.beacon_url(BEACON_VERSION_ENDPOINT);
        let json = self.get_json(&url)?;
        json.pointer("/data/version")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(ProbeError::Response {
                url,
                message: "data.version not found".to_string(),
            })
    }

    fn beacon_sync_status(&self) -> Result<Option<SyncStatus>, ProbeError> {
        let url = self.beacon_url(BEACON_SYNCING_ENDPOINT);
        let json = self.get_json(&url)?;
        Ok(json.get("data").and_then(SyncStatus::from_data))
    }
}
