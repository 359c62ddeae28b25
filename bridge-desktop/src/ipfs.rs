//! IPFS object store over the Kubo HTTP RPC API

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    object_store::{ContentAddress, ObjectStore},
};
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size", default)]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(rename = "Message")]
    message: String,
}

/// Object store that delegates to a running IPFS node.
///
/// `put` pins the blob (`/api/v0/add?pin=true`) and returns its CID;
/// `get` reads it back through `/api/v0/cat`.
pub struct IpfsObjectStore {
    client: Client,
    api_url: String,
}

impl IpfsObjectStore {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("IPFS client: {}", e)))?;
        Ok(Self::with_client(client, api_url))
    }

    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.api_url, path)
    }

    /// Translate an RPC error body into the bridge taxonomy.
    fn rpc_error(status: u16, body: &[u8], address: Option<&ContentAddress>) -> BridgeError {
        let message = serde_json::from_slice::<RpcError>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());

        let missing = message.contains("not found")
            || message.contains("invalid path")
            || message.contains("invalid cid");
        match address {
            Some(address) if missing => {
                BridgeError::NotFound(format!("blob {}: {}", address, message))
            }
            _ => BridgeError::OperationFailed(format!("IPFS RPC HTTP {}: {}", status, message)),
        }
    }

    fn transport_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout(e.to_string())
        } else {
            BridgeError::OperationFailed(e.to_string())
        }
    }
}

#[async_trait]
impl ObjectStore for IpfsObjectStore {
    async fn put(&self, data: Bytes) -> Result<ContentAddress> {
        let size = data.len();
        let part = multipart::Part::stream(reqwest::Body::from(data)).file_name("blob");
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("add"))
            .query(&[("pin", "true"), ("cid-version", "1")])
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Self::transport_error)?;
        if !(200..300).contains(&status) {
            warn!(status, "IPFS add failed");
            return Err(Self::rpc_error(status, &body, None));
        }

        let added: AddResponse = serde_json::from_slice(&body).map_err(|e| {
            BridgeError::OperationFailed(format!("Unexpected IPFS add response: {}", e))
        })?;
        debug!(cid = %added.hash, size, stored = ?added.size, "Added blob to IPFS");
        ContentAddress::new(added.hash)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        let response = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", address.as_str())])
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Self::transport_error)?;
        if !(200..300).contains(&status) {
            return Err(Self::rpc_error(status, &body, Some(address)));
        }

        debug!(cid = %address, size = body.len(), "Fetched blob from IPFS");
        Ok(body)
    }
}
