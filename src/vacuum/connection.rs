//! Device transport.
//!
//! [`DeviceConnector`] turns a resolved device plus the login credentials
//! into a [`DeviceConnection`]; the session manager owns at most one
//! connection at a time.
//!
//! [`RpcBridgeConnection`] speaks JSON-RPC over a WebSocket:
//!
//! ```text
//! -> {"id": 7, "method": "get_status", "params": []}
//! <- {"id": 7, "result": [{"state": 8, "battery": 100, ...}]}
//! <- {"id": 7, "error": {"code": -1, "message": "..."}}
//! ```
//!
//! The first request after the socket opens is `hello`, carrying the
//! device id, model and account token.

use crate::vacuum::status::{DeviceStatus, RawStatus};
use crate::vacuum::types::{DeviceData, UserData};
use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use url::Url;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("No reply within {0:?}")]
    Timeout(Duration),
    #[error("Connection closed by peer")]
    Closed,
    #[error("Device error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Response parsing error: {0}")]
    Parse(String),
    #[error("Transport is not connected")]
    NotConnected,
}

/// A live control channel to one appliance
#[async_trait::async_trait]
pub trait DeviceConnection: Send + Sync {
    async fn connect(&mut self) -> Result<(), TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;

    async fn get_status(&mut self) -> Result<DeviceStatus, TransportError>;

    /// Issue `method`; `None` params go out as an empty list
    async fn send_command(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, TransportError>;
}

/// Builds (unconnected) connections for a resolved device
pub trait DeviceConnector: Send + Sync {
    fn open(&self, user: &UserData, device: &DeviceData) -> Box<dyn DeviceConnection>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct RpcBridgeConnector {
    bridge_url: String,
    request_timeout: Duration,
}

impl RpcBridgeConnector {
    pub fn new(bridge_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            bridge_url: bridge_url.into(),
            request_timeout,
        }
    }
}

impl DeviceConnector for RpcBridgeConnector {
    fn open(&self, user: &UserData, device: &DeviceData) -> Box<dyn DeviceConnection> {
        Box::new(RpcBridgeConnection::new(
            self.bridge_url.clone(),
            self.request_timeout,
            user.clone(),
            device.clone(),
        ))
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct RpcBridgeConnection {
    bridge_url: String,
    request_timeout: Duration,
    user: UserData,
    device: DeviceData,
    stream: Option<WsStream>,
    next_id: u64,
}

impl RpcBridgeConnection {
    pub fn new(
        bridge_url: String,
        request_timeout: Duration,
        user: UserData,
        device: DeviceData,
    ) -> Self {
        Self {
            bridge_url,
            request_timeout,
            user,
            device,
            stream: None,
            next_id: 1,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn endpoint(&self) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.bridge_url)?;
        url.query_pairs_mut().append_pair("duid", &self.device.duid);
        Ok(url)
    }

    async fn call(&mut self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id;
        self.next_id += 1;
        let timeout = self.request_timeout;

        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        let request = serde_json::to_string(&RpcRequest { id, method, params })
            .map_err(|e| TransportError::Parse(e.to_string()))?;
        log::debug!("Bridge request: {}", request);
        stream.send(Message::Text(request.into())).await?;

        match tokio::time::timeout(timeout, Self::read_reply(stream, id)).await {
            Ok(reply) => reply,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    async fn read_reply(stream: &mut WsStream, id: u64) -> Result<Value, TransportError> {
        while let Some(frame) = stream.next().await {
            let text = match frame? {
                Message::Text(text) => text.to_string(),
                Message::Binary(bytes) => String::from_utf8_lossy(bytes.as_slice()).to_string(),
                Message::Close(_) => return Err(TransportError::Closed),
                _ => continue,
            };

            let response: RpcResponse = match serde_json::from_str(&text) {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("⚠️ Ignoring unparseable bridge frame: {}", e);
                    continue;
                }
            };

            if response.id != Some(id) {
                log::debug!("Skipping bridge frame for id {:?}", response.id);
                continue;
            }

            if let Some(error) = response.error {
                return Err(TransportError::Rpc {
                    code: error.code,
                    message: error.message,
                });
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }

        Err(TransportError::Closed)
    }
}

#[async_trait::async_trait]
impl DeviceConnection for RpcBridgeConnection {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let url = self.endpoint()?;
        log::debug!("Opening bridge connection to {}", self.bridge_url);

        let (ws_stream, _) =
            match tokio::time::timeout(self.request_timeout, connect_async(url.as_str())).await {
                Ok(result) => result?,
                Err(_) => return Err(TransportError::Timeout(self.request_timeout)),
            };
        self.stream = Some(ws_stream);

        let hello = json!({
            "duid": self.device.duid,
            "model": self.device.model,
            "uid": self.user.uid,
            "token": self.user.token.expose_secret(),
        });
        if let Err(e) = self.call("hello", hello).await {
            self.stream = None;
            return Err(e);
        }

        log::info!(
            "🔌 Bridge connected for {} ({})",
            self.device.name,
            self.device.model
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        match self.stream.take() {
            Some(mut stream) => {
                stream.close(None).await?;
                log::debug!("Bridge connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn get_status(&mut self) -> Result<DeviceStatus, TransportError> {
        let result = self.call("get_status", json!([])).await?;

        // Devices answer with a one-element list; some bridges unwrap it.
        let entry = match result {
            Value::Array(mut entries) if !entries.is_empty() => entries.swap_remove(0),
            Value::Object(_) => result,
            other => {
                return Err(TransportError::Parse(format!(
                    "Unexpected status payload: {}",
                    other
                )))
            }
        };

        let raw: RawStatus =
            serde_json::from_value(entry).map_err(|e| TransportError::Parse(e.to_string()))?;
        Ok(DeviceStatus::from(raw))
    }

    async fn send_command(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.call(method, params.unwrap_or_else(|| json!([]))).await
    }
}
