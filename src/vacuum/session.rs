//! Vacuum session management.
//!
//! One [`DeviceSessionManager`] owns at most one live [`Session`]: the
//! device connection together with the device descriptor it was opened
//! for. The slot is either empty or holds both, never one without the
//! other.
//!
//! # Lifecycle
//!
//! 1. The first operation finds the slot empty and runs the full connect
//!    sequence: login, home data, first registered device, product model,
//!    open + connect.
//! 2. Later operations reuse the stored session without any I/O.
//! 3. Any failure while using the session runs the reset protocol: try to
//!    disconnect (errors are logged and swallowed), then clear the slot.
//! 4. The next operation connects from scratch.
//!
//! No operation retries internally. Every call either succeeds or fails
//! once and leaves the slot connected or empty.
//!
//! # Concurrency
//!
//! The slot sits behind a `tokio::sync::Mutex` that each operation holds
//! from connect-or-reuse through the command round-trip and any reset, so
//! concurrent callers are served one at a time.

use crate::config::{ConfigError, Credentials};
use crate::vacuum::api::{ApiError, CloudApi};
use crate::vacuum::command::{segment_clean_params, SEGMENT_CLEAN};
use crate::vacuum::connection::{DeviceConnection, DeviceConnector, TransportError};
use crate::vacuum::status::StatusReport;
use crate::vacuum::types::DeviceData;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Login or home data request failed: {0}")]
    Api(#[from] ApiError),
    #[error("No devices registered on the account")]
    NoDevices,
    #[error("No product metadata for product id {0}")]
    UnknownProduct(String),
    #[error("Device connection failed: {0}")]
    Transport(#[from] TransportError),
}

/// Error results returned by the session operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Not logged in to Roborock.")]
    NotConnected,
    #[error("Error {action}: {message}. Connection reset.")]
    Reset { action: String, message: String },
    #[error("Invalid segment list: {0}")]
    InvalidSegments(String),
}

/// Live connection plus the device it talks to
pub struct Session {
    connection: Box<dyn DeviceConnection>,
    device: DeviceData,
}

pub struct DeviceSessionManager {
    api: Arc<dyn CloudApi>,
    connector: Arc<dyn DeviceConnector>,
    credentials: Credentials,
    /// `None` means the next operation has to connect.
    session: Mutex<Option<Session>>,
}

impl DeviceSessionManager {
    pub fn new(
        api: Arc<dyn CloudApi>,
        connector: Arc<dyn DeviceConnector>,
        credentials: Credentials,
    ) -> Self {
        Self {
            api,
            connector,
            credentials,
            session: Mutex::new(None),
        }
    }

    /// Build a manager with credentials from the environment.
    ///
    /// Missing credentials fail here, before anything touches the network.
    pub fn from_env(
        api: Arc<dyn CloudApi>,
        connector: Arc<dyn DeviceConnector>,
    ) -> Result<Self, ConfigError> {
        let credentials = Credentials::from_env()?;
        Ok(Self::new(api, connector, credentials))
    }

    /// Connect if there is no session yet. Returns `true` when a session is
    /// available afterwards.
    pub async fn ensure_connected(&self) -> bool {
        let mut slot = self.session.lock().await;
        self.ensure_session(&mut slot).await
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Descriptor of the connected device, if any
    pub async fn device(&self) -> Option<DeviceData> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.device.clone())
    }

    /// Drop the current session (if any) using the reset protocol
    pub async fn reset(&self) {
        let mut slot = self.session.lock().await;
        Self::reset_session(&mut slot).await;
    }

    pub async fn get_status(&self) -> Result<StatusReport, SessionError> {
        let mut slot = self.session.lock().await;
        let session = self.connected(&mut slot).await?;

        match session.connection.get_status().await {
            Ok(status) => {
                log::debug!("Current status: {:?}", status);
                Ok(StatusReport::from(status))
            }
            Err(e) => {
                log::error!("Error getting status: {}", e);
                Self::reset_session(&mut slot).await;
                Err(SessionError::Reset {
                    action: "getting status".to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Send a parameterless command. The name is passed through unchecked.
    pub async fn send_basic_command(&self, command: &str) -> Result<String, SessionError> {
        let mut slot = self.session.lock().await;
        let session = self.connected(&mut slot).await?;

        match session.connection.send_command(command, None).await {
            Ok(_) => {
                log::info!("✅ Command sent: {}", command);
                Ok(format!("Command {} sent successfully.", command))
            }
            Err(e) => {
                log::error!("Error sending {}: {}", command, e);
                Self::reset_session(&mut slot).await;
                Err(SessionError::Reset {
                    action: format!("sending {}", command),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Clean the given segments once; returns the device acknowledgment.
    pub async fn send_segment_clean(&self, segments: &[u32]) -> Result<Value, SessionError> {
        if segments.is_empty() {
            return Err(SessionError::InvalidSegments(
                "at least one segment is required".to_string(),
            ));
        }
        if segments.contains(&0) {
            return Err(SessionError::InvalidSegments(
                "segment ids must be positive".to_string(),
            ));
        }

        let mut slot = self.session.lock().await;
        let session = self.connected(&mut slot).await?;

        match session
            .connection
            .send_command(SEGMENT_CLEAN, Some(segment_clean_params(segments)))
            .await
        {
            Ok(ack) => {
                log::info!("✅ Command sent: {} {:?}", SEGMENT_CLEAN, segments);
                Ok(ack)
            }
            Err(e) => {
                log::error!("Error sending {}: {}", SEGMENT_CLEAN, e);
                Self::reset_session(&mut slot).await;
                Err(SessionError::Reset {
                    action: format!("sending {}", SEGMENT_CLEAN),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn connected<'a>(
        &self,
        slot: &'a mut Option<Session>,
    ) -> Result<&'a mut Session, SessionError> {
        if !self.ensure_session(slot).await {
            return Err(SessionError::NotConnected);
        }
        slot.as_mut().ok_or(SessionError::NotConnected)
    }

    async fn ensure_session(&self, slot: &mut Option<Session>) -> bool {
        if slot.is_some() {
            return true;
        }

        match self.establish().await {
            Ok(session) => {
                log::info!(
                    "🤖 Roborock login successful ({} / {})",
                    session.device.name,
                    session.device.model
                );
                *slot = Some(session);
                true
            }
            Err(e) => {
                log::error!("Roborock login failed: {}", e);
                false
            }
        }
    }

    /// Full connect sequence. Nothing is stored until every step succeeded.
    async fn establish(&self) -> Result<Session, ConnectError> {
        let user = self.api.login(&self.credentials).await?;
        let home = self.api.home_data(&user).await?;

        // Single-device accounts only: the first registered device wins.
        let home_device = home.devices.first().ok_or(ConnectError::NoDevices)?;
        if home.devices.len() > 1 {
            log::warn!(
                "⚠️ Account has {} devices, using the first one ({})",
                home.devices.len(),
                home_device.name
            );
        }

        let product = home
            .products
            .iter()
            .find(|product| product.id == home_device.product_id)
            .ok_or_else(|| ConnectError::UnknownProduct(home_device.product_id.clone()))?;

        let device = DeviceData::new(home_device, &product.model);
        let mut connection = self.connector.open(&user, &device);
        connection.connect().await?;

        Ok(Session { connection, device })
    }

    async fn reset_session(slot: &mut Option<Session>) {
        if let Some(mut session) = slot.take() {
            match session.connection.disconnect().await {
                Ok(()) => log::info!("Device connection disconnected."),
                Err(e) => log::warn!("⚠️ Error disconnecting device connection: {}", e),
            }
            log::info!("🔄 Roborock connection reset.");
        }
    }
}
