use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Login result from the Roborock account API
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub uid: u64,
    pub token: SecretString,
    #[serde(default)]
    pub rruid: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub rriot: Rriot,
}

/// Device-cloud credentials and endpoints handed out at login
#[derive(Debug, Clone, Deserialize)]
pub struct Rriot {
    /// Hawk id
    pub u: String,
    /// Hawk session
    pub s: SecretString,
    /// Hawk signing key
    pub h: SecretString,
    pub k: SecretString,
    pub r: RriotReference,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RriotReference {
    #[serde(default)]
    pub r: Option<String>,
    /// REST API base for home data
    pub a: String,
    /// MQTT broker
    #[serde(default)]
    pub m: Option<String>,
    #[serde(default)]
    pub l: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeData {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub products: Vec<HomeProduct>,
    #[serde(default)]
    pub devices: Vec<HomeDevice>,
    #[serde(default)]
    pub received_devices: Vec<HomeDevice>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeProduct {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeDevice {
    pub duid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_key: SecretString,
    pub product_id: String,
    #[serde(default)]
    pub pv: Option<String>,
    #[serde(default)]
    pub online: bool,
}

/// Device descriptor resolved once per session
#[derive(Debug, Clone, Serialize)]
pub struct DeviceData {
    pub duid: String,
    pub name: String,
    pub model: String,
    pub product_id: String,
    #[serde(skip)]
    pub local_key: SecretString,
    pub pv: Option<String>,
}

impl DeviceData {
    pub fn new(device: &HomeDevice, model: &str) -> Self {
        Self {
            duid: device.duid.clone(),
            name: device.name.clone(),
            model: model.to_string(),
            product_id: device.product_id.clone(),
            local_key: device.local_key.clone(),
            pv: device.pv.clone(),
        }
    }
}
