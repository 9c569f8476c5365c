use crate::config::Credentials;
use crate::vacuum::types::{HomeData, Rriot, UserData};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rand::RngCore;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {code} - {message}")]
    Api { code: i64, message: String },
    #[error("Response parsing error: {0}")]
    Parse(String),
    #[error("Request signing failed: {0}")]
    Signing(String),
}

/// Account and topology lookups against the vendor cloud
#[async_trait::async_trait]
pub trait CloudApi: Send + Sync {
    /// Authenticate with username and password
    async fn login(&self, credentials: &Credentials) -> Result<UserData, ApiError>;

    /// Fetch the registered devices and product metadata for the account
    async fn home_data(&self, user: &UserData) -> Result<HomeData, ApiError>;
}

/// `{code, msg, data}` envelope used by the v1 account endpoints
#[derive(Debug, Deserialize)]
struct V1Envelope {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// `{success, result, msg}` envelope used by the v2 home endpoints
#[derive(Debug, Deserialize)]
struct V2Envelope {
    success: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HomeDetail {
    rr_home_id: u64,
}

pub struct RoborockWebApi {
    client: Client,
    base_url: String,
    /// Random per-client id mixed into `header_clientid`
    device_identifier: String,
}

impl RoborockWebApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            device_identifier: random_token(16),
        })
    }

    fn unwrap_v1<T: DeserializeOwned>(envelope: V1Envelope) -> Result<T, ApiError> {
        if envelope.code != 200 {
            return Err(ApiError::Api {
                code: envelope.code,
                message: envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Parse("Missing 'data' field".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn unwrap_v2<T: DeserializeOwned>(envelope: V2Envelope) -> Result<T, ApiError> {
        if !envelope.success {
            return Err(ApiError::Api {
                code: 0,
                message: envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        let result = envelope
            .result
            .ok_or_else(|| ApiError::Parse("Missing 'result' field".to_string()))?;
        serde_json::from_value(result).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Api {
                code: status.as_u16() as i64,
                message: error_text,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(format!("Invalid JSON: {}", e)))
    }

    async fn home_id(&self, user: &UserData) -> Result<u64, ApiError> {
        let url = format!("{}/api/v1/getHomeDetail", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", user.token.expose_secret())
            .send()
            .await?;

        let detail: HomeDetail = Self::unwrap_v1(Self::read_json(response).await?)?;
        Ok(detail.rr_home_id)
    }
}

#[async_trait::async_trait]
impl CloudApi for RoborockWebApi {
    async fn login(&self, credentials: &Credentials) -> Result<UserData, ApiError> {
        let url = format!("{}/api/v1/login", self.base_url);
        log::debug!("Logging in to Roborock as {}", credentials.username);

        let response = self
            .client
            .post(&url)
            .header(
                "header_clientid",
                client_id_header(&credentials.username, &self.device_identifier),
            )
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password()),
                ("needtwostepauth", "false"),
            ])
            .send()
            .await?;

        Self::unwrap_v1(Self::read_json(response).await?)
    }

    async fn home_data(&self, user: &UserData) -> Result<HomeData, ApiError> {
        let home_id = self.home_id(user).await?;
        let path = format!("/v2/user/homes/{}", home_id);
        let url = format!("{}{}", user.rriot.r.a.trim_end_matches('/'), path);
        log::debug!("Fetching home data for home {}", home_id);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let authorization = hawk_authorization(&user.rriot, &path, timestamp, &random_token(6))?;

        let response = self
            .client
            .get(&url)
            .header("Authorization", authorization)
            .send()
            .await?;

        Self::unwrap_v2(Self::read_json(response).await?)
    }
}

/// URL-safe random token of `len` bytes of entropy
fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `header_clientid`: base64 of md5(username + device identifier)
fn client_id_header(username: &str, device_identifier: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(username.as_bytes());
    hasher.update(device_identifier.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Hawk `Authorization` value for the device-cloud endpoints under `rriot.r.a`.
///
/// The MAC is HMAC-SHA256 keyed with `rriot.h` over
/// `u:s:nonce:ts:md5_hex(path)::`.
fn hawk_authorization(
    rriot: &Rriot,
    path: &str,
    timestamp: u64,
    nonce: &str,
) -> Result<String, ApiError> {
    let ts = timestamp.to_string();
    let path_digest = hex::encode(Md5::digest(path.as_bytes()));
    let prestr = [
        rriot.u.as_str(),
        rriot.s.expose_secret(),
        nonce,
        ts.as_str(),
        path_digest.as_str(),
        "",
        "",
    ]
    .join(":");

    let mut mac = Hmac::<Sha256>::new_from_slice(rriot.h.expose_secret().as_bytes())
        .map_err(|e| ApiError::Signing(e.to_string()))?;
    mac.update(prestr.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(format!(
        "Hawk id=\"{}\", s=\"{}\", ts=\"{}\", nonce=\"{}\", mac=\"{}\"",
        rriot.u,
        rriot.s.expose_secret(),
        ts,
        nonce,
        signature
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_error_envelope() {
        let envelope: V1Envelope =
            serde_json::from_value(json!({"code": 2012, "msg": "invalid password"})).unwrap();
        match RoborockWebApi::unwrap_v1::<HomeDetail>(envelope) {
            Err(ApiError::Api { code, message }) => {
                assert_eq!(code, 2012);
                assert_eq!(message, "invalid password");
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_v1_missing_data() {
        let envelope: V1Envelope = serde_json::from_value(json!({"code": 200})).unwrap();
        assert!(matches!(
            RoborockWebApi::unwrap_v1::<HomeDetail>(envelope),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn test_v2_failure() {
        let envelope: V2Envelope =
            serde_json::from_value(json!({"success": false, "msg": "token expired"})).unwrap();
        match RoborockWebApi::unwrap_v2::<HomeData>(envelope) {
            Err(ApiError::Api { message, .. }) => assert_eq!(message, "token expired"),
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    fn rriot() -> Rriot {
        serde_json::from_value(json!({
            "u": "user-id",
            "s": "session",
            "h": "hmac-key",
            "k": "key",
            "r": {"a": "https://api-eu.roborock.com"}
        }))
        .unwrap()
    }

    #[test]
    fn test_hawk_authorization() {
        let header =
            hawk_authorization(&rriot(), "/v2/user/homes/555", 1_700_000_000, "AbCdEfGh").unwrap();
        assert_eq!(
            header,
            "Hawk id=\"user-id\", s=\"session\", ts=\"1700000000\", nonce=\"AbCdEfGh\", \
             mac=\"LkED7NPpSxix47SV4GtBs6zq6zni8lmynoRJF0ipSPg=\""
        );
    }

    #[test]
    fn test_hawk_mac_depends_on_path() {
        let a = hawk_authorization(&rriot(), "/v2/user/homes/555", 1_700_000_000, "n").unwrap();
        let b = hawk_authorization(&rriot(), "/v2/user/homes/556", 1_700_000_000, "n").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_client_id_header() {
        assert_eq!(
            client_id_header("me@example.com", "device-abc"),
            "hMsrq3EesCc/UMsSItNjAg=="
        );
    }

    #[test]
    fn test_random_tokens() {
        let nonce = random_token(6);
        assert_eq!(nonce.len(), 8);
        assert!(nonce
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(random_token(16), random_token(16));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = RoborockWebApi::new("https://euiot.roborock.com/").unwrap();
        assert_eq!(api.base_url, "https://euiot.roborock.com");
    }
}
