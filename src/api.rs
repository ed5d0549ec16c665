/// TubeShift lookup API client and response parsing

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::bridge;
use crate::tab_data::Location;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP response was not ok: {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response had no status")]
    MissingStatus,
    #[error("known response was missing data")]
    MissingData,
    #[error("could not build request url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Requests are aborted after this long.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: default_host(),
            version: default_version(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "api.tubeshift.info".to_string()
}

fn default_version() -> u32 {
    1
}

fn default_request_timeout_ms() -> u32 {
    5000
}

impl ApiConfig {
    /// `https://<host>/<version>/video/<platform>/<id>`, segments escaped
    pub fn video_url(&self, platform_name: &str, platform_id: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&format!("https://{}/", self.host))
            .map_err(|e| LookupError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidUrl(self.host.clone()))?
            .clear()
            .push(&self.version.to_string())
            .push("video")
            .push(platform_name)
            .push(platform_id);

        Ok(url)
    }
}

/// A video known to the lookup service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    #[serde(default, deserialize_with = "id_as_string")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "id_as_string")]
    pub channel_id: Option<String>,
    pub locations: Vec<Location>,
}

/// The service hands out ids as numbers or strings.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupStatus {
    Known(Video),
    Unknown,
    /// The service answered but reported an error.
    Error(Option<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResponseStatus {
    Known,
    Unknown,
    Error,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: Option<ResponseStatus>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Interpret a video lookup reply.
pub fn parse_video_response(http_status: u16, body: &str) -> Result<LookupStatus, LookupError> {
    if !(200..300).contains(&http_status) {
        return Err(LookupError::HttpStatus(http_status));
    }

    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| LookupError::MalformedResponse(e.to_string()))?;

    match envelope.status.ok_or(LookupError::MissingStatus)? {
        ResponseStatus::Known => {
            let data = envelope.data.ok_or(LookupError::MissingData)?;
            let video: Video = serde_json::from_value(data)
                .map_err(|e| LookupError::MalformedResponse(e.to_string()))?;
            Ok(LookupStatus::Known(video))
        }
        ResponseStatus::Unknown => Ok(LookupStatus::Unknown),
        ResponseStatus::Error => Ok(LookupStatus::Error(envelope.message)),
    }
}

#[async_trait(?Send)]
pub trait LookupClient {
    async fn fetch_video_by_platform(
        &self,
        platform_name: &str,
        platform_id: &str,
    ) -> Result<LookupStatus, LookupError>;
}

#[derive(Debug, Deserialize)]
struct HttpReply {
    status: u16,
    body: String,
}

/// Lookup client over `fetch` in the background page
#[derive(Debug, Clone, Default)]
pub struct HttpLookupClient {
    config: ApiConfig,
}

impl HttpLookupClient {
    pub fn new(config: ApiConfig) -> Self {
        HttpLookupClient { config }
    }
}

#[async_trait(?Send)]
impl LookupClient for HttpLookupClient {
    async fn fetch_video_by_platform(
        &self,
        platform_name: &str,
        platform_id: &str,
    ) -> Result<LookupStatus, LookupError> {
        let url = self.config.video_url(platform_name, platform_id)?;
        log::info!("looking up {}", url);

        let reply_js = bridge::fetchText(url.as_str(), self.config.request_timeout_ms)
            .await
            .map_err(|e| LookupError::Transport(bridge::js_error_message(&e)))?;

        let reply: HttpReply = serde_wasm_bindgen::from_value(reply_js)
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        parse_video_response(reply.status, &reply.body)
    }
}
