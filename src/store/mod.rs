//! Charm store HTTP client.
//!
//! StoreClient::new(StoreConfig) -> client bound to `<server>/v5`
//! get<T>                 : GET + JSON decode (single shot, no retries)
//! list_meta_endpoints    : GET /meta/
//! meta_any               : GET /<id>/meta/any?include=...
//!
//! Every request carries the selected channel, optional basic auth and the
//! cookies kept in the session's [`jar::CookieJar`].
//!
pub mod jar;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::charm::CharmUrl;
use crate::log_debug;
use jar::CookieJar;

/// Production charm store.
pub const DEFAULT_SERVER_URL: &str = "https://api.jujucharms.com/charmstore";
/// API version segment appended to the server URL.
pub const API_VERSION: &str = "v5";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid charm store URL {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot send request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Status { status: StatusCode, message: String },
    #[error("cannot unmarshal response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error document returned by the store on non-2xx replies.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Code", default)]
    code: String,
}

/// Body of `GET /<id>/meta/any`.
#[derive(Debug, Deserialize)]
pub struct MetaAnyResponse {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Meta", default)]
    meta: Option<serde_json::Map<String, serde_json::Value>>,
}

impl MetaAnyResponse {
    pub fn into_meta(self) -> serde_json::Map<String, serde_json::Value> {
        self.meta.unwrap_or_default()
    }
}

/// HTTP basic credentials given as `user:passwd`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub username: String,
    pub password: String,
}

impl FromStr for AuthInfo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((user, pass)) if !user.is_empty() => Ok(AuthInfo {
                username: user.to_string(),
                password: pass.to_string(),
            }),
            _ => Err(format!("invalid auth credentials {s:?}: expected \"user:passwd\"")),
        }
    }
}

// Keep the password out of debug logs.
impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything needed to talk to a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub server_url: String,
    pub channel: Option<String>,
    pub auth: Option<AuthInfo>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            channel: None,
            auth: None,
        }
    }
}

pub struct StoreClient {
    http: reqwest::Client,
    base: String,
    channel: Option<String>,
    auth: Option<AuthInfo>,
    jar: CookieJar,
}

impl StoreClient {
    pub fn new(config: StoreConfig, jar: CookieJar) -> Result<Self, StoreError> {
        let server = config.server_url.trim_end_matches('/');
        let base = format!("{server}/{API_VERSION}");
        // Fail early on a malformed server URL.
        Url::parse(&base).map_err(|source| StoreError::Url {
            url: base.clone(),
            source,
        })?;

        let http = reqwest::Client::builder()
            .user_agent(format!("charm-show/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            channel: config.channel,
            auth: config.auth,
            jar,
        })
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Absolute URL for a store path (with the channel parameter, if any).
    pub fn url_for(&self, path: &str) -> Result<Url, StoreError> {
        let raw = format!("{}{}", self.base, path);
        let mut url = Url::parse(&raw).map_err(|source| StoreError::Url {
            url: raw.clone(),
            source,
        })?;
        if let Some(channel) = &self.channel {
            url.query_pairs_mut().append_pair("channel", channel);
        }
        Ok(url)
    }

    /// Issue a GET for `path` and decode the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&mut self, path: &str) -> Result<T, StoreError> {
        let url = self.url_for(path)?;
        let host = url.host_str().unwrap_or_default().to_string();
        log_debug!("GET {url}");

        let mut req = self.http.get(url.clone());
        if let Some(cookie) = self.jar.cookie_header(&host) {
            req = req.header(COOKIE, cookie);
        }
        if let Some(auth) = &self.auth {
            req = req.basic_auth(&auth.username, Some(&auth.password));
        }

        let resp = req.send().await?;
        let status = resp.status();
        self.jar.store_response_cookies(&host, resp.headers());
        let body = resp.bytes().await?;
        log_debug!("{status} from {url} ({} bytes)", body.len());

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Names of every metadata endpoint the store serves.
    pub async fn list_meta_endpoints(&mut self) -> Result<Vec<String>> {
        self.get::<Vec<String>>("/meta/")
            .await
            .context("cannot get metadata endpoints")
    }

    /// Fetch the requested metadata for `id` in one round trip.
    pub async fn meta_any(
        &mut self,
        id: &CharmUrl,
        includes: &[String],
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        let path = meta_any_path(id, includes);
        let resp: MetaAnyResponse = self
            .get(&path)
            .await
            .with_context(|| format!("cannot get metadata from {path}"))?;
        log_debug!("metadata for {} ({} field(s))", resp.id, includes.len());
        Ok(resp.into_meta())
    }
}

/// `/<id path>/meta/any?include=a&include=b`, in request order.
pub fn meta_any_path(id: &CharmUrl, includes: &[String]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(includes.iter().map(|f| ("include", f.as_str())))
        .finish();
    format!("/{}/meta/any?{}", id.path(), query)
}

fn status_error(status: StatusCode, body: &[u8]) -> StoreError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(e) if !e.message.is_empty() => e.message,
        Ok(e) if !e.code.is_empty() => e.code,
        _ => "unexpected response".to_string(),
    };
    StoreError::Status { status, message }
}
