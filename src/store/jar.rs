//! Persistent cookie jar for charm store sessions.
//!
//! Cookies are kept per host as `name -> value` (plus an optional expiry)
//! and written back to disk when the jar is dropped, whatever the outcome
//! of the command. Expired cookies are never replayed nor saved.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{log_error, log_trace};

/// Default file name (under the home directory) when `JUJU_COOKIEFILE` is unset.
pub const DEFAULT_COOKIE_FILE: &str = ".charm-cookies.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct StoredCookie {
    value: String,
    /// None for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
struct Stored {
    #[serde(default)]
    hosts: BTreeMap<String, BTreeMap<String, StoredCookie>>,
}

impl Stored {
    fn purge_expired(&mut self, now: DateTime<Utc>) {
        for cookies in self.hosts.values_mut() {
            cookies.retain(|_, c| c.is_live(now));
        }
        self.hosts.retain(|_, cookies| !cookies.is_empty());
    }
}

#[derive(Debug)]
pub struct CookieJar {
    path: Option<PathBuf>,
    stored: Stored,
}

impl CookieJar {
    /// Jar that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            stored: Stored::default(),
        }
    }

    /// Load the jar from `path`; a missing file yields an empty jar.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Stored::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("cannot parse cookie file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Stored::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("cannot read cookie file {}", path.display()));
            }
        };
        log_trace!(
            "cookie jar loaded from {} ({} host(s))",
            path.display(),
            stored.hosts.len()
        );
        Ok(Self {
            path: Some(path),
            stored,
        })
    }

    /// Resolve the cookie file: explicit override, else `<home>/.charm-cookies.json`.
    pub fn default_path(env_override: Option<String>) -> Option<PathBuf> {
        env_override
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(DEFAULT_COOKIE_FILE)))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `Cookie` header value for `host`, if any unexpired cookie is stored.
    pub fn cookie_header(&self, host: &str) -> Option<HeaderValue> {
        let now = Utc::now();
        let joined = self
            .stored
            .hosts
            .get(host)?
            .iter()
            .filter(|(_, c)| c.is_live(now))
            .map(|(k, c)| format!("{k}={}", c.value))
            .collect::<Vec<_>>()
            .join("; ");
        if joined.is_empty() {
            return None;
        }
        HeaderValue::from_str(&joined).ok()
    }

    /// Record every `Set-Cookie` header of a response. An empty value or an
    /// expiry in the past removes the cookie.
    pub fn store_response_cookies(&mut self, host: &str, headers: &HeaderMap) {
        let now = Utc::now();
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some((name, cookie)) = parse_set_cookie(raw, now) else {
                continue;
            };
            let cookies = self.stored.hosts.entry(host.to_string()).or_default();
            if cookie.value.is_empty() || !cookie.is_live(now) {
                log_trace!("cookie {name} for {host} cleared");
                cookies.remove(&name);
            } else {
                cookies.insert(name, cookie);
            }
        }
    }

    /// Write the jar back to disk, dropping expired cookies first.
    /// In-memory jars are a no-op.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.stored.purge_expired(Utc::now());
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let data = serde_json::to_vec_pretty(&self.stored).context("cannot encode cookies")?;
        std::fs::write(path, data)
            .with_context(|| format!("cannot write cookie file {}", path.display()))?;
        log_trace!("cookie jar saved to {}", path.display());
        Ok(())
    }
}

impl Drop for CookieJar {
    fn drop(&mut self) {
        if let Err(e) = self.save() {
            log_error!("{e:#}");
        }
    }
}

/// Split a `Set-Cookie` value into its name and stored form. `Max-Age`
/// wins over `Expires`; a non-positive `Max-Age` expires immediately.
fn parse_set_cookie(raw: &str, now: DateTime<Utc>) -> Option<(String, StoredCookie)> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut max_age = None;
    let mut expires = None;
    for attr in parts {
        let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
        match key.trim().to_ascii_lowercase().as_str() {
            "max-age" => max_age = val.trim().parse::<i64>().ok(),
            "expires" => expires = parse_http_date(val.trim()),
            _ => {}
        }
    }
    let expires = match max_age {
        Some(secs) => TimeDelta::try_seconds(secs.max(0)).and_then(|d| now.checked_add_signed(d)),
        None => expires,
    };
    Some((
        name.to_string(),
        StoredCookie {
            value: value.trim().to_string(),
            expires,
        },
    ))
}

/// RFC 1123 dates, plus the dashed Netscape form some servers still send.
fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc2822(s) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|n| n.and_utc())
}
