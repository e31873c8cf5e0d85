//! Charm store identifiers.
//!
//! CharmUrl::parse -> CharmUrl { user?, series?, name, revision? }
//! Accepted forms: `[cs:][~user/][series/]name[-revision]`.
//! `path()` renders the identifier the way the store expects it in request paths.
//!
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static USER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-zA-Z0-9+.\-]+$").expect("valid user regex"));
static SERIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+([a-z0-9]+)?$").expect("valid series regex"));
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]*[a-z][a-z0-9]*)*$").expect("valid name regex")
});

/// Reasons an identifier string is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty charm or bundle id")]
    Empty,
    #[error("cannot parse URL {url:?}: schema {schema:?} not supported")]
    UnsupportedSchema { url: String, schema: String },
    #[error("charm or bundle URL {url:?} has invalid user name {user:?}")]
    InvalidUser { url: String, user: String },
    #[error("charm or bundle URL has invalid series: {url:?}")]
    InvalidSeries { url: String },
    #[error("URL has invalid charm or bundle name: {url:?}")]
    InvalidName { url: String },
    #[error("charm or bundle URL has invalid form: {url:?}")]
    InvalidForm { url: String },
}

/// A parsed reference to a charm or bundle in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmUrl {
    pub user: Option<String>,
    pub series: Option<String>,
    pub name: String,
    pub revision: Option<u32>,
}

impl CharmUrl {
    /// Parse a user supplied identifier.
    ///
    /// Examples:
    /// - "wordpress"                  -> name only
    /// - "trusty/wordpress-3"         -> series + revision
    /// - "cs:~bob/trusty/wordpress"   -> user + series
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        let rest = match trimmed.split_once(':') {
            Some(("cs", rest)) => rest,
            Some((schema, _)) => {
                return Err(ParseError::UnsupportedSchema {
                    url: raw.to_string(),
                    schema: schema.to_string(),
                });
            }
            None => trimmed,
        };

        let mut parts: Vec<&str> = rest.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ParseError::InvalidForm {
                url: raw.to_string(),
            });
        }

        let mut user = None;
        if let Some(first) = parts.first()
            && let Some(u) = first.strip_prefix('~')
        {
            if !USER_RE.is_match(u) {
                return Err(ParseError::InvalidUser {
                    url: raw.to_string(),
                    user: u.to_string(),
                });
            }
            user = Some(u.to_string());
            parts.remove(0);
        }

        let (series, last) = match parts.as_slice() {
            [last] => (None, *last),
            [series, last] => {
                if !SERIES_RE.is_match(series) {
                    return Err(ParseError::InvalidSeries {
                        url: raw.to_string(),
                    });
                }
                (Some(series.to_string()), *last)
            }
            _ => {
                return Err(ParseError::InvalidForm {
                    url: raw.to_string(),
                });
            }
        };

        let (name, revision) = split_revision(last);
        if !NAME_RE.is_match(name) {
            return Err(ParseError::InvalidName {
                url: raw.to_string(),
            });
        }

        Ok(CharmUrl {
            user,
            series,
            name: name.to_string(),
            revision,
        })
    }

    /// Identifier without the `cs:` schema, e.g. `~bob/trusty/wordpress-3`.
    pub fn path(&self) -> String {
        let mut out = String::new();
        if let Some(user) = &self.user {
            out.push('~');
            out.push_str(user);
            out.push('/');
        }
        if let Some(series) = &self.series {
            out.push_str(series);
            out.push('/');
        }
        out.push_str(&self.name);
        if let Some(rev) = self.revision {
            out.push_str(&format!("-{rev}"));
        }
        out
    }
}

/// Split a trailing `-<digits>` revision off a name.
fn split_revision(s: &str) -> (&str, Option<u32>) {
    if let Some((name, rev)) = s.rsplit_once('-')
        && !rev.is_empty()
        && rev.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = rev.parse::<u32>()
    {
        return (name, Some(n));
    }
    (s, None)
}

impl fmt::Display for CharmUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cs:{}", self.path())
    }
}
