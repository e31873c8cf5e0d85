/*!
shared.rs - blocking bridge between subcommands and the async store client.

Focus:
  - Session::open : build the Tokio runtime, cookie jar and StoreClient once
  - list_meta_endpoints / meta_any : block_on wrappers used by `show`

One runtime per command; the reqwest connection pool is bound to it, so
all requests of a command go through the same Session.
*/

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::charm::CharmUrl;
use crate::store::jar::CookieJar;
use crate::store::{StoreClient, StoreConfig};
use crate::utils::monotonic_ms;
use crate::{log_debug, log_error};

/* ---- Session ---- */

pub struct Session {
    // Declared first so the jar is saved before the runtime shuts down.
    client: StoreClient,
    rt: tokio::runtime::Runtime,
}

impl Session {
    /// Build the runtime and client. The cookie jar is saved when the
    /// session is dropped, whether or not the command succeeded.
    pub fn open(config: StoreConfig, cookie_file: Option<std::path::PathBuf>) -> Result<Self> {
        let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        let jar = match cookie_file {
            Some(path) => CookieJar::open(&path).unwrap_or_else(|e| {
                log_error!("{e:#}; continuing without stored cookies");
                CookieJar::in_memory()
            }),
            None => CookieJar::in_memory(),
        };
        let client = StoreClient::new(config, jar).context("cannot create the charm store client")?;
        if let Some(path) = client.jar().path() {
            log_debug!("using cookie file {}", path.display());
        }
        Ok(Self { client, rt })
    }

    /* ---- Fetch Helpers ---- */

    pub fn list_meta_endpoints(&mut self) -> Result<Vec<String>> {
        let started = monotonic_ms();
        let endpoints = self.rt.block_on(self.client.list_meta_endpoints())?;
        log_debug!(
            "{} metadata endpoint(s) listed in {} ms",
            endpoints.len(),
            monotonic_ms() - started
        );
        Ok(endpoints)
    }

    pub fn meta_any(&mut self, id: &CharmUrl, includes: &[String]) -> Result<Map<String, Value>> {
        let started = monotonic_ms();
        let meta = self.rt.block_on(self.client.meta_any(id, includes))?;
        log_debug!(
            "meta/any for {id}: {} key(s) in {} ms",
            meta.len(),
            monotonic_ms() - started
        );
        Ok(meta)
    }
}
