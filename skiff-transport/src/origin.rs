//! HTTP origin client — freshness headers and streaming downloads.

use std::fs::File;
use std::io;
use std::path::Path;

use skiff_core::remote::{OriginClient, TransportError};

/// Origin collaborator over plain HTTP.
///
/// `head` follows redirects and reads the `Last-Modified` header; `fetch_to`
/// streams the body straight to disk so payloads never sit in memory.
pub struct HttpOrigin {
    agent: ureq::Agent,
}

impl HttpOrigin {
    pub fn new() -> Self {
        Self {
            agent: crate::agent(),
        }
    }
}

impl Default for HttpOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginClient for HttpOrigin {
    fn head(&self, url: &str) -> Result<Option<String>, TransportError> {
        let resp = self.agent.head(url).call().map_err(crate::classify)?;
        Ok(resp.header("last-modified").map(str::to_owned))
    }

    fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        tracing::debug!("GET {url} -> {}", dest.display());
        let resp = self.agent.get(url).call().map_err(crate::classify)?;
        let mut reader = resp.into_reader();
        let mut file = File::create(dest)?;
        let bytes = io::copy(&mut reader, &mut file)?;
        Ok(bytes)
    }
}
