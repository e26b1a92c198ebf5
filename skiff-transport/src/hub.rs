//! Dataset hub client.
//!
//! Speaks the hub's REST surface:
//!
//! ```text
//! GET  {endpoint}/api/repos/{repo}/tree/{revision}            file listing (JSON)
//! GET  {endpoint}/api/repos/{repo}/resolve/{revision}/{path}  raw bytes
//! PUT  {endpoint}/api/repos/{repo}/upload/{revision}/{path}   raw upload, ?message=…
//! POST {endpoint}/api/repos/{repo}/branches                   create branch
//! ```
//!
//! Revisions may contain `/` (e.g. `backup/raw`) and are percent-encoded in
//! URL segments. Authentication is an optional bearer token.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use skiff_core::remote::{MirrorClient, RemoteEntry, TransportError};

/// Mirror-store collaborator over the hub REST API.
pub struct HubClient {
    agent: ureq::Agent,
    endpoint: String,
    repo: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(default)]
    last_modified: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Serialize)]
struct BranchRequest<'a> {
    branch: &'a str,
}

impl HubClient {
    pub fn new(endpoint: &str, repo: &str, token: Option<String>) -> Self {
        Self {
            agent: crate::agent(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            token,
        }
    }

    fn tree_url(&self, revision: &str) -> String {
        format!(
            "{}/api/repos/{}/tree/{}",
            self.endpoint,
            self.repo,
            encode_revision(revision)
        )
    }

    fn resolve_url(&self, revision: &str, repo_path: &str) -> String {
        format!(
            "{}/api/repos/{}/resolve/{}/{}",
            self.endpoint,
            self.repo,
            encode_revision(revision),
            repo_path
        )
    }

    fn upload_url(&self, revision: &str, repo_path: &str) -> String {
        format!(
            "{}/api/repos/{}/upload/{}/{}",
            self.endpoint,
            self.repo,
            encode_revision(revision),
            repo_path
        )
    }

    fn branches_url(&self) -> String {
        format!("{}/api/repos/{}/branches", self.endpoint, self.repo)
    }

    fn authed(&self, req: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => req.set("authorization", &format!("Bearer {token}")),
            None => req,
        }
    }
}

/// Revision names may contain `/`; encode it so the revision stays one URL
/// segment.
fn encode_revision(revision: &str) -> String {
    revision.replace('/', "%2F")
}

impl MirrorClient for HubClient {
    fn list_revision(&self, revision: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let url = self.tree_url(revision);
        tracing::debug!("GET {url}");
        let resp = self
            .authed(self.agent.get(&url))
            .call()
            .map_err(crate::classify)?;
        let entries: Vec<TreeEntry> =
            resp.into_json().map_err(|e| TransportError::Malformed {
                url,
                detail: e.to_string(),
            })?;
        Ok(entries
            .into_iter()
            .map(|e| RemoteEntry {
                path: e.path,
                last_modified: e.last_modified,
                size: e.size,
            })
            .collect())
    }

    fn read_to(&self, repo_path: &str, revision: &str, dest: &Path) -> Result<(), TransportError> {
        let url = self.resolve_url(revision, repo_path);
        tracing::debug!("GET {url} -> {}", dest.display());
        let resp = self
            .authed(self.agent.get(&url))
            .call()
            .map_err(crate::classify)?;
        let mut reader = resp.into_reader();
        let mut file = File::create(dest)?;
        io::copy(&mut reader, &mut file)?;
        Ok(())
    }

    fn write(
        &self,
        local: &Path,
        repo_path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        let url = self.upload_url(revision, repo_path);
        tracing::debug!("PUT {url}");
        let file = File::open(local)?;
        self.authed(self.agent.put(&url))
            .query("message", message)
            .send(file)
            .map_err(crate::classify)?;
        Ok(())
    }

    fn ensure_branch(&self, revision: &str) -> Result<(), TransportError> {
        let url = self.branches_url();
        let result = self
            .authed(self.agent.post(&url))
            .send_json(BranchRequest { branch: revision });
        match result {
            Ok(_) => Ok(()),
            // Already exists: creating a branch is idempotent.
            Err(ureq::Error::Status(409, _)) => Ok(()),
            Err(e) => Err(crate::classify(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
