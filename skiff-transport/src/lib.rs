//! # skiff-transport
//!
//! `ureq`-backed implementations of the skiff collaborator traits:
//! [`HttpOrigin`] for the upstream origin and [`HubClient`] for the managed
//! dataset hub. All calls are blocking with per-call timeouts; retry and
//! fallback policy live in skiff-sync, not here.

pub mod hub;
pub mod origin;

pub use hub::HubClient;
pub use origin::HttpOrigin;

use std::time::Duration;

use skiff_core::remote::TransportError;

/// Shared agent construction: per-call connect/read timeouts, redirects on.
pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout_read(Duration::from_secs(60))
        .build()
}

/// Map a ureq failure onto the transport error kinds the sync engine
/// distinguishes.
pub(crate) fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, resp) => TransportError::Status {
            status,
            url: resp.get_url().to_string(),
        },
        ureq::Error::Transport(t) => TransportError::Connect(t.to_string()),
    }
}
