//! Freshness resolution — per-artifact skip / reuse / fetch decisions.
//!
//! Decision precedence:
//! 1. Local copy present and the manifest marker equals the origin marker →
//!    `Skip`. Decisive: the mirror is never queried.
//! 2. Otherwise the deferred mirror lookup runs:
//!    a. mirror marker equals the origin marker → `ReuseMirror`
//!    b. mirror holds the file but reports no marker, and the manifest
//!       marker equals the origin marker → `ReuseMirror` (weaker trust
//!       path — the manifest vouches for a store that cannot; logged)
//!    c. anything else → `FetchOrigin`
//!
//! Markers are opaque: equality-comparable only, no ordering. The caller
//! maps an irrecoverably failed mirror lookup to [`MirrorState::Absent`]
//! (case 2c) and handles an unreachable origin before ever calling
//! [`resolve`].

/// What a run does with one artifact. Computed fresh per artifact per run;
/// never held as long-lived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// The local copy is already current; no transfer at all.
    Skip,
    /// The hub already holds the current content; download it instead of
    /// re-fetching from the origin.
    ReuseMirror,
    /// Fetch from the origin and upload.
    FetchOrigin,
}

/// The hub's knowledge of an artifact on its revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorState {
    /// Not in the listing, or the listing was unreachable.
    Absent,
    /// Present, but the store reports no modification marker for it.
    NoMarker,
    /// Present with a modification marker.
    Marker(String),
}

/// Decide the action for one artifact. `mirror_lookup` is deferred because
/// it is a network call; it runs at most once, and not at all when the
/// local-current check already settles the decision.
pub fn resolve(
    artifact: &str,
    origin_marker: &str,
    manifest_marker: Option<&str>,
    local_present: bool,
    mirror_lookup: impl FnOnce() -> MirrorState,
) -> SyncDecision {
    if local_present && manifest_marker == Some(origin_marker) {
        return SyncDecision::Skip;
    }

    match mirror_lookup() {
        MirrorState::Marker(marker) if marker == origin_marker => SyncDecision::ReuseMirror,
        MirrorState::NoMarker if manifest_marker == Some(origin_marker) => {
            tracing::warn!(
                "{artifact}: mirror reports no modification marker; trusting the manifest record"
            );
            SyncDecision::ReuseMirror
        }
        _ => SyncDecision::FetchOrigin,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const ORIGIN: &str = "Tue, 01 Apr 2025 00:00:00 GMT";

    #[test]
    fn local_current_skips_regardless_of_mirror_state() {
        for mirror in [
            MirrorState::Absent,
            MirrorState::NoMarker,
            MirrorState::Marker("something else".into()),
            MirrorState::Marker(ORIGIN.into()),
        ] {
            let decision = resolve("a", ORIGIN, Some(ORIGIN), true, move || mirror);
            assert_eq!(decision, SyncDecision::Skip);
        }
    }

    #[test]
    fn local_current_never_queries_the_mirror() {
        let looked = Cell::new(false);
        let decision = resolve("a", ORIGIN, Some(ORIGIN), true, || {
            looked.set(true);
            MirrorState::Absent
        });
        assert_eq!(decision, SyncDecision::Skip);
        assert!(!looked.get(), "skip must not pay for a mirror lookup");
    }

    #[test]
    fn stale_manifest_with_missing_local_copy_does_not_skip() {
        let decision = resolve("a", ORIGIN, Some(ORIGIN), false, || MirrorState::Absent);
        assert_eq!(decision, SyncDecision::FetchOrigin);
    }

    #[test]
    fn mirror_marker_match_reuses() {
        let decision = resolve("a", ORIGIN, Some("older"), false, || {
            MirrorState::Marker(ORIGIN.into())
        });
        assert_eq!(decision, SyncDecision::ReuseMirror);
    }

    #[test]
    fn mirror_marker_match_reuses_even_without_manifest_entry() {
        let decision = resolve("a", ORIGIN, None, false, || MirrorState::Marker(ORIGIN.into()));
        assert_eq!(decision, SyncDecision::ReuseMirror);
    }

    #[test]
    fn no_marker_with_matching_manifest_reuses() {
        let decision = resolve("a", ORIGIN, Some(ORIGIN), false, || MirrorState::NoMarker);
        assert_eq!(decision, SyncDecision::ReuseMirror);
    }

    #[test]
    fn no_marker_with_differing_manifest_fetches() {
        let decision = resolve("a", ORIGIN, Some("older"), false, || MirrorState::NoMarker);
        assert_eq!(decision, SyncDecision::FetchOrigin);

        let decision = resolve("a", ORIGIN, None, false, || MirrorState::NoMarker);
        assert_eq!(decision, SyncDecision::FetchOrigin);
    }

    #[test]
    fn absent_mirror_fetches() {
        let decision = resolve("a", ORIGIN, Some("older"), true, || MirrorState::Absent);
        assert_eq!(decision, SyncDecision::FetchOrigin);
    }

    #[test]
    fn differing_mirror_marker_fetches() {
        let decision = resolve("a", ORIGIN, None, false, || {
            MirrorState::Marker("Sat, 01 Mar 2025 00:00:00 GMT".into())
        });
        assert_eq!(decision, SyncDecision::FetchOrigin);
    }
}
