//! Merging of concurrent scene edits.

use scenesync_codec::Element;
use std::collections::{HashMap, HashSet};

/// Editor state that influences reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// Elements the local user is currently editing.
    pub editing_element_ids: HashSet<String>,
}

impl AppState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `ids` as being edited locally.
    pub fn with_editing<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.editing_element_ids
            .extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Merges local edits with the elements last persisted by other clients.
///
/// Implementations must be pure and deterministic in their three inputs.
/// An element present on only one side survives; an element present on both
/// resolves to the copy with the higher version.
pub trait Reconciler: Send + Sync {
    /// Returns the merged sequence superseding both inputs.
    fn reconcile(&self, local: &[Element], remote: &[Element], app_state: &AppState)
        -> Vec<Element>;
}

/// Version-based reconciliation.
///
/// - higher `version` wins
/// - on equal versions the lower `version_nonce` wins, and a full tie keeps
///   the remote copy
/// - elements being edited locally always keep the local copy
///
/// Output keeps local order, followed by remote-only elements in remote
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionReconciler;

impl VersionReconciler {
    fn prefers_remote(local: &Element, remote: &Element, app_state: &AppState) -> bool {
        if app_state.editing_element_ids.contains(&local.id) {
            return false;
        }
        if remote.version != local.version {
            return remote.version > local.version;
        }
        remote.version_nonce <= local.version_nonce
    }
}

impl Reconciler for VersionReconciler {
    fn reconcile(
        &self,
        local: &[Element],
        remote: &[Element],
        app_state: &AppState,
    ) -> Vec<Element> {
        let mut remote_by_id: HashMap<&str, &Element> = HashMap::with_capacity(remote.len());
        for element in remote {
            remote_by_id.entry(element.id.as_str()).or_insert(element);
        }

        let mut merged = Vec::with_capacity(local.len().max(remote.len()));
        let mut placed: HashSet<&str> = HashSet::with_capacity(local.len());

        for element in local {
            if !placed.insert(element.id.as_str()) {
                continue;
            }
            let chosen = match remote_by_id.get(element.id.as_str()) {
                Some(theirs) if Self::prefers_remote(element, theirs, app_state) => *theirs,
                _ => element,
            };
            merged.push(chosen.clone());
        }

        for element in remote {
            if placed.insert(element.id.as_str()) {
                merged.push(element.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(elements: &[Element]) -> Vec<(&str, u64)> {
        elements.iter().map(|e| (e.id.as_str(), e.version)).collect()
    }

    #[test]
    fn union_with_higher_version_winning() {
        let local = vec![Element::new("a", 2), Element::new("b", 1)];
        let remote = vec![Element::new("a", 1), Element::new("c", 1)];

        let merged = VersionReconciler.reconcile(&local, &remote, &AppState::new());
        assert_eq!(ids(&merged), vec![("a", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn remote_newer_replaces_local() {
        let local = vec![Element::new("a", 1)];
        let remote = vec![Element::new("a", 4).with_field("x", 9.into())];

        let merged = VersionReconciler.reconcile(&local, &remote, &AppState::new());
        assert_eq!(merged, remote);
    }

    #[test]
    fn never_drops_remote_only_elements() {
        let remote = vec![Element::new("x", 1), Element::new("y", 7)];
        let merged = VersionReconciler.reconcile(&[], &remote, &AppState::new());
        assert_eq!(merged, remote);
    }

    #[test]
    fn ties_break_on_lower_nonce() {
        let local = vec![Element::new("a", 3).with_nonce(50)];
        let remote = vec![Element::new("a", 3).with_nonce(10)];

        let merged = VersionReconciler.reconcile(&local, &remote, &AppState::new());
        assert_eq!(merged[0].version_nonce, 10);

        // symmetric: the other client reaches the same result
        let merged = VersionReconciler.reconcile(&remote, &local, &AppState::new());
        assert_eq!(merged[0].version_nonce, 10);
    }

    #[test]
    fn full_tie_keeps_remote_copy() {
        let local = vec![Element::new("a", 3).with_nonce(7).with_field("side", "local".into())];
        let remote = vec![Element::new("a", 3).with_nonce(7).with_field("side", "remote".into())];

        let merged = VersionReconciler.reconcile(&local, &remote, &AppState::new());
        assert_eq!(merged, remote);
    }

    #[test]
    fn editing_keeps_local_copy() {
        let local = vec![Element::new("a", 1)];
        let remote = vec![Element::new("a", 9)];
        let state = AppState::new().with_editing(["a"]);

        let merged = VersionReconciler.reconcile(&local, &remote, &state);
        assert_eq!(ids(&merged), vec![("a", 1)]);
    }

    #[test]
    fn deterministic() {
        let local = vec![Element::new("a", 2), Element::new("b", 5)];
        let remote = vec![Element::new("b", 6), Element::new("c", 1)];
        let first = VersionReconciler.reconcile(&local, &remote, &AppState::new());
        let second = VersionReconciler.reconcile(&local, &remote, &AppState::new());
        assert_eq!(first, second);
    }
}
