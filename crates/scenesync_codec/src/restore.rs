//! Normalization of decoded element sequences.

use crate::element::Element;
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Normalizes a decoded sequence.
///
/// - elements with an empty id are dropped
/// - for duplicated ids the first occurrence wins
/// - versions are clamped to at least 1
pub fn restore_elements(elements: Vec<Element>) -> Vec<Element> {
    let mut seen = HashSet::with_capacity(elements.len());
    elements
        .into_iter()
        .filter(|element| !element.id.is_empty())
        .filter(|element| seen.insert(element.id.clone()))
        .map(|mut element| {
            element.version = element.version.max(1);
            element
        })
        .collect()
}

/// Keeps only the elements that should be persisted at `now_ms`.
pub fn syncable_elements(elements: Vec<Element>, now_ms: u64, timeout: Duration) -> Vec<Element> {
    elements
        .into_iter()
        .filter(|element| element.is_syncable(now_ms, timeout))
        .collect()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::DELETED_ELEMENT_TIMEOUT;

    #[test]
    fn restore_drops_duplicates_keeping_first() {
        let restored = restore_elements(vec![
            Element::new("a", 3),
            Element::new("b", 1),
            Element::new("a", 9),
        ]);
        let ids: Vec<_> = restored.iter().map(|e| (e.id.as_str(), e.version)).collect();
        assert_eq!(ids, vec![("a", 3), ("b", 1)]);
    }

    #[test]
    fn restore_drops_anonymous_and_clamps_version() {
        let restored = restore_elements(vec![Element::new("", 2), Element::new("z", 0)]);
        assert_eq!(restored, vec![Element::new("z", 1)]);
    }

    #[test]
    fn syncable_filter_keeps_recent_deletions() {
        let now = 10 * DELETED_ELEMENT_TIMEOUT.as_millis() as u64;
        let kept = syncable_elements(
            vec![
                Element::new("live", 1),
                Element::new("fresh-delete", 2).with_updated(now - 1_000).deleted(),
                Element::new("old-delete", 2).with_updated(0).deleted(),
            ],
            now,
            DELETED_ELEMENT_TIMEOUT,
        );
        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["live", "fresh-delete"]);
    }

    #[test]
    fn clock_is_after_epoch() {
        assert!(now_millis() > 0);
    }
}
