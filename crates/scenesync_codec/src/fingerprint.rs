//! Scene fingerprints.

use crate::element::Element;
use serde::{Deserialize, Serialize};
use std::fmt;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
// Never appears inside UTF-8, so `("ab", 1)` and `("a", ..)` cannot alias.
const ID_TERMINATOR: u8 = 0xff;

/// Deterministic digest of an element sequence's identities and versions.
///
/// Two sequences with the same fingerprint are treated as the same scene for
/// staleness checks. This is a content digest, not a logical clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneVersion(pub u64);

impl fmt::Display for SceneVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Computes the fingerprint of `elements` (FNV-1a over `id`, `version`).
///
/// Sensitive to order, identity and version; ignores every other field.
pub fn hash_elements_version(elements: &[Element]) -> SceneVersion {
    let mut hash = FNV_OFFSET_BASIS;
    for element in elements {
        hash = mix(hash, element.id.as_bytes());
        hash = mix(hash, &[ID_TERMINATOR]);
        hash = mix(hash, &element.version.to_le_bytes());
    }
    SceneVersion(hash)
}

fn mix(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_for_unchanged_sequence() {
        let elements = vec![Element::new("a", 1), Element::new("b", 4)];
        assert_eq!(
            hash_elements_version(&elements),
            hash_elements_version(&elements.clone())
        );
    }

    #[test]
    fn sensitive_to_version() {
        let before = vec![Element::new("a", 1)];
        let after = vec![Element::new("a", 2)];
        assert_ne!(hash_elements_version(&before), hash_elements_version(&after));
    }

    #[test]
    fn sensitive_to_identity_and_order() {
        let ab = vec![Element::new("a", 1), Element::new("b", 1)];
        let ba = vec![Element::new("b", 1), Element::new("a", 1)];
        let ac = vec![Element::new("a", 1), Element::new("c", 1)];
        assert_ne!(hash_elements_version(&ab), hash_elements_version(&ba));
        assert_ne!(hash_elements_version(&ab), hash_elements_version(&ac));
    }

    #[test]
    fn ignores_payload_fields() {
        let plain = vec![Element::new("a", 1)];
        let styled = vec![Element::new("a", 1).with_field("strokeColor", "#000".into())];
        assert_eq!(hash_elements_version(&plain), hash_elements_version(&styled));
    }

    #[test]
    fn empty_scene_has_fixed_fingerprint() {
        assert_eq!(hash_elements_version(&[]), SceneVersion(FNV_OFFSET_BASIS));
    }
}
