//! Structural validity tracking for a single cached payload

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::payload::Payload;
use crate::resource::ResourceShape;

/// Structural fingerprint of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Number of distinct names (state mapping) or keys (plain mapping)
    Count(usize),

    /// Resource shape could not be inspected; never matches anything
    Unsupported,
}

impl Signature {
    /// Derive the signature of a resource shape
    pub fn derive(shape: ResourceShape) -> Self {
        match shape {
            ResourceShape::NamedMapping { names } => Signature::Count(names),
            ResourceShape::PlainMapping { keys } => Signature::Count(keys),
            ResourceShape::Unsupported { .. } => Signature::Unsupported,
        }
    }

    /// Check whether a freshly derived signature matches this one
    ///
    /// `Unsupported` on either side never matches, itself included.
    pub fn matches(&self, current: &Signature) -> bool {
        match (self, current) {
            (Signature::Count(stored), Signature::Count(live)) => stored == live,
            _ => false,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Count(n) => write!(f, "{}", n),
            Signature::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Wraps one cached payload together with the signature it had when cached
pub struct ValidityChecker<P> {
    payload: Arc<P>,
    signature: Signature,
}

impl<P: Payload> ValidityChecker<P> {
    /// Capture a payload and fingerprint its resource as it is right now
    pub fn new(payload: Arc<P>) -> Self {
        let signature = Self::derive_signature(payload.as_ref());
        Self { payload, signature }
    }

    /// Re-derive the signature against the live resource
    ///
    /// # Returns
    /// * `bool` - True iff the live signature equals the captured one
    pub fn is_valid(&self) -> bool {
        let live = Signature::derive(P::resource_shape(&self.payload));
        self.signature.matches(&live)
    }

    /// The signature captured at construction
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// The original payload (shared, never copied)
    pub fn payload(&self) -> &Arc<P> {
        &self.payload
    }

    fn derive_signature(payload: &P) -> Signature {
        let shape = payload.resource_shape();
        if let ResourceShape::Unsupported { type_name } = shape {
            warn!(
                resource_type = type_name,
                "Model cache: result is neither a state mapping nor a plain mapping, it will never be cached"
            );
        }
        Signature::derive(shape)
    }
}

impl<P> fmt::Debug for ValidityChecker<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidityChecker")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Opaque, StateDict};
    use parking_lot::RwLock;
    use std::collections::HashMap;

    #[test]
    fn test_signature_matches() {
        assert!(Signature::Count(3).matches(&Signature::Count(3)));
        assert!(!Signature::Count(3).matches(&Signature::Count(2)));
        assert!(!Signature::Unsupported.matches(&Signature::Unsupported));
        assert!(!Signature::Count(0).matches(&Signature::Unsupported));
    }

    #[test]
    fn test_valid_until_params_released() {
        let dict: StateDict<f32> = [("w", 0.0), ("b", 0.0)].into_iter().collect();
        let resource = Arc::new(dict);
        let checker = ValidityChecker::new(Arc::new(Arc::clone(&resource)));

        assert_eq!(checker.signature(), Signature::Count(2));
        assert!(checker.is_valid());

        resource.remove("b");
        assert!(!checker.is_valid());
    }

    #[test]
    fn test_count_preserving_drift_goes_undetected() {
        let dict: StateDict<f32> = [("w", 0.0)].into_iter().collect();
        let resource = Arc::new(dict);
        let checker = ValidityChecker::new(Arc::new(Arc::clone(&resource)));

        resource.remove("w");
        resource.insert("other", 1.0);
        assert!(checker.is_valid());
    }

    #[test]
    fn test_plain_mapping_tuple_payload() {
        let map = Arc::new(RwLock::new(HashMap::from([("x", 1), ("y", 2)])));
        let checker = ValidityChecker::new(Arc::new((Arc::clone(&map), "vae")));
        assert!(checker.is_valid());

        map.write().insert("z", 3);
        assert!(!checker.is_valid());
    }

    #[test]
    fn test_unsupported_never_valid() {
        let checker = ValidityChecker::new(Arc::new(Arc::new(Opaque("blob"))));
        assert_eq!(checker.signature(), Signature::Unsupported);
        assert!(!checker.is_valid());
        assert!(!checker.is_valid());
    }

    #[test]
    fn test_payload_identity() {
        let payload = Arc::new(Arc::new(StateDict::<u8>::new()));
        let checker = ValidityChecker::new(Arc::clone(&payload));
        assert!(Arc::ptr_eq(checker.payload(), &payload));
    }
}
