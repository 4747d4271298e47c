//! Resource shapes and the structural capability check
//!
//! A resource is the object inside a payload whose structure is fingerprinted.
//! Instead of probing types at runtime, every resource reports one of a closed
//! set of shapes through [`Resource::shape`].

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use ahash::AHashSet;
use parking_lot::{Mutex, RwLock};

/// Structural shape of a resource at the instant it is inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceShape {
    /// Resource exposes a named-parameter state mapping (count of distinct names)
    NamedMapping {
        /// Number of distinct parameter names
        names: usize,
    },

    /// Resource is a plain key-value mapping (count of keys)
    PlainMapping {
        /// Number of keys
        keys: usize,
    },

    /// Resource has no inspectable structure
    Unsupported {
        /// Rust type name of the resource, for diagnostics
        type_name: &'static str,
    },
}

impl ResourceShape {
    /// Build a named-mapping shape, counting each distinct name once
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Hash + Eq,
    {
        let distinct: AHashSet<S> = names.into_iter().collect();
        ResourceShape::NamedMapping {
            names: distinct.len(),
        }
    }

    /// Build an unsupported shape tagged with `T`'s type name
    pub fn unsupported<T: ?Sized>() -> Self {
        ResourceShape::Unsupported {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// Capability implemented by anything that can sit at the front of a payload
///
/// Implementations must read the *live* state every time: external code may
/// release parts of the resource while it is cached.
pub trait Resource: Send + Sync {
    /// Report the resource's current shape
    fn shape(&self) -> ResourceShape;
}

impl<K, V, S> Resource for RwLock<HashMap<K, V, S>>
where
    K: Send + Sync,
    V: Send + Sync,
    S: Send + Sync,
{
    fn shape(&self) -> ResourceShape {
        ResourceShape::PlainMapping {
            keys: self.read().len(),
        }
    }
}

impl<K, V, S> Resource for Mutex<HashMap<K, V, S>>
where
    K: Send,
    V: Send,
    S: Send,
{
    fn shape(&self) -> ResourceShape {
        ResourceShape::PlainMapping {
            keys: self.lock().len(),
        }
    }
}

impl<K, V> Resource for RwLock<BTreeMap<K, V>>
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn shape(&self) -> ResourceShape {
        ResourceShape::PlainMapping {
            keys: self.read().len(),
        }
    }
}

impl<K, V> Resource for Mutex<BTreeMap<K, V>>
where
    K: Send,
    V: Send,
{
    fn shape(&self) -> ResourceShape {
        ResourceShape::PlainMapping {
            keys: self.lock().len(),
        }
    }
}

/// Ordered named-parameter container shared with an external runtime
///
/// Names are unique; inserting an existing name replaces its value in place.
/// The runtime may release parameters at any time (for example when offloading
/// them from an accelerator), which shrinks the reported shape.
#[derive(Debug)]
pub struct StateDict<T> {
    params: RwLock<Vec<(String, T)>>,
}

impl<T> StateDict<T> {
    /// Create an empty state dict
    pub fn new() -> Self {
        Self {
            params: RwLock::new(Vec::new()),
        }
    }

    /// Insert or replace a parameter, returning the previous value
    pub fn insert(&self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        let mut params = self.params.write();
        match params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                params.push((name, value));
                None
            }
        }
    }

    /// Remove a parameter by name
    pub fn remove(&self, name: &str) -> Option<T> {
        let mut params = self.params.write();
        let idx = params.iter().position(|(n, _)| n == name)?;
        Some(params.remove(idx).1)
    }

    /// Release every parameter whose name matches `pred`
    ///
    /// # Returns
    /// * `usize` - Number of parameters released
    pub fn release_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut params = self.params.write();
        let before = params.len();
        params.retain(|(n, _)| !pred(n.as_str()));
        before - params.len()
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.params.read().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Check whether a parameter is present
    pub fn contains(&self, name: &str) -> bool {
        self.params.read().iter().any(|(n, _)| n == name)
    }

    /// Number of parameters currently held
    pub fn len(&self) -> usize {
        self.params.read().len()
    }

    /// Check if every parameter has been released
    pub fn is_empty(&self) -> bool {
        self.params.read().is_empty()
    }
}

impl<T: Clone> StateDict<T> {
    /// Clone a parameter's value out of the dict
    pub fn get(&self, name: &str) -> Option<T> {
        self.params
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

impl<T> Default for StateDict<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Into<String>, T> FromIterator<(N, T)> for StateDict<T> {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let dict = StateDict::new();
        for (name, value) in iter {
            dict.insert(name, value);
        }
        dict
    }
}

impl<T: Send + Sync> Resource for StateDict<T> {
    fn shape(&self) -> ResourceShape {
        let params = self.params.read();
        ResourceShape::named(params.iter().map(|(n, _)| n.as_str()))
    }
}

/// Resource with no inspectable structure
///
/// Payloads fronted by an `Opaque` are accepted by the store but never
/// validate, so they are rebuilt on every call.
#[derive(Debug, Clone, Default)]
pub struct Opaque<T>(pub T);

impl<T: Send + Sync> Resource for Opaque<T> {
    fn shape(&self) -> ResourceShape {
        ResourceShape::unsupported::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_counts_distinct() {
        let shape = ResourceShape::named(["w", "b", "w"]);
        assert_eq!(shape, ResourceShape::NamedMapping { names: 2 });
    }

    #[test]
    fn test_plain_mapping_tracks_live_state() {
        let map: RwLock<HashMap<&str, u32>> = RwLock::new(HashMap::new());
        map.write().insert("x", 1);
        map.write().insert("y", 2);
        assert_eq!(map.shape(), ResourceShape::PlainMapping { keys: 2 });

        map.write().remove("y");
        assert_eq!(map.shape(), ResourceShape::PlainMapping { keys: 1 });
    }

    #[test]
    fn test_btree_mapping() {
        let map = Mutex::new(BTreeMap::from([(1, "a"), (2, "b"), (3, "c")]));
        assert_eq!(map.shape(), ResourceShape::PlainMapping { keys: 3 });
    }

    #[test]
    fn test_state_dict_insert_replaces() {
        let dict = StateDict::new();
        assert_eq!(dict.insert("layer.weight", 1.0f32), None);
        assert_eq!(dict.insert("layer.weight", 2.0f32), Some(1.0));
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("layer.weight"), Some(2.0));
    }

    #[test]
    fn test_state_dict_release_where() {
        let dict: StateDict<u8> = [("enc.w", 0), ("enc.b", 1), ("dec.w", 2)]
            .into_iter()
            .collect();

        assert_eq!(dict.shape(), ResourceShape::NamedMapping { names: 3 });

        let released = dict.release_where(|n| n.starts_with("enc."));
        assert_eq!(released, 2);
        assert_eq!(dict.names(), vec!["dec.w".to_string()]);
        assert_eq!(dict.shape(), ResourceShape::NamedMapping { names: 1 });
    }

    #[test]
    fn test_state_dict_remove() {
        let dict: StateDict<u8> = [("a", 0), ("b", 1)].into_iter().collect();
        assert_eq!(dict.remove("a"), Some(0));
        assert_eq!(dict.remove("a"), None);
        assert!(!dict.contains("a"));
        assert!(dict.contains("b"));
    }

    #[test]
    fn test_opaque_is_unsupported() {
        let shape = Opaque(42u64).shape();
        assert!(matches!(shape, ResourceShape::Unsupported { type_name } if type_name == "u64"));
    }
}
