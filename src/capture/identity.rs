use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::capture::scene::SceneGraph;

/// Opaque, session-unique identity tag of one visual element (`<Kind>_<uuid>`).
///
/// Tags are minted from random UUIDs and never reused, so two capture sessions over the same
/// scene never share identities.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Mint a fresh tag for an element of kind `kind`.
    pub fn mint(kind: &str) -> Self {
        let kind: String = kind
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        let kind = if kind.is_empty() { "Element" } else { &kind };
        Self(format!("{kind}_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Wrap an existing tag (e.g. read back from an artifact).
    pub fn from_raw(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Borrow the tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry from element handle to identity, populated once per capture session.
#[derive(Clone, Debug)]
pub struct IdentityTracker<K> {
    ids: HashMap<K, ElementId>,
    // Assignment rank: children before parents, siblings in draw order.
    rank: HashMap<K, usize>,
    order: Vec<K>,
}

impl<K> Default for IdentityTracker<K> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            rank: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> IdentityTracker<K> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every identity and tag every element reachable from the scene root.
    ///
    /// Traversal is an explicit-stack depth-first walk that visits children before their parent
    /// and keeps siblings in draw order. Elements reachable along several paths are tagged once.
    /// Returns the number of tagged elements.
    pub fn assign_all<S>(&mut self, scene: &S) -> usize
    where
        S: SceneGraph<Key = K>,
    {
        self.ids.clear();
        self.rank.clear();
        self.order.clear();

        let mut entered = HashSet::new();
        let mut stack = vec![(scene.root(), false)];
        while let Some((key, expanded)) = stack.pop() {
            if self.ids.contains_key(&key) {
                continue;
            }
            if expanded {
                self.rank.insert(key, self.order.len());
                self.order.push(key);
                self.ids.insert(key, ElementId::mint(scene.kind_name(key)));
                continue;
            }
            if !entered.insert(key) {
                continue;
            }
            stack.push((key, true));
            for child in scene.children(key).iter().rev() {
                if !self.ids.contains_key(child) {
                    stack.push((*child, false));
                }
            }
        }
        self.order.len()
    }

    /// Identity of `key`, if it was present at assignment time.
    pub fn identity(&self, key: K) -> Option<&ElementId> {
        self.ids.get(&key)
    }

    /// Assignment rank of `key` (children before parents, siblings in draw order).
    pub fn rank(&self, key: K) -> Option<usize> {
        self.rank.get(&key).copied()
    }

    /// Return `true` when `key` was tagged.
    pub fn contains(&self, key: K) -> bool {
        self.ids.contains_key(&key)
    }

    /// Number of tagged elements.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Return `true` when nothing has been tagged.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Handles and identities in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &ElementId)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.ids.get(key).map(|id| (*key, id)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/identity.rs"]
mod tests;
