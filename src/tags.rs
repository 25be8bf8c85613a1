//! Organisational tags applied uniformly across a resource graph.
//!
//! Tagging is a blanket policy: every node reachable from the root receives
//! every tag. Tags are a mapping, so reapplying the same set is a no-op.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Ordered mapping from tag key to tag value.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    /// Creates an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a tag, returning the set for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a tag in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merges `other` into this set; keys in `other` win.
    pub fn extend(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }

    /// Value for `key`, if tagged.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every tag in `other` is present here with the same value.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other.iter().all(|(key, value)| self.get(key) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for TagSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

/// A single `key=value` tag supplied on the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagPair {
    /// Tag key.
    pub key: String,
    /// Tag value; may be empty.
    pub value: String,
}

/// Raised when a `key=value` tag cannot be parsed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TagPairError {
    /// The input has no `=` separator.
    #[error("tag `{0}` must be written as key=value")]
    MissingSeparator(String),
    /// The key before `=` is blank.
    #[error("tag `{0}` has an empty key")]
    EmptyKey(String),
}

impl FromStr for TagPair {
    type Err = TagPairError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| TagPairError::MissingSeparator(raw.to_owned()))?;
        let trimmed_key = key.trim();
        if trimmed_key.is_empty() {
            return Err(TagPairError::EmptyKey(raw.to_owned()));
        }
        Ok(Self {
            key: trimmed_key.to_owned(),
            value: value.trim().to_owned(),
        })
    }
}

/// A node in a tree that carries tags.
///
/// Implemented by whatever graph representation is being tagged; the tag
/// walk only needs mutable access to a node's tags and its children.
pub trait Taggable {
    /// Mutable access to this node's tags.
    fn tags_mut(&mut self) -> &mut TagSet;

    /// Mutable access to this node's direct children.
    fn children_mut(&mut self) -> &mut [Self]
    where
        Self: Sized;
}

/// Applies every tag in `tags` to `root` and every node beneath it.
///
/// Existing tags with the same key are overwritten; other tags are kept.
pub fn apply_tags<N: Taggable>(tags: &TagSet, root: &mut N) {
    let mut pending: Vec<&mut N> = vec![root];
    while let Some(node) = pending.pop() {
        node.tags_mut().extend(tags);
        pending.extend(node.children_mut().iter_mut());
    }
}

/// Pure form of [`apply_tags`]: consumes the graph and returns it tagged.
#[must_use]
pub fn with_tags<N: Taggable>(tags: &TagSet, mut root: N) -> N {
    apply_tags(tags, &mut root);
    root
}
