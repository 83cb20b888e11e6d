// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tags declared in test and suite names.
//!
//! A label such as `"handles large inputs [slow] @integration"` declares the tags `slow` and
//! `integration`. Tags are stored once in a [`TagStore`] and shared by every node that carries
//! them. A child node always carries its parent's tags as well.

use regex::Regex;
use smol_str::SmolStr;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{Arc, LazyLock, Mutex},
};

/// A tag identifier, always lowercase.
///
/// Cloning a tag is cheap: every clone refers to the same allocation in the store that created
/// it.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tag(Arc<str>);

impl Tag {
    /// Returns the tag identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if both tags share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of tags attached to a node.
pub type TagSet = BTreeSet<Tag>;

/// Get-or-create access to a shared set of tags.
///
/// The scanner takes this as a capability so that tests can substitute their own store.
pub trait TagStore {
    /// Returns the tag with the given identifier, creating it if it doesn't exist yet.
    ///
    /// `id` is already lowercase.
    fn get_or_create(&self, id: &str) -> Tag;
}

impl<T: TagStore + ?Sized> TagStore for &T {
    fn get_or_create(&self, id: &str) -> Tag {
        (**self).get_or_create(id)
    }
}

impl<T: TagStore + ?Sized> TagStore for Arc<T> {
    fn get_or_create(&self, id: &str) -> Tag {
        (**self).get_or_create(id)
    }
}

/// The default [`TagStore`]: an append-only registry that may be shared across threads.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: Mutex<BTreeMap<SmolStr, Tag>>,
}

impl TagRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct tags created so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no tags have been created.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns all tags created so far, in sorted order.
    pub fn tags(&self) -> Vec<Tag> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SmolStr, Tag>> {
        // The map is only ever appended to, so a panic while the lock was held can't leave it
        // in an inconsistent state.
        self.tags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TagStore for TagRegistry {
    fn get_or_create(&self, id: &str) -> Tag {
        self.lock()
            .entry(SmolStr::new(id))
            .or_insert_with(|| Tag(Arc::from(id)))
            .clone()
    }
}

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\[([\w-]+)\])|(?:(?:^|[^\w])@([\w-]+))").expect("tag regex is valid")
});

/// Returns the tag identifiers declared in `label`, lowercased, in order of first appearance.
pub fn tag_ids(label: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for captures in TAG_REGEX.captures_iter(label) {
        let Some(m) = captures.get(1).or_else(|| captures.get(2)) else {
            continue;
        };
        let id = m.as_str().to_lowercase();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Computes the tags for a node declared with `label` under a parent carrying `parent_tags`.
///
/// The label itself is not modified.
pub fn extract_tags(label: &str, parent_tags: &TagSet, store: &impl TagStore) -> TagSet {
    let mut tags = parent_tags.clone();
    tags.extend(tag_ids(label).iter().map(|id| store.get_or_create(id)));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, thread};
    use test_case::test_case;

    #[test_case("plain name", &[] ; "no tags")]
    #[test_case("works [fast]", &["fast"] ; "bracket")]
    #[test_case("works @Smoke", &["smoke"] ; "at sign lowercased")]
    #[test_case("[DB] query @db [slow]", &["db", "slow"] ; "duplicates collapse")]
    #[test_case("@a-b and [c_d]", &["a-b", "c_d"] ; "dashes and underscores")]
    #[test_case("mail user@example.com", &[] ; "email is not a tag")]
    #[test_case("(@wrapped)", &["wrapped"] ; "after punctuation")]
    #[test_case("[not a tag]", &[] ; "spaces in brackets")]
    fn tag_ids_from_label(label: &str, expected: &[&str]) {
        assert_eq!(tag_ids(label), expected);
    }

    #[test]
    fn registry_returns_shared_tags() {
        let registry = TagRegistry::new();
        let a = registry.get_or_create("slow");
        let b = registry.get_or_create("slow");
        assert!(a.ptr_eq(&b), "same tag returned twice");
        assert_eq!(registry.len(), 1);

        registry.get_or_create("fast");
        assert_eq!(
            registry
                .tags()
                .iter()
                .map(|tag| tag.as_str())
                .collect::<Vec<_>>(),
            ["fast", "slow"]
        );
    }

    #[test]
    fn registry_concurrent_access() {
        let registry = Arc::new(TagRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        registry.get_or_create(&format!("tag-{}", (i + j) % 10));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread didn't panic");
        }
        assert_eq!(registry.len(), 10);
    }

    #[derive(Default)]
    struct RecordingStore {
        requested: RefCell<Vec<String>>,
    }

    impl TagStore for RecordingStore {
        fn get_or_create(&self, id: &str) -> Tag {
            self.requested.borrow_mut().push(id.to_owned());
            Tag(Arc::from(id))
        }
    }

    #[test]
    fn extract_inherits_parent_tags() {
        let store = RecordingStore::default();
        let parent: TagSet = [store.get_or_create("integration")].into_iter().collect();
        store.requested.borrow_mut().clear();

        let tags = extract_tags("child [Slow]", &parent, &store);
        assert_eq!(
            tags.iter().map(|tag| tag.as_str()).collect::<Vec<_>>(),
            ["integration", "slow"]
        );
        assert_eq!(*store.requested.borrow(), ["slow"]);

        let untagged = extract_tags("plain child", &parent, &store);
        assert_eq!(untagged, parent);
    }
}
