//! Composite cache key: `(set, pk, tags)`.

use core::fmt;

const SEP: char = '_';

/// Identifies a single cached record by the partition it lives in (`set`),
/// its unique identifier within that partition (`pk`), and zero or more
/// `tags` used for bulk invalidation by the remote byte cache.
///
/// Tags are kept in insertion order; uniqueness among them is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key {
    /// Name of the partition (set) this key belongs to.
    pub set: String,
    /// Unique identifier within `set`.
    pub pk: String,
    /// Tags attached to this record, in insertion order.
    pub tags: Vec<String>,
}

impl Key {
    /// Creates a key with no tags.
    pub fn new(set: impl Into<String>, pk: impl Into<String>) -> Self {
        Self {
            set: set.into(),
            pk: pk.into(),
            tags: Vec::new(),
        }
    }

    /// Creates a key with the given tags.
    pub fn with_tags(
        set: impl Into<String>,
        pk: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            set: set.into(),
            pk: pk.into(),
            tags,
        }
    }

    /// Returns the deterministic string identity of this key:
    /// `"<set>_<pk>"`, or `"<set>_<pk>_<tag1>_<tag2>..."` when tagged.
    pub fn id(&self) -> String {
        let mut buf = String::with_capacity(self.set.len() + self.pk.len() + 8);
        buf.push_str(&self.set);
        buf.push(SEP);
        buf.push_str(&self.pk);

        if !self.tags.is_empty() {
            buf.push(SEP);
            buf.push_str(&self.tags.join("_"));
        }

        buf
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Set: '{}', PK: '{}', Tags: '[{}]'",
            self.set,
            self.pk,
            self.tags.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_without_tags() {
        let key = Key::new("set1", "1");
        assert_eq!(key.id(), "set1_1");
    }

    #[test]
    fn id_with_tags() {
        let key = Key::with_tags("set1", "1", vec!["a".into(), "b".into()]);
        assert_eq!(key.id(), "set1_1_a_b");
    }

    #[test]
    fn display_format() {
        let key = Key::new("set", "pk");
        assert_eq!(key.to_string(), "Set: 'set', PK: 'pk', Tags: '[]'");
    }

    #[test]
    fn display_format_with_tags() {
        let key = Key::with_tags("set1", "1", vec!["a".into(), "b".into()]);
        assert_eq!(key.to_string(), "Set: 'set1', PK: '1', Tags: '[a b]'");
    }
}
