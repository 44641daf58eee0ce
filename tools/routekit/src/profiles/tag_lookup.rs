//! Tag lookup utility for profiles
//!
//! Provides convenient access to the tags of a single OSM way.

/// Borrowed view over a way's `(key, value)` tag pairs.
///
/// OSM ways carry a handful of tags, so a linear scan beats hashing.
#[derive(Debug, Clone, Copy)]
pub struct TagLookup<'a> {
    pairs: &'a [(&'a str, &'a str)],
}

impl<'a> TagLookup<'a> {
    pub fn new(pairs: &'a [(&'a str, &'a str)]) -> Self {
        Self { pairs }
    }

    /// Get a tag value by key name
    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    /// Check if `key` is present with exactly `value`
    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get_str(key) == Some(value)
    }

    /// Check if `key` is present with any of `values`
    pub fn is_any(&self, key: &str, values: &[&str]) -> bool {
        self.get_str(key).is_some_and(|v| values.contains(&v))
    }

    /// Iterate over all tag pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.pairs.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup() {
        let pairs = [("highway", "motorway"), ("name", "Main Street")];
        let tags = TagLookup::new(&pairs);

        assert_eq!(tags.get_str("highway"), Some("motorway"));
        assert_eq!(tags.get_str("name"), Some("Main Street"));
        assert_eq!(tags.get_str("surface"), None);
    }

    #[test]
    fn test_has_and_is() {
        let pairs = [("highway", "motorway"), ("oneway", "yes")];
        let tags = TagLookup::new(&pairs);

        assert!(tags.has("highway"));
        assert!(!tags.has("name"));
        assert!(tags.is("oneway", "yes"));
        assert!(tags.is_any("highway", &["trunk", "motorway"]));
        assert!(!tags.is_any("surface", &["gravel"]));
    }
}
