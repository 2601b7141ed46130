use std::collections::btree_map::{self, BTreeMap};

/// Request headers keyed by lowercased, trimmed name.
///
/// Built from the host's newline-delimited header block. A repeated header
/// keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name: value` lines separated by `\n` (CRLF tolerated).
    ///
    /// Parsing stops once no `:` is left. The name runs from the current
    /// position to the next `:`, even across a line break, so a colon-free
    /// line folds into the following header's name. Exactly one space after
    /// the colon is skipped, so `"A:  x"` yields `" x"`.
    pub fn parse(raw: &str) -> Self {
        let mut headers = HeaderMap::new();
        let mut rest = raw;

        while !rest.is_empty() {
            let Some(colon) = rest.find(':') else { break };
            let name = rest[..colon].trim().to_ascii_lowercase();
            let after = &rest[colon + 1..];
            let after = after.strip_prefix(' ').unwrap_or(after);

            let (line, next) = match after.find('\n') {
                Some(newline) => (&after[..newline], &after[newline + 1..]),
                None => (after, ""),
            };
            let value = line.trim_end_matches(['\r', '\n']);

            headers.insert(name, value);
            rest = next;
        }

        headers
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for HeaderMap {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
