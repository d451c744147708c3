use crate::ports::Archive;
use std::collections::BTreeMap;

/// In-memory `Archive` keyed by entry name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with_entry(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(path.into(), contents.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.entries.insert(path.into(), contents.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry contents decoded lossily as UTF-8.
    pub fn read_string(&self, path: &str) -> Option<String> {
        self.entries
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Names of entries whose contents differ from `before`, plus entries `before` lacks.
    pub fn changed_since(&self, before: &MemoryArchive) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(path, contents)| before.entries.get(*path) != Some(*contents))
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(path, contents)| (path.as_str(), contents.as_slice()))
    }
}

impl Archive for MemoryArchive {
    fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn read(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    fn write(&mut self, path: &str, contents: Vec<u8>) {
        self.entries.insert(path.to_string(), contents);
    }

    fn entries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl<P: Into<String>, C: Into<Vec<u8>>> FromIterator<(P, C)> for MemoryArchive {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut archive = MemoryArchive::new();
        for (path, contents) in iter {
            archive.insert(path, contents);
        }
        archive
    }
}
