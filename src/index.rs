use std::collections::BTreeSet;

use crate::model::{DeviceName, DeviceRecord};

/// Decides when two device names refer to the same machine.
///
/// Every membership test in the engine goes through [`NameMatcher::key`], so a
/// normalising matcher (case folding, trimming) can be swapped in without
/// touching the reconciliation logic.
pub trait NameMatcher {
    /// Returns the comparison key for a device name.
    fn key(&self, name: &str) -> String;
}

/// Exact, case-sensitive string equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl NameMatcher for ExactMatch {
    fn key(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Name-keyed membership set for one source's device universe.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex<M: NameMatcher = ExactMatch> {
    matcher: M,
    keys: BTreeSet<String>,
    names: BTreeSet<DeviceName>,
}

impl InventoryIndex<ExactMatch> {
    /// Builds an exact-match index from the records' names.
    pub fn build(records: &[DeviceRecord]) -> Self {
        Self::build_with(ExactMatch, records)
    }
}

impl<M: NameMatcher> InventoryIndex<M> {
    /// Builds an index using the provided matcher. Records without a name are
    /// ignored; duplicate names collapse.
    pub fn build_with(matcher: M, records: &[DeviceRecord]) -> Self {
        Self::from_names(matcher, records.iter().map(|record| record.name.as_str()))
    }

    /// Builds an index from bare names.
    pub fn from_names<'a>(matcher: M, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self {
            matcher,
            keys: BTreeSet::new(),
            names: BTreeSet::new(),
        };
        for name in names {
            if name.is_empty() {
                continue;
            }
            index.keys.insert(index.matcher.key(name));
            index.names.insert(name.to_string());
        }
        index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&self.matcher.key(name))
    }

    /// Original spellings of every indexed name.
    pub fn names(&self) -> impl Iterator<Item = &DeviceName> {
        self.names.iter()
    }

    /// Number of distinct names held by the index.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
