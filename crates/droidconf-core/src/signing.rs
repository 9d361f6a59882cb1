//! Signing configuration registry abstraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of the signing config every Android build has out of the box.
pub const DEBUG_SIGNING_CONFIG: &str = "debug";

/// External registry of named signing configurations.
///
/// The resolver only checks that a referenced name exists; credentials never
/// pass through this trait.
pub trait SigningConfigStore: Send + Sync {
    /// Whether a signing config with this name is known.
    fn contains(&self, name: &str) -> bool;

    /// All known names, sorted.
    fn names(&self) -> Vec<String>;
}

/// A fixed set of signing config names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSigningConfigStore {
    names: BTreeSet<String>,
}

impl StaticSigningConfigStore {
    /// A store holding only the implicit `debug` config.
    pub fn new() -> Self {
        Self::empty().with(DEBUG_SIGNING_CONFIG)
    }

    /// A store with no names at all.
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }
}

impl Default for StaticSigningConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Into<String>> FromIterator<S> for StaticSigningConfigStore {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl SigningConfigStore for StaticSigningConfigStore {
    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}
