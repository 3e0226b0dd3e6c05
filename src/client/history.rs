use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::keys::SEARCH_HISTORY;
use super::store::KeyValueStore;
use crate::query::normalize;

pub const MAX_HISTORY: usize = 8;

/// Recently searched companies, most recent first, stored normalized.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct SearchHistory(Vec<String>);

impl SearchHistory {
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Moves `company` to the front, dropping any earlier spelling of it.
    pub fn push(&mut self, company: &str) {
        let normalized = normalize(company);
        if normalized.is_empty() {
            return;
        }
        self.0.retain(|h| normalize(h) != normalized);
        self.0.insert(0, normalized);
        self.0.truncate(MAX_HISTORY);
    }

    pub fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        Ok(store.get(SEARCH_HISTORY)?.unwrap_or_default())
    }

    pub fn save<S: KeyValueStore>(&self, store: &S) -> Result<()> {
        store.set(SEARCH_HISTORY, self)
    }

    /// Load, push, save.
    pub fn record<S: KeyValueStore>(store: &S, company: &str) -> Result<Self> {
        let mut history = Self::load(store)?;
        history.push(company);
        history.save(store)?;
        Ok(history)
    }

    pub fn clear<S: KeyValueStore>(store: &S) -> Result<()> {
        store.remove(SEARCH_HISTORY)
    }
}
