use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::keys::{NOTES_PREFIX, notes_key};
use super::store::KeyValueStore;

/// Free-form notes for one company; `saved` puts it on the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SavedCompanyNote {
    pub notes: String,
    pub questions: String,
    pub saved: bool,
}

impl SavedCompanyNote {
    pub fn load<S: KeyValueStore>(store: &S, company: &str) -> Result<Self> {
        Ok(store.get(&notes_key(company))?.unwrap_or_default())
    }

    pub fn save<S: KeyValueStore>(&self, store: &S, company: &str) -> Result<()> {
        store.set(&notes_key(company), self)
    }

    pub fn toggle_saved(&mut self) {
        self.saved = !self.saved;
    }
}

/// Companies whose notes are flagged as saved, in key order.
pub fn saved_companies<S: KeyValueStore>(store: &S) -> Result<Vec<String>> {
    let mut companies = Vec::new();
    for key in store.keys()? {
        let Some(company) = key.strip_prefix(NOTES_PREFIX) else {
            continue;
        };
        let note: Option<SavedCompanyNote> = store.get(&key)?;
        if note.is_some_and(|n| n.saved) {
            companies.push(company.to_string());
        }
    }
    Ok(companies)
}
