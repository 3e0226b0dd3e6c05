use anyhow::Result;
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

use super::keys::checklist_key;
use super::store::KeyValueStore;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub done: bool,
}

impl ChecklistItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            done: false,
        }
    }
}

/// Per-company preparation checklist.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Checklist(Vec<ChecklistItem>);

impl Default for Checklist {
    fn default() -> Self {
        Checklist(vec![
            ChecklistItem::new("resume", "Resume tailored"),
            ChecklistItem::new("mock", "Mock interview completed"),
            ChecklistItem::new("referral", "Reached out to alumni/referral"),
        ])
    }
}

impl Checklist {
    pub fn items(&self) -> &[ChecklistItem] {
        &self.0
    }

    /// Stored list, or the default items when nothing usable is stored.
    pub fn load<S: KeyValueStore>(store: &S, company: &str) -> Result<Self> {
        Ok(store.get(&checklist_key(company))?.unwrap_or_default())
    }

    /// Empty checklists are not written.
    pub fn save<S: KeyValueStore>(&self, store: &S, company: &str) -> Result<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        store.set(&checklist_key(company), self)
    }

    /// Flips `done` for `id`; returns whether the item exists.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.0.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.done = !item.done;
                true
            }
            None => false,
        }
    }

    /// Appends a custom item and returns its generated id.
    pub fn add(&mut self, label: &str) -> String {
        let id = nanoid!(8);
        self.0.push(ChecklistItem::new(id.clone(), label.trim()));
        id
    }

    pub fn completed(&self) -> usize {
        self.0.iter().filter(|item| item.done).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;

    #[test]
    fn defaults_until_something_is_saved() {
        let store = MemoryStore::new();
        let mut list = Checklist::load(&store, "Acme").unwrap();
        assert_eq!(list.items().len(), 3);
        assert_eq!(list.completed(), 0);

        assert!(list.toggle("mock"));
        assert!(!list.toggle("missing"));
        let id = list.add("  Research the team ");
        list.save(&store, "Acme").unwrap();

        let reloaded = Checklist::load(&store, "acme").unwrap();
        assert_eq!(reloaded.completed(), 1);
        let custom = reloaded.items().iter().find(|i| i.id == id).unwrap();
        assert_eq!(custom.label, "Research the team");
    }

    #[test]
    fn corrupt_checklist_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.set_raw("checklist-acme", "[{]".into()).unwrap();
        assert_eq!(Checklist::load(&store, "Acme").unwrap(), Checklist::default());
    }
}
