//! Client-side state: what the search page keeps in local storage, the
//! prompts it sends through the chat endpoint, and the HTTP client that
//! drives a search against the gateway.

pub mod checklist;
pub mod history;
pub mod notes;
pub mod prompts;
pub mod session;
pub mod store;
pub mod theme;

pub use checklist::{Checklist, ChecklistItem};
pub use history::SearchHistory;
pub use notes::{SavedCompanyNote, saved_companies};
pub use prompts::{MissionCache, StarStory};
pub use session::{GatewayClient, SearchView, Tab};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use theme::ThemePreference;

pub mod keys {
    use crate::query::normalize;

    pub const SEARCH_HISTORY: &str = "searchHistory";
    pub const THEME_PREFERENCE: &str = "theme-preference";
    pub const MISSION_CACHE: &str = "missionCache";
    pub const NOTES_PREFIX: &str = "notes-";
    pub const CHECKLIST_PREFIX: &str = "checklist-";

    pub fn notes_key(company: &str) -> String {
        format!("{NOTES_PREFIX}{}", normalize(company))
    }

    pub fn checklist_key(company: &str) -> String {
        format!("{CHECKLIST_PREFIX}{}", normalize(company))
    }
}
