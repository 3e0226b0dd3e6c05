use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::keys::THEME_PREFERENCE;
use super::store::KeyValueStore;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    /// The stored preference, else whatever the system prefers.
    pub fn load<S: KeyValueStore>(store: &S, system_prefers_dark: bool) -> Result<Self> {
        let stored: Option<ThemePreference> = store.get(THEME_PREFERENCE)?;
        Ok(stored.unwrap_or(if system_prefers_dark {
            ThemePreference::Dark
        } else {
            ThemePreference::Light
        }))
    }

    pub fn save<S: KeyValueStore>(self, store: &S) -> Result<()> {
        store.set(THEME_PREFERENCE, &self)
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemePreference::Light => f.write_str("light"),
            ThemePreference::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(format!("unknown theme {other:?}, expected light or dark")),
        }
    }
}
