//! Company-name normalization shared by the caches, the search history and
//! the per-company local state keys.

/// Lower-cases and collapses every run of whitespace into a single space.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `company|role|university`, each part normalized. Absent filters are empty.
pub fn composite_key(company: &str, role: Option<&str>, university: Option<&str>) -> String {
    format!(
        "{}|{}|{}",
        normalize(company),
        normalize(role.unwrap_or_default()),
        normalize(university.unwrap_or_default())
    )
}

/// A non-blank company name as typed by the user, plus its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyQuery {
    raw: String,
    normalized: String,
}

impl CompanyQuery {
    /// Returns `None` for missing or whitespace-only input.
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Host label used to guess the company's homepage: all whitespace
    /// removed, lower-cased. `None` unless the result is made of DNS labels
    /// (ASCII alphanumerics and `-`, joined by single dots).
    pub fn host_label(&self) -> Option<String> {
        let label: String = self
            .raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let valid = label.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with('-')
                && !part.ends_with('-')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        valid.then_some(label)
    }
}
