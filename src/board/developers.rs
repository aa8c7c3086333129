//! Developer login id ↔ display name translation.
//!
//! Internally every task is keyed by the tracker login id. Names typed by
//! users are matched case-insensitively; names shown on the board are
//! always capitalized.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeveloperDirectory {
    names: BTreeMap<String, String>,
    ids: HashMap<String, String>,
}

impl DeveloperDirectory {
    /// Build from `(login id, name)` pairs.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut directory = Self::default();
        for (id, name) in pairs {
            let id = id.into();
            let name = name.into();
            directory.ids.insert(name.to_lowercase(), id.clone());
            directory.names.insert(id, name);
        }
        directory
    }

    /// Parse the `login=name,login=name` form used by `SPRINTVIEW_DEVELOPERS`.
    /// Entries without `=` are skipped.
    pub fn parse_pairs(s: &str) -> Vec<(String, String)> {
        s.split(',')
            .filter_map(|entry| entry.split_once('='))
            .map(|(id, name)| (id.trim().to_string(), name.trim().to_string()))
            .filter(|(id, name)| !id.is_empty() && !name.is_empty())
            .collect()
    }

    /// Login id for a developer name. Unknown names are taken to be ids already.
    pub fn resolve_id(&self, name: &str) -> String {
        let name = name.trim();
        self.ids
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Capitalized display name for a login id, or the id unchanged when unmapped.
    pub fn display_name(&self, id: &str) -> String {
        match self.names.get(id) {
            Some(name) => capitalize(name),
            None => id.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// First character upper case, the rest lower case.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
