//! Name search and the corregimiento menu.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{Region, RegionClass, RegionCollection, RegionId};

const CORREGIMIENTO_PREFIX: &str = "Corregimiento ";

fn numbered_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+ - ").expect("static regex is valid"))
}

/// Short label for menus: drops the first `"Corregimiento "` and a leading
/// `"<number> - "`, e.g. `"Corregimiento 60 - San Cristóbal"` → `"San Cristóbal"`.
pub fn display_name(name: &str) -> String {
    let stripped = name.replacen(CORREGIMIENTO_PREFIX, "", 1);
    numbered_prefix().replace(&stripped, "").into_owned()
}

/// Regions whose name contains `query`, ignoring case, in collection order
pub fn search_by_name<'a>(collection: &'a RegionCollection, query: &str) -> Vec<&'a Region> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    collection
        .regions()
        .iter()
        .filter(|region| region.name.to_lowercase().contains(&query))
        .collect()
}

/// Entry of the corregimiento side menu
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuEntry {
    pub id: RegionId,
    pub label: String,
}

/// Corregimientos sorted by identifier, with cleaned labels
pub fn corregimiento_menu(collection: &RegionCollection) -> Vec<MenuEntry> {
    let mut entries: Vec<MenuEntry> = collection
        .regions()
        .iter()
        .filter(|region| region.class() == RegionClass::Corregimiento)
        .map(|region| MenuEntry {
            id: region.id,
            label: display_name(&region.name),
        })
        .collect();

    entries.sort_by_key(|entry| entry.id);
    entries
}
