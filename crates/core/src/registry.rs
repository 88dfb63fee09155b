//! In-memory tab registry: ordered tab names, the active tab and the records
//! loaded so far.

use std::collections::HashMap;

use crate::{error::LedgerError, models::GameRecord, store::TABS_KEY};

/// Ordered tab names plus the game records currently held in memory.
///
/// There is always at least one tab and exactly one of them is active.
/// Records are loaded lazily, so a registered tab may have no entry in
/// `records` until it is first switched to.
#[derive(Debug, Clone)]
pub struct TabRegistry {
    names: Vec<String>,
    active: usize,
    records: HashMap<String, GameRecord>,
}

impl TabRegistry {
    /// Registry holding a single tab with the given record, active.
    pub fn new(first: impl Into<String>, record: GameRecord) -> Self {
        let first = first.into();
        let mut records = HashMap::new();
        records.insert(first.clone(), record);
        Self {
            names: vec![first],
            active: 0,
            records,
        }
    }

    /// Registry over stored tab names; the first name is active and holds `first_record`.
    ///
    /// Other tabs start unloaded. Duplicate names are collapsed. Returns
    /// `None` when `names` is empty.
    pub fn from_names(
        names: impl IntoIterator<Item = String>,
        first_record: GameRecord,
    ) -> Option<Self> {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        let first = unique.first()?.clone();
        let mut records = HashMap::new();
        records.insert(first, first_record);
        Some(Self {
            names: unique,
            active: 0,
            records,
        })
    }

    /// Tab names in display order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of the active tab.
    pub fn active(&self) -> &str {
        &self.names[self.active]
    }

    /// Position of the active tab.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    /// Record held in memory for `name`, if loaded.
    pub fn record(&self, name: &str) -> Option<&GameRecord> {
        self.records.get(name)
    }

    /// Mutable record for `name`, if loaded.
    pub fn record_mut(&mut self, name: &str) -> Option<&mut GameRecord> {
        self.records.get_mut(name)
    }

    /// Every loaded record.
    pub fn loaded(&self) -> impl Iterator<Item = (&str, &GameRecord)> {
        self.names
            .iter()
            .filter_map(|name| self.records.get(name).map(|record| (name.as_str(), record)))
    }

    /// Replace the in-memory record for a registered tab.
    pub fn store_record(&mut self, name: &str, record: GameRecord) -> Result<(), LedgerError> {
        if !self.contains(name) {
            return Err(LedgerError::UnknownTab(name.to_string()));
        }
        self.records.insert(name.to_string(), record);
        Ok(())
    }

    /// Make `name` the active tab.
    pub fn activate(&mut self, name: &str) -> Result<(), LedgerError> {
        let index = self
            .position(name)
            .ok_or_else(|| LedgerError::UnknownTab(name.to_string()))?;
        self.active = index;
        Ok(())
    }

    /// First `Tab N` name not in use, counting up from the number of tabs plus one.
    pub fn next_tab_name(&self) -> String {
        let mut counter = self.names.len() + 1;
        loop {
            let candidate = format!("Tab {counter}");
            if !self.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Register a new tab with an empty record and activate it.
    pub fn create(&mut self, name: &str) -> Result<(), LedgerError> {
        let name = self.check_new_name(name)?;
        self.records.insert(name.clone(), GameRecord::default());
        self.names.push(name);
        self.active = self.names.len() - 1;
        Ok(())
    }

    /// Validate a rename without applying it, returning the trimmed new name.
    pub fn check_rename(&self, old: &str, new: &str) -> Result<String, LedgerError> {
        if !self.contains(old) {
            return Err(LedgerError::UnknownTab(old.to_string()));
        }
        let trimmed = new.trim();
        if trimmed == old {
            return Err(LedgerError::NameConflict {
                kind: "tab",
                name: trimmed.to_string(),
            });
        }
        self.check_new_name(trimmed)
    }

    /// Tab list as it will look after renaming `old` to `new`.
    pub fn names_after_rename(&self, old: &str, new: &str) -> Vec<String> {
        self.names
            .iter()
            .map(|name| {
                if name == old {
                    new.to_string()
                } else {
                    name.clone()
                }
            })
            .collect()
    }

    /// Rename `old` to `new`, moving its record and keeping position and active state.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, LedgerError> {
        let new = self.check_rename(old, new)?;
        let index = self
            .position(old)
            .ok_or_else(|| LedgerError::UnknownTab(old.to_string()))?;
        if let Some(record) = self.records.remove(old) {
            self.records.insert(new.clone(), record);
        }
        self.names[index] = new.clone();
        Ok(new)
    }

    /// Adopt the stored tab order. Names only known in memory are kept after
    /// the stored ones; the active tab stays active.
    pub fn adopt_stored_names(&mut self, stored: Vec<String>) {
        let active = self.active().to_string();
        let mut names: Vec<String> = Vec::with_capacity(stored.len() + self.names.len());
        for name in stored.into_iter().chain(self.names.drain(..)) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        self.active = names
            .iter()
            .position(|name| *name == active)
            .unwrap_or_default();
        self.names = names;
    }

    fn check_new_name(&self, name: &str) -> Result<String, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyInput("tab"));
        }
        if name == TABS_KEY {
            return Err(LedgerError::ReservedName(name.to_string()));
        }
        if self.contains(name) {
            return Err(LedgerError::NameConflict {
                kind: "tab",
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|existing| existing == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resource;

    fn registry() -> TabRegistry {
        let mut record = GameRecord::default();
        record.resources.push(Resource::raw("Iron"));
        let mut registry = TabRegistry::new("default", record);
        registry.create("Mars").unwrap();
        registry
    }

    #[test]
    fn create_activates_new_tab() {
        let registry = registry();
        assert_eq!(registry.names(), &["default".to_string(), "Mars".to_string()]);
        assert_eq!(registry.active(), "Mars");
        assert_eq!(registry.record("Mars"), Some(&GameRecord::default()));
    }

    #[test]
    fn next_name_skips_taken_names() {
        let mut registry = registry();
        assert_eq!(registry.next_tab_name(), "Tab 3");
        registry.create("Tab 3").unwrap();
        registry.create("Tab 5").unwrap();
        assert_eq!(registry.next_tab_name(), "Tab 6");
    }

    #[test]
    fn rename_validations() {
        let registry = registry();
        assert!(matches!(
            registry.check_rename("default", "  "),
            Err(LedgerError::EmptyInput("tab"))
        ));
        assert!(matches!(
            registry.check_rename("default", "default"),
            Err(LedgerError::NameConflict { .. })
        ));
        assert!(matches!(
            registry.check_rename("default", "Mars"),
            Err(LedgerError::NameConflict { .. })
        ));
        assert!(matches!(
            registry.check_rename("default", "tabs"),
            Err(LedgerError::ReservedName(_))
        ));
        assert!(matches!(
            registry.check_rename("Venus", "Earth"),
            Err(LedgerError::UnknownTab(_))
        ));
    }

    #[test]
    fn rename_moves_record_and_keeps_position() {
        let mut registry = registry();
        registry.activate("default").unwrap();
        let renamed = registry.rename("default", " Earth ").unwrap();
        assert_eq!(renamed, "Earth");
        assert_eq!(registry.names(), &["Earth".to_string(), "Mars".to_string()]);
        assert_eq!(registry.active(), "Earth");
        assert!(registry.record("default").is_none());
        assert_eq!(registry.record("Earth").unwrap().resources.len(), 1);
    }

    #[test]
    fn failed_rename_changes_nothing() {
        let mut registry = registry();
        assert!(registry.rename("default", "Mars").is_err());
        assert_eq!(registry.names(), &["default".to_string(), "Mars".to_string()]);
        assert_eq!(registry.active(), "Mars");
        assert_eq!(registry.record("default").unwrap().resources.len(), 1);
    }

    #[test]
    fn from_names_collapses_duplicates() {
        let names = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let registry = TabRegistry::from_names(names, GameRecord::default()).unwrap();
        assert_eq!(registry.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(registry.active(), "a");
        assert!(registry.record("a").is_some());
        assert!(registry.record("b").is_none());
        assert!(TabRegistry::from_names(Vec::new(), GameRecord::default()).is_none());
    }

    #[test]
    fn adopting_stored_names_keeps_local_tabs_and_active() {
        let mut registry = registry();
        registry.create("Scratch").unwrap();
        registry.adopt_stored_names(vec!["Earth".to_string(), "Mars".to_string()]);
        assert_eq!(
            registry.names(),
            &[
                "Earth".to_string(),
                "Mars".to_string(),
                "default".to_string(),
                "Scratch".to_string()
            ]
        );
        assert_eq!(registry.active(), "Scratch");
        assert!(registry.record("Earth").is_none());
        assert!(registry.record("default").is_some());
    }
}
