use std::collections::HashMap;

use crate::error::CommandError;

/// User-defined command aliases (`:command`): name → replacement text.
/// All mutation goes through these methods so the existence invariants
/// (uppercase names, checked removal) hold everywhere.
#[derive(Debug, Default)]
pub struct AliasTable {
    map: HashMap<String, String>,
}

impl AliasTable {
    pub fn define(
        &mut self,
        name: &str,
        replacement: &str,
        force: bool,
    ) -> Result<(), CommandError> {
        if !name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return Err(CommandError::MustStartWithUppercase);
        }
        if self.map.contains_key(name) && !force {
            return Err(CommandError::UserCommandExists(name.to_string()));
        }
        self.map.insert(name.to_string(), replacement.to_string());
        Ok(())
    }

    /// Remove an alias; removing an unknown name is an error, never a
    /// silent success.
    pub fn remove(&mut self, name: &str) -> Result<(), CommandError> {
        match self.map.remove(name) {
            Some(_) => Ok(()),
            None => Err(CommandError::NoSuchUserCommand(name.to_string())),
        }
    }

    pub fn has_alias(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|s| s.as_str())
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Shortest-unambiguous-prefix lookup: an exact name always wins,
    /// otherwise a unique prefix resolves and an ambiguous one errors.
    pub fn resolve(&self, name: &str) -> Result<Option<&str>, CommandError> {
        if let Some(replacement) = self.map.get(name) {
            return Ok(Some(replacement));
        }
        let mut candidates = self.map.iter().filter(|(alias, _)| alias.starts_with(name));
        match (candidates.next(), candidates.next()) {
            (None, _) => Ok(None),
            (Some((_, replacement)), None) => Ok(Some(replacement)),
            (Some(_), Some(_)) => Err(CommandError::AmbiguousUserCommand(name.to_string())),
        }
    }

    /// All aliases, sorted by name (for `:command` listings).
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut all: Vec<(&str, &str)> = self
            .map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        all.sort_by_key(|(name, _)| *name);
        all
    }
}
