//! Ordered command batches and the per-family catalog.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::device::OsFamily;
use crate::error::ConfigError;

/// Ordered list of commands run in one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandBatch {
    commands: Vec<String>,
}

impl CommandBatch {
    /// Create a batch. Commands are trimmed and blank entries dropped.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands = commands
            .into_iter()
            .map(|c| c.into().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self { commands }
    }

    /// Parse command-file text: one command per line, blank lines and
    /// `#` comments skipped.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.commands.get(index).map(String::as_str)
    }

    /// Iterate commands in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    /// Commands as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.commands
    }
}

impl<'a> IntoIterator for &'a CommandBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Command batches keyed by OS family, with a mandatory default.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    default: CommandBatch,
    families: IndexMap<OsFamily, CommandBatch>,
}

impl CommandCatalog {
    /// Create a catalog around the fallback batch.
    ///
    /// The default batch must not be empty: it is what every device without a
    /// family-specific batch runs.
    pub fn new(default: CommandBatch) -> Result<Self, ConfigError> {
        if default.is_empty() {
            return Err(ConfigError::EmptyDefaultBatch);
        }
        Ok(Self {
            default,
            families: IndexMap::new(),
        })
    }

    /// Set the batch for one family. An empty batch leaves the family on the default.
    pub fn with_family(mut self, family: OsFamily, batch: CommandBatch) -> Self {
        self.families.insert(family, batch);
        self
    }

    /// The batch a device of `family` runs.
    pub fn batch_for(&self, family: OsFamily) -> &CommandBatch {
        match self.families.get(&family) {
            Some(batch) if !batch.is_empty() => batch,
            _ => &self.default,
        }
    }

    /// Whether `family` has its own non-empty batch.
    pub fn has_family_batch(&self, family: OsFamily) -> bool {
        self.families.get(&family).is_some_and(|b| !b.is_empty())
    }

    /// The fallback batch.
    pub fn default_batch(&self) -> &CommandBatch {
        &self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_file() {
        let text = "# health check\nshow version\n\n   show ip interface brief  \n#show run\nshow clock\n";
        let batch = CommandBatch::parse(text);
        assert_eq!(
            batch.as_slice(),
            &["show version", "show ip interface brief", "show clock"]
        );
    }

    #[test]
    fn test_batch_preserves_order() {
        let batch = CommandBatch::new(["show clock", "show version", "show clock"]);
        let commands: Vec<&str> = batch.iter().collect();
        assert_eq!(commands, vec!["show clock", "show version", "show clock"]);
        assert_eq!(batch.get(1), Some("show version"));
        assert_eq!(batch.get(3), None);
    }

    #[test]
    fn test_catalog_requires_default() {
        let err = CommandCatalog::new(CommandBatch::new(Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDefaultBatch));
    }

    #[test]
    fn test_catalog_falls_back_to_default() {
        let catalog = CommandCatalog::new(CommandBatch::new(["show version"]))
            .unwrap()
            .with_family(OsFamily::IosXr, CommandBatch::new(["show platform"]))
            .with_family(OsFamily::L2Switch, CommandBatch::default());

        assert_eq!(
            catalog.batch_for(OsFamily::IosXr).as_slice(),
            &["show platform"]
        );
        assert_eq!(
            catalog.batch_for(OsFamily::IosXe).as_slice(),
            &["show version"]
        );
        // An empty family batch does not shadow the default.
        assert_eq!(
            catalog.batch_for(OsFamily::L2Switch).as_slice(),
            &["show version"]
        );
        assert!(catalog.has_family_batch(OsFamily::IosXr));
        assert!(!catalog.has_family_batch(OsFamily::L2Switch));
    }

    #[test]
    fn test_batch_deserializes_from_list() {
        let batch: CommandBatch = serde_json::from_str(r#"["show clock","show version"]"#).unwrap();
        assert_eq!(batch.len(), 2);
    }
}
