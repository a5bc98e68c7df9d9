//! Per-run dialect registry.
//!
//! A registry is owned by the collector that uses it; there is no global
//! instance. It always holds exactly one dialect per [`OsFamily`], so a
//! lookup cannot miss.

use super::definition::DialectDefinition;
use super::vendors;
use crate::device::OsFamily;
use crate::error::ConfigError;

/// One dialect per OS family.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    /// Indexed by `OsFamily::index`.
    dialects: [DialectDefinition; 3],
}

impl DialectRegistry {
    /// Registry populated with the built-in dialects.
    pub fn builtin() -> Self {
        Self {
            dialects: [
                vendors::ios_xr::dialect(),
                vendors::ios_xe::dialect(),
                vendors::l2_switch::dialect(),
            ],
        }
    }

    /// Replace the dialect for `family`, returning the previous one.
    pub fn register(
        &mut self,
        family: OsFamily,
        dialect: DialectDefinition,
    ) -> Result<DialectDefinition, ConfigError> {
        if dialect.family != family {
            return Err(ConfigError::DialectMismatch {
                name: dialect.name,
                family,
            });
        }
        Ok(std::mem::replace(&mut self.dialects[family.index()], dialect))
    }

    /// Dialect for a family.
    pub fn get(&self, family: OsFamily) -> &DialectDefinition {
        &self.dialects[family.index()]
    }

    /// Iterate all dialects.
    pub fn iter(&self) -> impl Iterator<Item = &DialectDefinition> {
        self.dialects.iter()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SessionMode;

    #[test]
    fn test_builtin_covers_every_family() {
        let registry = DialectRegistry::builtin();
        for family in OsFamily::ALL {
            assert_eq!(registry.get(family).family, family);
        }
        assert_eq!(registry.iter().count(), OsFamily::ALL.len());
    }

    #[test]
    fn test_register_replaces_dialect() {
        let mut registry = DialectRegistry::builtin();
        let custom = vendors::ios_xe::dialect().with_session_mode(SessionMode::Paced);
        let previous = registry.register(OsFamily::IosXe, custom).unwrap();

        assert_eq!(previous.session_mode, SessionMode::SingleWrite);
        assert_eq!(registry.get(OsFamily::IosXe).session_mode, SessionMode::Paced);
    }

    #[test]
    fn test_register_rejects_wrong_family() {
        let mut registry = DialectRegistry::builtin();
        let err = registry
            .register(OsFamily::IosXr, vendors::ios_xe::dialect())
            .unwrap_err();
        assert!(matches!(err, ConfigError::DialectMismatch { .. }));
    }
}
