//! Which backing store the process is bound to.

use std::fmt;
use std::path::PathBuf;

/// Decided once by [`StorageAdapter::connect`](crate::StorageAdapter::connect)
/// and handed to every writer and query builder afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Bound to the primary store. Tables live under `schema` when set.
    Primary { schema: Option<String> },
    /// Bound to the local demo store. Table names are never qualified.
    Fallback { path: PathBuf },
}

impl StorageMode {
    /// Resolve a logical table name for this mode.
    ///
    /// Every query in the workspace goes through here; nothing hardcodes a
    /// schema prefix.
    pub fn table_name(&self, logical_name: &str) -> String {
        match self {
            StorageMode::Primary {
                schema: Some(schema),
            } => format!("{}.{}", schema, logical_name),
            _ => logical_name.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, StorageMode::Fallback { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            StorageMode::Primary { .. } => "primary",
            StorageMode::Fallback { .. } => "fallback",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Primary {
                schema: Some(schema),
            } => write!(f, "primary (schema {})", schema),
            StorageMode::Primary { schema: None } => write!(f, "primary"),
            StorageMode::Fallback { path } => write!(f, "fallback ({})", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_with_schema_qualifies() {
        let mode = StorageMode::Primary {
            schema: Some("air".to_string()),
        };
        assert_eq!(mode.table_name("stations"), "air.stations");
        assert_eq!(mode.table_name("observations"), "air.observations");
        assert!(!mode.is_fallback());
    }

    #[test]
    fn test_primary_without_schema_is_flat() {
        let mode = StorageMode::Primary { schema: None };
        assert_eq!(mode.table_name("stations"), "stations");
    }

    #[test]
    fn test_fallback_is_flat() {
        let mode = StorageMode::Fallback {
            path: PathBuf::from("data/demo.db"),
        };
        assert_eq!(mode.table_name("stations"), "stations");
        assert!(mode.is_fallback());
        assert_eq!(mode.label(), "fallback");
    }

    #[test]
    fn test_display() {
        let mode = StorageMode::Primary {
            schema: Some("air".to_string()),
        };
        assert_eq!(mode.to_string(), "primary (schema air)");
    }
}
