//! Table and column registration.
//!
//! The shared database carries far more tables and columns than the CLI
//! session needs. The cache subscribes to a static list of (table, columns)
//! pairs supplied at startup and drops everything else. The list is fixed
//! configuration data, not discovered at runtime.

use crate::replica::row::TableKind;

/// Subscription for one table: which columns the cache retains.
#[derive(Debug, Clone)]
pub struct TableRegistration {
    /// The subscribed table.
    pub table: TableKind,

    /// Retained columns. Fields outside this set are dropped on apply.
    pub columns: Vec<String>,
}

impl TableRegistration {
    /// Create a registration from a static column list.
    pub fn new(table: TableKind, columns: &[&str]) -> Self {
        Self {
            table,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Whether a column is part of this subscription.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// The default subscription set for a CLI session.
pub fn default_registrations() -> Vec<TableRegistration> {
    vec![
        TableRegistration::new(
            TableKind::System,
            &["hostname", "cur_cfg", "other_config", "status"],
        ),
        TableRegistration::new(
            TableKind::Interface,
            &["name", "link_state", "other_config", "statistics"],
        ),
        TableRegistration::new(TableKind::Port, &["name"]),
        TableRegistration::new(TableKind::Vlan, &["name"]),
    ]
}
