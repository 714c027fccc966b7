//! Mirrored table rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tables mirrored from the shared database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Singleton system record (hostname and global settings).
    System,
    /// Physical and logical interfaces.
    Interface,
    /// Switch ports.
    Port,
    /// VLANs.
    Vlan,
}

impl TableKind {
    /// All mirrored tables.
    pub const ALL: [TableKind; 4] = [
        TableKind::System,
        TableKind::Interface,
        TableKind::Port,
        TableKind::Vlan,
    ];

    /// Table name as it appears in the shared database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::System => "system",
            TableKind::Interface => "interface",
            TableKind::Port => "port",
            TableKind::Vlan => "vlan",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mirrored row: an identity key plus named field values.
///
/// Field values are kept opaque (`serde_json::Value`) so the cache can carry
/// whatever the remote schema defines without per-column types. Rows are
/// owned by the cache; callers copy out what they need rather than holding
/// references across a sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Identity key (name or composite key rendered as a string).
    pub key: String,

    /// Current known field values.
    pub fields: BTreeMap<String, Value>,
}

impl Row {
    /// Create a row with no fields.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a field value as a string slice.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// One change streamed from the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowChange {
    /// Insert or replace a row.
    Upsert { table: TableKind, row: Row },
    /// Remove a row.
    Delete { table: TableKind, key: String },
}

impl RowChange {
    /// The table this change applies to.
    pub fn table(&self) -> TableKind {
        match self {
            RowChange::Upsert { table, .. } | RowChange::Delete { table, .. } => *table,
        }
    }
}
