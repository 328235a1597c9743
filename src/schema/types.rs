//! Type definitions for normalized schema snapshots
//!
//! A snapshot is the canonical point-in-time description of one database's
//! structure, keyed schema -> object -> sub-object. Snapshots arrive from an
//! external normalizer; nothing in this crate talks to information_schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A complete normalized snapshot of one database side
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub schemas: IndexMap<String, SchemaInfo>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema to the snapshot
    pub fn add_schema(&mut self, schema: SchemaInfo) {
        self.schemas.insert(schema.name.clone(), schema);
    }
}

/// One schema (database) within a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub name: String,
    #[serde(default)]
    pub tables: IndexMap<String, TableInfo>,
    #[serde(default)]
    pub views: IndexMap<String, ViewInfo>,
    #[serde(default)]
    pub triggers: IndexMap<String, TriggerInfo>,
    #[serde(default)]
    pub routines: IndexMap<String, RoutineInfo>,
    /// Set by the normalizer when discovery for this schema failed or was
    /// partial. The comparator reports it instead of trusting the contents.
    #[serde(default)]
    pub discovery_error: Option<String>,
}

impl SchemaInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tables: IndexMap::new(),
            views: IndexMap::new(),
            triggers: IndexMap::new(),
            routines: IndexMap::new(),
            discovery_error: None,
        }
    }

    pub fn add_table(&mut self, table: TableInfo) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn add_view(&mut self, view: ViewInfo) {
        self.views.insert(view.name.clone(), view);
    }
}

/// A table and everything hanging off it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub engine: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnInfo>,
    #[serde(default)]
    pub indexes: IndexMap<String, IndexInfo>,
    #[serde(default)]
    pub constraints: IndexMap<String, ConstraintInfo>,
    #[serde(default)]
    pub partitions: IndexMap<String, PartitionInfo>,
}

impl TableInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            engine: None,
            collation: None,
            comment: None,
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            constraints: IndexMap::new(),
            partitions: IndexMap::new(),
        }
    }

    pub fn add_column(&mut self, column: ColumnInfo) {
        self.columns.insert(column.name.clone(), column);
    }

    pub fn add_index(&mut self, index: IndexInfo) {
        self.indexes.insert(index.name.clone(), index);
    }

    pub fn add_constraint(&mut self, constraint: ConstraintInfo) {
        self.constraints.insert(constraint.name.clone(), constraint);
    }

    /// Columns in ordinal order, for DDL rendering
    pub fn ordered_columns(&self) -> Vec<&ColumnInfo> {
        let mut columns: Vec<&ColumnInfo> = self.columns.values().collect();
        columns.sort_by_key(|c| c.ordinal_position);
        columns
    }
}

/// Full attribute bag for a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub ordinal_position: u32,
    /// Complete engine type, e.g. `varchar(255)` or `decimal(10,2)`
    pub column_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    /// Auto-increment / generated flags, e.g. `auto_increment`,
    /// `on update CURRENT_TIMESTAMP`
    pub extra: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: &str, column_type: &str) -> Self {
        Self {
            name: name.to_string(),
            ordinal_position: 0,
            column_type: column_type.to_string(),
            is_nullable: true,
            default: None,
            extra: None,
            charset: None,
            collation: None,
            comment: None,
        }
    }

    pub fn position(mut self, ordinal: u32) -> Self {
        self.ordinal_position = ordinal;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    pub fn default_value(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn extra(mut self, extra: &str) -> Self {
        self.extra = Some(extra.to_string());
        self
    }
}

/// Full attribute bag for an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    /// Column names in key order
    pub columns: Vec<String>,
    pub is_unique: bool,
    /// Index method, e.g. `BTREE`, `HASH`
    pub method: Option<String>,
}

impl IndexInfo {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_unique: false,
            method: None,
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.is_unique = unique;
        self
    }
}

/// Constraint kinds distinguished by their DDL shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
}

/// Full attribute bag for a constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintInfo {
    pub name: String,
    pub kind: ConstraintKind,
    #[serde(default)]
    pub columns: Vec<String>,
    pub referenced_schema: Option<String>,
    pub referenced_table: Option<String>,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
    pub check_clause: Option<String>,
}

impl ConstraintInfo {
    pub fn new(name: &str, kind: ConstraintKind, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_schema: None,
            referenced_table: None,
            referenced_columns: Vec::new(),
            update_rule: None,
            delete_rule: None,
            check_clause: None,
        }
    }

    pub fn references(mut self, schema: &str, table: &str, columns: &[&str]) -> Self {
        self.referenced_schema = Some(schema.to_string());
        self.referenced_table = Some(table.to_string());
        self.referenced_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn rules(mut self, update_rule: &str, delete_rule: &str) -> Self {
        self.update_rule = Some(update_rule.to_string());
        self.delete_rule = Some(delete_rule.to_string());
        self
    }
}

/// A view definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub name: String,
    pub definition: String,
}

/// A trigger definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerInfo {
    pub name: String,
    pub table: String,
    /// `BEFORE` or `AFTER`
    pub timing: String,
    /// `INSERT`, `UPDATE` or `DELETE`
    pub event: String,
    pub statement: String,
}

/// Stored procedure or function kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Procedure,
    Function,
}

impl RoutineKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "PROCEDURE",
            RoutineKind::Function => "FUNCTION",
        }
    }
}

/// A stored routine definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineInfo {
    pub name: String,
    pub kind: RoutineKind,
    pub definition: String,
}

/// One partition of a partitioned table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub name: String,
    /// Partitioning method, e.g. `RANGE`, `LIST`, `HASH`
    pub method: String,
    /// Partitioning expression, e.g. `YEAR(created_at)`
    pub expression: String,
    /// Boundary description, e.g. `VALUES LESS THAN (2024)`
    pub description: Option<String>,
}
