//! Snapshot data model and difference classification

pub mod diff;
pub mod types;

pub use diff::{
    ComparisonSummary, DataLossRisk, DiffType, DiffValue, Difference, ObjectType, Severity,
};
pub use types::{
    ColumnInfo, ConstraintInfo, ConstraintKind, IndexInfo, PartitionInfo, RoutineInfo, RoutineKind,
    SchemaInfo, SchemaSnapshot, TableInfo, TriggerInfo, ViewInfo,
};
