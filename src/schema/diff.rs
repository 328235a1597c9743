//! Difference model produced by the comparator
//!
//! Every structural delta between the two snapshots is classified into a
//! closed `DiffType` enumeration and carried as an immutable `Difference`
//! record. The generator consumes these records; it never re-derives them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::types::{
    ColumnInfo, ConstraintInfo, IndexInfo, PartitionInfo, RoutineInfo, TableInfo, TriggerInfo,
    ViewInfo,
};

/// Database object kinds covered by the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Schema,
    Table,
    Column,
    Index,
    Constraint,
    View,
    Trigger,
    Routine,
    Partition,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Schema => "schema",
            ObjectType::Table => "table",
            ObjectType::Column => "column",
            ObjectType::Index => "index",
            ObjectType::Constraint => "constraint",
            ObjectType::View => "view",
            ObjectType::Trigger => "trigger",
            ObjectType::Routine => "routine",
            ObjectType::Partition => "partition",
        }
    }

    /// Dependency rank: lower creates earlier. Constraints and indexes share
    /// a rank; ties are broken by name during emission.
    pub fn dependency_rank(&self) -> i32 {
        match self {
            ObjectType::Schema => 1,
            ObjectType::Table => 2,
            ObjectType::Column => 3,
            ObjectType::Constraint => 4,
            ObjectType::Index => 4,
            ObjectType::View => 5,
            ObjectType::Trigger => 5,
            ObjectType::Routine => 5,
            ObjectType::Partition => 6,
        }
    }
}

/// Severity levels for differences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

/// Closed enumeration of structural difference kinds.
///
/// `*_missing_target` means the object exists only on the source side;
/// `*_missing_source` means it exists only on the target side. Column
/// presence deltas keep their historical names: `column_removed` is a column
/// only the source still has, `column_added` one only the target has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    SchemaMissingSource,
    SchemaMissingTarget,

    TableMissingSource,
    TableMissingTarget,
    TableRenamed,
    TableOptionsChanged,

    ColumnAdded,
    ColumnRemoved,
    ColumnRenamed,
    ColumnTypeChanged,
    ColumnNullableChanged,
    ColumnDefaultChanged,
    /// Auxiliary column attributes: extra flags, charset, collation, comment.
    /// One Difference is emitted per differing attribute; the description
    /// names which one.
    ColumnExtraChanged,

    IndexMissingSource,
    IndexMissingTarget,
    IndexColumnsChanged,
    IndexTypeChanged,
    IndexUniqueChanged,
    IndexDuplicateSource,
    IndexDuplicateTarget,

    ConstraintMissingSource,
    ConstraintMissingTarget,
    ConstraintDefinitionChanged,

    ViewMissingSource,
    ViewMissingTarget,
    ViewDefinitionChanged,

    TriggerMissingSource,
    TriggerMissingTarget,
    TriggerDefinitionChanged,

    RoutineMissingSource,
    RoutineMissingTarget,
    RoutineDefinitionChanged,

    PartitionMissingSource,
    PartitionMissingTarget,
    PartitionMethodChanged,
}

/// How a difference translates into DDL when making target match source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    /// Something must be created on the target
    Create,
    /// Something must be dropped from the target
    Drop,
    /// Something on the target must be rewritten in place
    Change,
}

impl DiffType {
    /// The object kind this difference legally applies to
    pub fn object_type(&self) -> ObjectType {
        use DiffType::*;
        match self {
            SchemaMissingSource | SchemaMissingTarget => ObjectType::Schema,
            TableMissingSource | TableMissingTarget | TableRenamed | TableOptionsChanged => {
                ObjectType::Table
            }
            ColumnAdded | ColumnRemoved | ColumnRenamed | ColumnTypeChanged
            | ColumnNullableChanged | ColumnDefaultChanged | ColumnExtraChanged => {
                ObjectType::Column
            }
            IndexMissingSource | IndexMissingTarget | IndexColumnsChanged | IndexTypeChanged
            | IndexUniqueChanged | IndexDuplicateSource | IndexDuplicateTarget => ObjectType::Index,
            ConstraintMissingSource | ConstraintMissingTarget | ConstraintDefinitionChanged => {
                ObjectType::Constraint
            }
            ViewMissingSource | ViewMissingTarget | ViewDefinitionChanged => ObjectType::View,
            TriggerMissingSource | TriggerMissingTarget | TriggerDefinitionChanged => {
                ObjectType::Trigger
            }
            RoutineMissingSource | RoutineMissingTarget | RoutineDefinitionChanged => {
                ObjectType::Routine
            }
            PartitionMissingSource | PartitionMissingTarget | PartitionMethodChanged => {
                ObjectType::Partition
            }
        }
    }

    /// Classification in the make-target-match-source frame
    pub fn change_class(&self) -> ChangeClass {
        use DiffType::*;
        match self {
            SchemaMissingTarget | TableMissingTarget | ColumnRemoved | IndexMissingTarget
            | ConstraintMissingTarget | ViewMissingTarget | TriggerMissingTarget
            | RoutineMissingTarget | PartitionMissingTarget => ChangeClass::Create,
            SchemaMissingSource | TableMissingSource | ColumnAdded | IndexMissingSource
            | ConstraintMissingSource | ViewMissingSource | TriggerMissingSource
            | RoutineMissingSource | PartitionMissingSource => ChangeClass::Drop,
            _ => ChangeClass::Change,
        }
    }

    /// The mirror of this difference when the sync direction is flipped
    pub fn inverted(&self) -> DiffType {
        use DiffType::*;
        match self {
            SchemaMissingSource => SchemaMissingTarget,
            SchemaMissingTarget => SchemaMissingSource,
            TableMissingSource => TableMissingTarget,
            TableMissingTarget => TableMissingSource,
            ColumnAdded => ColumnRemoved,
            ColumnRemoved => ColumnAdded,
            IndexMissingSource => IndexMissingTarget,
            IndexMissingTarget => IndexMissingSource,
            IndexDuplicateSource => IndexDuplicateTarget,
            IndexDuplicateTarget => IndexDuplicateSource,
            ConstraintMissingSource => ConstraintMissingTarget,
            ConstraintMissingTarget => ConstraintMissingSource,
            ViewMissingSource => ViewMissingTarget,
            ViewMissingTarget => ViewMissingSource,
            TriggerMissingSource => TriggerMissingTarget,
            TriggerMissingTarget => TriggerMissingSource,
            RoutineMissingSource => RoutineMissingTarget,
            RoutineMissingTarget => RoutineMissingSource,
            PartitionMissingSource => PartitionMissingTarget,
            PartitionMissingTarget => PartitionMissingSource,
            other => *other,
        }
    }

    /// Dependency-ordered fix rank. Drops occupy the low band (dependents
    /// dropped first), creations and rewrites the high band (prerequisites
    /// created first), so every drop precedes every create and a foreign key
    /// is never added before its table.
    pub fn fix_order(&self) -> i32 {
        let rank = self.object_type().dependency_rank();
        match self.change_class() {
            ChangeClass::Drop => 10 - rank,
            ChangeClass::Create | ChangeClass::Change => 10 + rank,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use DiffType::*;
        match self {
            SchemaMissingSource => "schema_missing_source",
            SchemaMissingTarget => "schema_missing_target",
            TableMissingSource => "table_missing_source",
            TableMissingTarget => "table_missing_target",
            TableRenamed => "table_renamed",
            TableOptionsChanged => "table_options_changed",
            ColumnAdded => "column_added",
            ColumnRemoved => "column_removed",
            ColumnRenamed => "column_renamed",
            ColumnTypeChanged => "column_type_changed",
            ColumnNullableChanged => "column_nullable_changed",
            ColumnDefaultChanged => "column_default_changed",
            ColumnExtraChanged => "column_extra_changed",
            IndexMissingSource => "index_missing_source",
            IndexMissingTarget => "index_missing_target",
            IndexColumnsChanged => "index_columns_changed",
            IndexTypeChanged => "index_type_changed",
            IndexUniqueChanged => "index_unique_changed",
            IndexDuplicateSource => "index_duplicate_source",
            IndexDuplicateTarget => "index_duplicate_target",
            ConstraintMissingSource => "constraint_missing_source",
            ConstraintMissingTarget => "constraint_missing_target",
            ConstraintDefinitionChanged => "constraint_definition_changed",
            ViewMissingSource => "view_missing_source",
            ViewMissingTarget => "view_missing_target",
            ViewDefinitionChanged => "view_definition_changed",
            TriggerMissingSource => "trigger_missing_source",
            TriggerMissingTarget => "trigger_missing_target",
            TriggerDefinitionChanged => "trigger_definition_changed",
            RoutineMissingSource => "routine_missing_source",
            RoutineMissingTarget => "routine_missing_target",
            RoutineDefinitionChanged => "routine_definition_changed",
            PartitionMissingSource => "partition_missing_source",
            PartitionMissingTarget => "partition_missing_target",
            PartitionMethodChanged => "partition_method_changed",
        }
    }
}

/// Value captured on one side of a difference: either a scalar rendering of
/// a single attribute or the full attribute bag for the object, so the
/// generator can rebuild the complete definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffValue {
    Scalar(String),
    Table(TableInfo),
    Column(ColumnInfo),
    Index(IndexInfo),
    Constraint(ConstraintInfo),
    View(ViewInfo),
    Trigger(TriggerInfo),
    Routine(RoutineInfo),
    Partition(PartitionInfo),
}

impl DiffValue {
    pub fn as_table(&self) -> Option<&TableInfo> {
        match self {
            DiffValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnInfo> {
        match self {
            DiffValue::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<&IndexInfo> {
        match self {
            DiffValue::Index(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_constraint(&self) -> Option<&ConstraintInfo> {
        match self {
            DiffValue::Constraint(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&ViewInfo> {
        match self {
            DiffValue::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_trigger(&self) -> Option<&TriggerInfo> {
        match self {
            DiffValue::Trigger(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_routine(&self) -> Option<&RoutineInfo> {
        match self {
            DiffValue::Routine(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_partition(&self) -> Option<&PartitionInfo> {
        match self {
            DiffValue::Partition(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            DiffValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// A single classified difference between the two snapshots.
///
/// Invariants: at least one of `source_value`/`target_value` is present
/// (absence means "does not exist on that side"), and `object_type` always
/// equals `diff_type.object_type()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difference {
    pub diff_type: DiffType,
    pub severity: Severity,
    pub object_type: ObjectType,
    pub schema_name: Option<String>,
    pub object_name: String,
    pub sub_object_name: Option<String>,
    pub source_value: Option<DiffValue>,
    pub target_value: Option<DiffValue>,
    pub description: String,
    pub can_auto_fix: bool,
    pub fix_order: i32,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Difference {
    pub fn new(
        diff_type: DiffType,
        severity: Severity,
        schema_name: &str,
        object_name: &str,
        description: &str,
    ) -> Self {
        Self {
            diff_type,
            severity,
            object_type: diff_type.object_type(),
            schema_name: Some(schema_name.to_string()),
            object_name: object_name.to_string(),
            sub_object_name: None,
            source_value: None,
            target_value: None,
            description: description.to_string(),
            can_auto_fix: true,
            fix_order: diff_type.fix_order(),
            warnings: Vec::new(),
        }
    }

    pub fn sub_object(mut self, name: &str) -> Self {
        self.sub_object_name = Some(name.to_string());
        self
    }

    pub fn values(mut self, source: Option<DiffValue>, target: Option<DiffValue>) -> Self {
        self.source_value = source;
        self.target_value = target;
        self
    }

    pub fn warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    pub fn manual_only(mut self) -> Self {
        self.can_auto_fix = false;
        self
    }

    /// The same structural delta seen from the opposite direction: diff type
    /// mirrored, sides swapped, description rewritten, fix order recomputed.
    pub fn inverted(&self) -> Difference {
        let diff_type = self.diff_type.inverted();
        Difference {
            diff_type,
            severity: self.severity,
            object_type: self.object_type,
            schema_name: self.schema_name.clone(),
            object_name: self.object_name.clone(),
            sub_object_name: self.sub_object_name.clone(),
            source_value: self.target_value.clone(),
            target_value: self.source_value.clone(),
            description: swap_sides(&self.description),
            can_auto_fix: self.can_auto_fix,
            fix_order: diff_type.fix_order(),
            warnings: self.warnings.clone(),
        }
    }

    /// Qualified `schema.object` location
    pub fn qualified_object(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", schema, self.object_name),
            None => self.object_name.clone(),
        }
    }
}

/// Swap the standalone words "source" and "target" in a description.
/// Object names appear inside single quotes and are left untouched, so an
/// object literally named `source_data` survives inversion.
fn swap_sides(description: &str) -> String {
    fn flush(word: &mut String, out: &mut String, in_quotes: bool) {
        match (in_quotes, word.as_str()) {
            (false, "source") => out.push_str("target"),
            (false, "target") => out.push_str("source"),
            _ => out.push_str(word),
        }
        word.clear();
    }

    let mut out = String::with_capacity(description.len());
    let mut word = String::new();
    let mut in_quotes = false;
    for ch in description.chars() {
        if ch == '\'' {
            flush(&mut word, &mut out, in_quotes);
            in_quotes = !in_quotes;
            out.push(ch);
        } else if ch.is_alphanumeric() || ch == '_' {
            word.push(ch);
        } else {
            flush(&mut word, &mut out, in_quotes);
            out.push(ch);
        }
    }
    flush(&mut word, &mut out, in_quotes);
    out
}

/// Entry in the summary's data-loss list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLossRisk {
    pub object: String,
    pub diff_type: DiffType,
    pub description: String,
}

/// Aggregate statistics over a difference list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_differences: usize,
    pub by_severity: IndexMap<String, usize>,
    pub by_diff_type: IndexMap<String, usize>,
    pub by_object_type: IndexMap<String, usize>,
    pub critical_count: usize,
    pub can_auto_fix: usize,
    pub data_loss_risks: Vec<DataLossRisk>,
    pub schemas_affected: Vec<String>,
    pub tables_affected: Vec<String>,
}

/// Build summary statistics from a difference list
pub fn summarize(differences: &[Difference]) -> ComparisonSummary {
    let mut summary = ComparisonSummary {
        total_differences: differences.len(),
        ..Default::default()
    };

    let mut schemas: Vec<String> = Vec::new();
    let mut tables: Vec<String> = Vec::new();

    for diff in differences {
        *summary
            .by_severity
            .entry(diff.severity.as_str().to_string())
            .or_insert(0) += 1;
        *summary
            .by_diff_type
            .entry(diff.diff_type.as_str().to_string())
            .or_insert(0) += 1;
        *summary
            .by_object_type
            .entry(diff.object_type.as_str().to_string())
            .or_insert(0) += 1;

        if diff.severity == Severity::Critical {
            summary.critical_count += 1;
        }
        if diff.can_auto_fix {
            summary.can_auto_fix += 1;
        }

        if diff
            .warnings
            .iter()
            .any(|w| w.to_lowercase().contains("data loss"))
        {
            summary.data_loss_risks.push(DataLossRisk {
                object: diff.qualified_object(),
                diff_type: diff.diff_type,
                description: diff.description.clone(),
            });
        }

        if let Some(schema) = &diff.schema_name {
            if !schemas.contains(schema) {
                schemas.push(schema.clone());
            }
        }
        if matches!(diff.object_type, ObjectType::Table | ObjectType::Column) {
            let table = diff.qualified_object();
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }

    summary.schemas_affected = schemas;
    summary.tables_affected = tables;
    summary
}
