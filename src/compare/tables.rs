//! Table, column and partition comparison

use indexmap::IndexMap;
use tracing::debug;

use crate::compare::constraints::compare_table_constraints;
use crate::compare::indexes::{compare_table_indexes, detect_duplicate_indexes};
use crate::compare::rename::RenameDetector;
use crate::config::ComparisonOptions;
use crate::schema::diff::{DiffType, DiffValue, Difference, Severity};
use crate::schema::types::{ColumnInfo, SchemaInfo, TableInfo};

/// Compare every table of one schema pair, appending differences
pub fn compare_schema_tables(
    options: &ComparisonOptions,
    detector: &dyn RenameDetector,
    schema_name: &str,
    source: &SchemaInfo,
    target: &SchemaInfo,
    differences: &mut Vec<Difference>,
) {
    let source_tables = keyed_tables(options, schema_name, source);
    let target_tables = keyed_tables(options, schema_name, target);

    let mut source_only: Vec<&TableInfo> = Vec::new();
    for (key, table) in &source_tables {
        if !target_tables.contains_key(key) {
            source_only.push(*table);
        }
    }
    let mut target_only: Vec<&TableInfo> = Vec::new();
    for (key, table) in &target_tables {
        if !source_tables.contains_key(key) {
            target_only.push(*table);
        }
    }

    if options.rename_detection {
        let pairs = detector.match_tables(
            &source_only,
            &target_only,
            options.rename_similarity_threshold,
        );
        for (source_name, target_name) in &pairs {
            debug!(schema = schema_name, from = %target_name, to = %source_name, "table rename detected");
            let source_table = source.tables.get(source_name.as_str());
            let target_table = target.tables.get(target_name.as_str());
            differences.push(
                Difference::new(
                    DiffType::TableRenamed,
                    Severity::Medium,
                    schema_name,
                    source_name,
                    &format!(
                        "Table '{}' on target appears renamed; source calls it '{}'",
                        target_name, source_name
                    ),
                )
                .sub_object(target_name)
                .values(
                    source_table.map(|t| DiffValue::Table(t.clone())),
                    target_table.map(|t| DiffValue::Table(t.clone())),
                ),
            );
        }
        source_only.retain(|t| !pairs.iter().any(|(s, _)| s == &t.name));
        target_only.retain(|t| !pairs.iter().any(|(_, g)| g == &t.name));
    }

    for table in source_only {
        differences.push(
            Difference::new(
                DiffType::TableMissingTarget,
                Severity::High,
                schema_name,
                &table.name,
                &format!("Table '{}' exists on source but not on target", table.name),
            )
            .values(Some(DiffValue::Table(table.clone())), None),
        );
        if options.compare_indexes {
            detect_duplicate_indexes(
                schema_name,
                table,
                DiffType::IndexDuplicateSource,
                "source",
                differences,
            );
        }
    }
    for table in target_only {
        differences.push(
            Difference::new(
                DiffType::TableMissingSource,
                Severity::High,
                schema_name,
                &table.name,
                &format!("Table '{}' exists on target but not on source", table.name),
            )
            .values(None, Some(DiffValue::Table(table.clone())))
            .warning("Potential data loss: synchronizing drops this table and all its rows"),
        );
        if options.compare_indexes {
            detect_duplicate_indexes(
                schema_name,
                table,
                DiffType::IndexDuplicateTarget,
                "target",
                differences,
            );
        }
    }

    for (key, source_table) in &source_tables {
        if let Some(target_table) = target_tables.get(key) {
            compare_table_pair(
                options,
                detector,
                schema_name,
                source_table,
                *target_table,
                differences,
            );
        }
    }
}

fn keyed_tables<'a>(
    options: &ComparisonOptions,
    schema_name: &str,
    schema: &'a SchemaInfo,
) -> IndexMap<String, &'a TableInfo> {
    schema
        .tables
        .values()
        .filter(|t| options.should_compare_object(schema_name, &t.name))
        .map(|t| (options.pairing_key(&t.name), t))
        .collect()
}

/// Compare two tables that exist on both sides
fn compare_table_pair(
    options: &ComparisonOptions,
    detector: &dyn RenameDetector,
    schema_name: &str,
    source: &TableInfo,
    target: &TableInfo,
    differences: &mut Vec<Difference>,
) {
    compare_table_options(options, schema_name, source, target, differences);

    if options.compare_columns {
        compare_columns(options, detector, schema_name, source, target, differences);
    }
    if options.compare_indexes {
        compare_table_indexes(options, schema_name, source, target, differences);
    }
    if options.compare_constraints {
        compare_table_constraints(options, schema_name, source, target, differences);
    }
    if options.compare_partitions {
        compare_partitions(schema_name, source, target, differences);
    }
}

fn compare_table_options(
    options: &ComparisonOptions,
    schema_name: &str,
    source: &TableInfo,
    target: &TableInfo,
    differences: &mut Vec<Difference>,
) {
    let mut option_diff = |attribute: &str,
                           severity: Severity,
                           source_value: &Option<String>,
                           target_value: &Option<String>| {
        if source_value != target_value {
            differences.push(
                Difference::new(
                    DiffType::TableOptionsChanged,
                    severity,
                    schema_name,
                    &source.name,
                    &format!(
                        "Table '{}' {} differs: source has {:?}, target has {:?}",
                        source.name, attribute, source_value, target_value
                    ),
                )
                .sub_object(attribute)
                .values(
                    source_value.clone().map(DiffValue::Scalar),
                    target_value.clone().map(DiffValue::Scalar),
                ),
            );
        }
    };

    option_diff("engine", Severity::Medium, &source.engine, &target.engine);
    if !options.ignore_collation {
        option_diff(
            "collation",
            Severity::Low,
            &source.collation,
            &target.collation,
        );
    }
    if !options.ignore_comments {
        option_diff("comment", Severity::Info, &source.comment, &target.comment);
    }
}

fn compare_columns(
    options: &ComparisonOptions,
    detector: &dyn RenameDetector,
    schema_name: &str,
    source: &TableInfo,
    target: &TableInfo,
    differences: &mut Vec<Difference>,
) {
    let source_cols: IndexMap<String, &ColumnInfo> = source
        .columns
        .values()
        .map(|c| (options.pairing_key(&c.name), c))
        .collect();
    let target_cols: IndexMap<String, &ColumnInfo> = target
        .columns
        .values()
        .map(|c| (options.pairing_key(&c.name), c))
        .collect();

    let mut source_only: Vec<&ColumnInfo> = source_cols
        .iter()
        .filter(|(k, _)| !target_cols.contains_key(*k))
        .map(|(_, c)| *c)
        .collect();
    let mut target_only: Vec<&ColumnInfo> = target_cols
        .iter()
        .filter(|(k, _)| !source_cols.contains_key(*k))
        .map(|(_, c)| *c)
        .collect();

    if options.rename_detection {
        let pairs = detector.match_columns(
            &source_only,
            &target_only,
            options.rename_similarity_threshold,
        );
        for (source_name, target_name) in &pairs {
            let source_col = source.columns.get(source_name.as_str());
            let target_col = target.columns.get(target_name.as_str());
            differences.push(
                Difference::new(
                    DiffType::ColumnRenamed,
                    Severity::Medium,
                    schema_name,
                    &source.name,
                    &format!(
                        "Column '{}' on target appears renamed; source calls it '{}'",
                        target_name, source_name
                    ),
                )
                .sub_object(source_name)
                .values(
                    source_col.map(|c| DiffValue::Column(c.clone())),
                    target_col.map(|c| DiffValue::Column(c.clone())),
                ),
            );
        }
        source_only.retain(|c| !pairs.iter().any(|(s, _)| s == &c.name));
        target_only.retain(|c| !pairs.iter().any(|(_, g)| g == &c.name));
    }

    for column in source_only {
        differences.push(
            Difference::new(
                DiffType::ColumnRemoved,
                Severity::Medium,
                schema_name,
                &source.name,
                &format!(
                    "Column '{}' of table '{}' exists on source but not on target",
                    column.name, source.name
                ),
            )
            .sub_object(&column.name)
            .values(Some(DiffValue::Column(column.clone())), None),
        );
    }
    for column in target_only {
        differences.push(
            Difference::new(
                DiffType::ColumnAdded,
                Severity::High,
                schema_name,
                &source.name,
                &format!(
                    "Column '{}' of table '{}' exists on target but not on source",
                    column.name, source.name
                ),
            )
            .sub_object(&column.name)
            .values(None, Some(DiffValue::Column(column.clone())))
            .warning("Potential data loss: synchronizing drops this column and its data"),
        );
    }

    for (key, source_col) in &source_cols {
        if let Some(target_col) = target_cols.get(key) {
            compare_column_pair(
                options,
                schema_name,
                &source.name,
                source_col,
                target_col,
                differences,
            );
        }
    }
}

/// Per-attribute comparison of one column present on both sides.
///
/// Both sides' full bags travel on every difference so the generator can
/// rebuild a complete definition without re-reading the snapshot.
fn compare_column_pair(
    options: &ComparisonOptions,
    schema_name: &str,
    table_name: &str,
    source: &ColumnInfo,
    target: &ColumnInfo,
    differences: &mut Vec<Difference>,
) {
    let bags = |diff: Difference| {
        diff.values(
            Some(DiffValue::Column(source.clone())),
            Some(DiffValue::Column(target.clone())),
        )
    };
    let location = format!("'{}' of table '{}'", source.name, table_name);

    if source.column_type != target.column_type {
        differences.push(bags(
            Difference::new(
                DiffType::ColumnTypeChanged,
                Severity::High,
                schema_name,
                table_name,
                &format!(
                    "Column {} type differs: source has {}, target has {}",
                    location, source.column_type, target.column_type
                ),
            )
            .sub_object(&source.name)
            .warning("Data type change may cause data loss or conversion errors"),
        ));
    }

    if source.is_nullable != target.is_nullable {
        let mut diff = Difference::new(
            DiffType::ColumnNullableChanged,
            Severity::Medium,
            schema_name,
            table_name,
            &format!(
                "Column {} nullability differs: source is {}, target is {}",
                location,
                nullability(source.is_nullable),
                nullability(target.is_nullable)
            ),
        )
        .sub_object(&source.name);
        if !source.is_nullable {
            diff = diff.warning("Making the column NOT NULL fails if existing rows hold NULL");
        }
        differences.push(bags(diff));
    }

    if source.default != target.default {
        differences.push(bags(
            Difference::new(
                DiffType::ColumnDefaultChanged,
                Severity::Low,
                schema_name,
                table_name,
                &format!(
                    "Column {} default differs: source has {:?}, target has {:?}",
                    location, source.default, target.default
                ),
            )
            .sub_object(&source.name),
        ));
    }

    let source_extra = normalized_extra(options, &source.extra);
    let target_extra = normalized_extra(options, &target.extra);
    if source_extra != target_extra {
        differences.push(bags(
            Difference::new(
                DiffType::ColumnExtraChanged,
                Severity::Medium,
                schema_name,
                table_name,
                &format!(
                    "Column {} extra flags differ: source has {:?}, target has {:?}",
                    location, source.extra, target.extra
                ),
            )
            .sub_object(&source.name),
        ));
    }

    let mut auxiliary = |attribute: &str,
                         severity: Severity,
                         source_value: &Option<String>,
                         target_value: &Option<String>| {
        if source_value != target_value {
            differences.push(
                Difference::new(
                    DiffType::ColumnExtraChanged,
                    severity,
                    schema_name,
                    table_name,
                    &format!(
                        "Column {} {} differs: source has {:?}, target has {:?}",
                        location, attribute, source_value, target_value
                    ),
                )
                .sub_object(&source.name)
                .values(
                    Some(DiffValue::Column(source.clone())),
                    Some(DiffValue::Column(target.clone())),
                ),
            );
        }
    };

    if !options.ignore_charset {
        auxiliary("character set", Severity::Low, &source.charset, &target.charset);
    }
    if !options.ignore_collation {
        auxiliary("collation", Severity::Low, &source.collation, &target.collation);
    }
    if !options.ignore_comments {
        auxiliary("comment", Severity::Info, &source.comment, &target.comment);
    }
}

fn nullability(nullable: bool) -> &'static str {
    if nullable {
        "NULL"
    } else {
        "NOT NULL"
    }
}

fn normalized_extra(options: &ComparisonOptions, extra: &Option<String>) -> Option<String> {
    let extra = extra.as_ref()?;
    let mut normalized = extra.to_lowercase();
    if options.ignore_auto_increment {
        normalized = normalized.replace("auto_increment", "");
    }
    let normalized = normalized.trim().to_string();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn compare_partitions(
    schema_name: &str,
    source: &TableInfo,
    target: &TableInfo,
    differences: &mut Vec<Difference>,
) {
    // Partitioning scheme first: a method or expression change invalidates
    // per-partition comparison entirely.
    let source_scheme = source
        .partitions
        .values()
        .next()
        .map(|p| (p.method.clone(), p.expression.clone()));
    let target_scheme = target
        .partitions
        .values()
        .next()
        .map(|p| (p.method.clone(), p.expression.clone()));

    if let (Some(src), Some(tgt)) = (&source_scheme, &target_scheme) {
        if src != tgt {
            differences.push(
                Difference::new(
                    DiffType::PartitionMethodChanged,
                    Severity::High,
                    schema_name,
                    &source.name,
                    &format!(
                        "Table '{}' partitioning differs: source uses {} ({}), target uses {} ({})",
                        source.name, src.0, src.1, tgt.0, tgt.1
                    ),
                )
                .values(
                    Some(DiffValue::Scalar(format!("{} ({})", src.0, src.1))),
                    Some(DiffValue::Scalar(format!("{} ({})", tgt.0, tgt.1))),
                )
                .warning("Repartitioning rebuilds the whole table and requires downtime"),
            );
            return;
        }
    }

    for partition in source.partitions.values() {
        if !target.partitions.contains_key(&partition.name) {
            differences.push(
                Difference::new(
                    DiffType::PartitionMissingTarget,
                    Severity::Medium,
                    schema_name,
                    &source.name,
                    &format!(
                        "Partition '{}' of table '{}' exists on source but not on target",
                        partition.name, source.name
                    ),
                )
                .sub_object(&partition.name)
                .values(Some(DiffValue::Partition(partition.clone())), None),
            );
        }
    }
    for partition in target.partitions.values() {
        if !source.partitions.contains_key(&partition.name) {
            differences.push(
                Difference::new(
                    DiffType::PartitionMissingSource,
                    Severity::Medium,
                    schema_name,
                    &source.name,
                    &format!(
                        "Partition '{}' of table '{}' exists on target but not on source",
                        partition.name, source.name
                    ),
                )
                .sub_object(&partition.name)
                .values(None, Some(DiffValue::Partition(partition.clone())))
                .warning("Potential data loss: dropping a partition discards its rows"),
            );
        }
    }
}
