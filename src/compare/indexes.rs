//! Index comparison, including same-side duplicate detection

use std::collections::HashMap;

use crate::config::ComparisonOptions;
use crate::schema::diff::{DiffType, DiffValue, Difference, Severity};
use crate::schema::types::{IndexInfo, TableInfo};

/// Compare the indexes of one table pair, appending differences
pub fn compare_table_indexes(
    options: &ComparisonOptions,
    schema_name: &str,
    source: &TableInfo,
    target: &TableInfo,
    differences: &mut Vec<Difference>,
) {
    detect_duplicate_indexes(
        schema_name,
        source,
        DiffType::IndexDuplicateSource,
        "source",
        differences,
    );
    detect_duplicate_indexes(
        schema_name,
        target,
        DiffType::IndexDuplicateTarget,
        "target",
        differences,
    );

    for index in source.indexes.values() {
        match find_index(options, target, &index.name) {
            None => differences.push(
                Difference::new(
                    DiffType::IndexMissingTarget,
                    Severity::Medium,
                    schema_name,
                    &source.name,
                    &format!(
                        "Index '{}' on table '{}' exists on source but not on target",
                        index.name, source.name
                    ),
                )
                .sub_object(&index.name)
                .values(Some(DiffValue::Index(index.clone())), None),
            ),
            Some(other) => compare_index_pair(schema_name, &source.name, index, other, differences),
        }
    }

    for index in target.indexes.values() {
        if find_index(options, source, &index.name).is_none() {
            differences.push(
                Difference::new(
                    DiffType::IndexMissingSource,
                    Severity::Medium,
                    schema_name,
                    &source.name,
                    &format!(
                        "Index '{}' on table '{}' exists on target but not on source",
                        index.name, source.name
                    ),
                )
                .sub_object(&index.name)
                .values(None, Some(DiffValue::Index(index.clone()))),
            );
        }
    }
}

fn find_index<'a>(
    options: &ComparisonOptions,
    table: &'a TableInfo,
    name: &str,
) -> Option<&'a IndexInfo> {
    let key = options.pairing_key(name);
    table
        .indexes
        .values()
        .find(|i| options.pairing_key(&i.name) == key)
}

fn compare_index_pair(
    schema_name: &str,
    table_name: &str,
    source: &IndexInfo,
    target: &IndexInfo,
    differences: &mut Vec<Difference>,
) {
    let bags = |diff: Difference| {
        diff.values(
            Some(DiffValue::Index(source.clone())),
            Some(DiffValue::Index(target.clone())),
        )
    };

    if source.columns != target.columns {
        differences.push(bags(
            Difference::new(
                DiffType::IndexColumnsChanged,
                Severity::Medium,
                schema_name,
                table_name,
                &format!(
                    "Index '{}' on table '{}' covers [{}] on source but [{}] on target",
                    source.name,
                    table_name,
                    source.columns.join(", "),
                    target.columns.join(", ")
                ),
            )
            .sub_object(&source.name)
            .warning("Rebuilding the index locks writes on large tables"),
        ));
    }

    if source.is_unique != target.is_unique {
        let mut diff = Difference::new(
            DiffType::IndexUniqueChanged,
            Severity::Medium,
            schema_name,
            table_name,
            &format!(
                "Index '{}' on table '{}' is {} on source but {} on target",
                source.name,
                table_name,
                uniqueness(source.is_unique),
                uniqueness(target.is_unique)
            ),
        )
        .sub_object(&source.name);
        if source.is_unique {
            diff = diff.warning("Adding a unique index fails if duplicate values exist");
        }
        differences.push(bags(diff));
    }

    if source.method != target.method {
        differences.push(bags(
            Difference::new(
                DiffType::IndexTypeChanged,
                Severity::Low,
                schema_name,
                table_name,
                &format!(
                    "Index '{}' on table '{}' method differs: source has {:?}, target has {:?}",
                    source.name, table_name, source.method, target.method
                ),
            )
            .sub_object(&source.name),
        ));
    }
}

fn uniqueness(unique: bool) -> &'static str {
    if unique {
        "unique"
    } else {
        "non-unique"
    }
}

/// Find indexes on one side covering the exact same ordered column list.
/// These are redundant but remediation is a judgment call, so the
/// differences are informational and never auto-fixed. Runs per side, so
/// tables without a counterpart on the other side are scanned too.
pub(crate) fn detect_duplicate_indexes(
    schema_name: &str,
    table: &TableInfo,
    diff_type: DiffType,
    side: &str,
    differences: &mut Vec<Difference>,
) {
    let mut by_columns: HashMap<String, Vec<&IndexInfo>> = HashMap::new();
    for index in table.indexes.values() {
        let key = index
            .columns
            .iter()
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        by_columns.entry(key).or_default().push(index);
    }

    for group in by_columns.values() {
        if group.len() < 2 {
            continue;
        }
        let names: Vec<&str> = group.iter().map(|i| i.name.as_str()).collect();
        for index in group.iter().skip(1) {
            differences.push(
                Difference::new(
                    diff_type,
                    Severity::Low,
                    schema_name,
                    &table.name,
                    &format!(
                        "Indexes [{}] on table '{}' ({side} side) cover the same columns",
                        names.join(", "),
                        table.name
                    ),
                )
                .sub_object(&index.name)
                .values(
                    Some(DiffValue::Index((*index).clone())),
                    Some(DiffValue::Index((*index).clone())),
                )
                .manual_only()
                .warning("Redundant index: review and drop one manually"),
            );
        }
    }
}
