//! Constraint comparison (primary key, foreign key, unique, check)

use crate::config::ComparisonOptions;
use crate::schema::diff::{DiffType, DiffValue, Difference, Severity};
use crate::schema::types::{ConstraintInfo, ConstraintKind, TableInfo};

/// Compare the constraints of one table pair, appending differences
pub fn compare_table_constraints(
    options: &ComparisonOptions,
    schema_name: &str,
    source: &TableInfo,
    target: &TableInfo,
    differences: &mut Vec<Difference>,
) {
    for constraint in source.constraints.values() {
        match find_constraint(options, target, &constraint.name) {
            None => {
                let mut diff = Difference::new(
                    DiffType::ConstraintMissingTarget,
                    Severity::High,
                    schema_name,
                    &source.name,
                    &format!(
                        "Constraint '{}' on table '{}' exists on source but not on target",
                        constraint.name, source.name
                    ),
                )
                .sub_object(&constraint.name)
                .values(Some(DiffValue::Constraint(constraint.clone())), None);
                if constraint.kind == ConstraintKind::ForeignKey {
                    diff = diff
                        .warning("Adding a foreign key fails if orphaned rows exist on the target");
                }
                differences.push(diff);
            }
            Some(other) => {
                compare_constraint_pair(schema_name, &source.name, constraint, other, differences)
            }
        }
    }

    for constraint in target.constraints.values() {
        if find_constraint(options, source, &constraint.name).is_none() {
            differences.push(
                Difference::new(
                    DiffType::ConstraintMissingSource,
                    Severity::High,
                    schema_name,
                    &source.name,
                    &format!(
                        "Constraint '{}' on table '{}' exists on target but not on source",
                        constraint.name, source.name
                    ),
                )
                .sub_object(&constraint.name)
                .values(None, Some(DiffValue::Constraint(constraint.clone()))),
            );
        }
    }
}

fn find_constraint<'a>(
    options: &ComparisonOptions,
    table: &'a TableInfo,
    name: &str,
) -> Option<&'a ConstraintInfo> {
    let key = options.pairing_key(name);
    table
        .constraints
        .values()
        .find(|c| options.pairing_key(&c.name) == key)
}

fn compare_constraint_pair(
    schema_name: &str,
    table_name: &str,
    source: &ConstraintInfo,
    target: &ConstraintInfo,
    differences: &mut Vec<Difference>,
) {
    let mut changed: Vec<&str> = Vec::new();
    if source.kind != target.kind {
        changed.push("kind");
    }
    if source.columns != target.columns {
        changed.push("columns");
    }
    if source.referenced_table != target.referenced_table
        || source.referenced_schema != target.referenced_schema
        || source.referenced_columns != target.referenced_columns
    {
        changed.push("reference");
    }
    if source.update_rule != target.update_rule || source.delete_rule != target.delete_rule {
        changed.push("rules");
    }
    if source.check_clause != target.check_clause {
        changed.push("check clause");
    }

    if changed.is_empty() {
        return;
    }

    let mut diff = Difference::new(
        DiffType::ConstraintDefinitionChanged,
        Severity::High,
        schema_name,
        table_name,
        &format!(
            "Constraint '{}' on table '{}' differs between source and target: {}",
            source.name,
            table_name,
            changed.join(", ")
        ),
    )
    .sub_object(&source.name)
    .values(
        Some(DiffValue::Constraint(source.clone())),
        Some(DiffValue::Constraint(target.clone())),
    );
    if source.kind == ConstraintKind::PrimaryKey || target.kind == ConstraintKind::PrimaryKey {
        diff = diff.warning("Rebuilding a primary key rewrites the table and blocks writes");
    }
    differences.push(diff);
}
