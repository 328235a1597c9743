//! Script generation behavior

use pretty_assertions::assert_eq;

use schema_diff::schema::{
    ColumnInfo, ConstraintInfo, ConstraintKind, DiffValue, Difference, SchemaInfo, SchemaSnapshot,
    TableInfo,
};
use schema_diff::{
    ComparisonEngine, ComparisonOptions, DiffType, Severity, SyncDirection, SyncFilters,
    SyncScriptGenerator,
};

fn snapshot_with(schema_name: &str, tables: Vec<TableInfo>) -> SchemaSnapshot {
    let mut snapshot = SchemaSnapshot::new();
    let mut schema = SchemaInfo::new(schema_name);
    for table in tables {
        schema.add_table(table);
    }
    snapshot.add_schema(schema);
    snapshot
}

fn status_differences() -> Vec<Difference> {
    let mut source_table = TableInfo::new("accounts");
    source_table.add_column(
        ColumnInfo::new("status", "varchar(50)")
            .position(1)
            .nullable(false)
            .default_value("active")
            .comment("Account status"),
    );
    let mut target_table = TableInfo::new("accounts");
    target_table.add_column(
        ColumnInfo::new("status", "varchar(50)")
            .position(1)
            .nullable(false)
            .default_value("inactive"),
    );

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    engine
        .compare(
            &snapshot_with("app", vec![source_table]),
            &snapshot_with("app", vec![target_table]),
        )
        .unwrap()
        .differences
}

fn sql_statements(statements: &[String]) -> Vec<&String> {
    statements
        .iter()
        .filter(|s| !s.trim_start().starts_with("--"))
        .collect()
}

#[test]
fn attribute_changes_collapse_into_one_modify_column() {
    let differences = status_differences();
    assert_eq!(differences.len(), 2);

    let generator =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default());
    let script = generator.generate(&differences).unwrap();

    let modifies: Vec<&String> = script
        .forward_statements
        .iter()
        .filter(|s| s.contains("MODIFY COLUMN"))
        .collect();
    assert_eq!(modifies.len(), 1);
    assert_eq!(
        modifies[0],
        "ALTER TABLE `app`.`accounts` MODIFY COLUMN `status` varchar(50) NOT NULL DEFAULT 'active' COMMENT 'Account status';"
    );
}

/// Reversing the direction rebuilds from the other side's attribute bag:
/// the default flips and no comment clause appears.
#[test]
fn target_to_source_rebuilds_from_target_bag() {
    let differences = status_differences();
    let generator =
        SyncScriptGenerator::new(SyncDirection::TargetToSource, SyncFilters::default());
    let script = generator.generate(&differences).unwrap();

    let modifies: Vec<&String> = script
        .forward_statements
        .iter()
        .filter(|s| s.contains("MODIFY COLUMN"))
        .collect();
    assert_eq!(modifies.len(), 1);
    assert_eq!(
        modifies[0],
        "ALTER TABLE `app`.`accounts` MODIFY COLUMN `status` varchar(50) NOT NULL DEFAULT 'inactive';"
    );
    assert!(!modifies[0].contains("COMMENT"));
}

#[test]
fn forward_and_rollback_are_symmetric_across_directions() {
    let differences = status_differences();
    let s2t = SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
        .generate(&differences)
        .unwrap();
    let t2s = SyncScriptGenerator::new(SyncDirection::TargetToSource, SyncFilters::default())
        .generate(&differences)
        .unwrap();

    assert_eq!(s2t.forward_statements, t2s.rollback_statements);
    assert_eq!(s2t.rollback_statements, t2s.forward_statements);
}

#[test]
fn string_defaults_are_escaped_and_expressions_are_not() {
    let mut source_table = TableInfo::new("people");
    source_table.add_column(
        ColumnInfo::new("surname", "varchar(100)")
            .position(1)
            .default_value("O'Brien"),
    );
    source_table.add_column(
        ColumnInfo::new("created_at", "timestamp")
            .position(2)
            .default_value("CURRENT_TIMESTAMP"),
    );
    let target = snapshot_with("app", vec![TableInfo::new("people")]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine
        .compare(&snapshot_with("app", vec![source_table]), &target)
        .unwrap();
    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&outcome.differences)
            .unwrap();

    let adds: Vec<&String> = script
        .forward_statements
        .iter()
        .filter(|s| s.contains("ADD COLUMN"))
        .collect();
    assert!(adds.iter().any(|s| s.contains("DEFAULT 'O''Brien'")));
    assert!(adds
        .iter()
        .any(|s| s.contains("DEFAULT CURRENT_TIMESTAMP") && !s.contains("'CURRENT_TIMESTAMP'")));
}

#[test]
fn foreign_key_creation_follows_table_creation() {
    let mut orders = TableInfo::new("orders");
    orders.add_column(ColumnInfo::new("id", "int").position(1).nullable(false));
    orders.add_column(ColumnInfo::new("user_id", "int").position(2).nullable(false));

    let mut users_src = TableInfo::new("users");
    users_src.add_column(ColumnInfo::new("id", "int").position(1).nullable(false));
    let mut orders_with_fk = orders.clone();
    orders_with_fk.add_constraint(
        ConstraintInfo::new("fk_orders_user", ConstraintKind::ForeignKey, &["user_id"])
            .references("app", "users", &["id"]),
    );

    // Source has users plus the FK on orders; target has only a bare orders.
    let source = snapshot_with("app", vec![users_src, orders_with_fk]);
    let target = snapshot_with("app", vec![orders]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();
    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&outcome.differences)
            .unwrap();

    let statements = sql_statements(&script.forward_statements);
    let create_pos = statements
        .iter()
        .position(|s| s.contains("CREATE TABLE `app`.`users`"))
        .unwrap();
    let fk_pos = statements
        .iter()
        .position(|s| s.contains("ADD CONSTRAINT `fk_orders_user`"))
        .unwrap();
    assert!(create_pos < fk_pos);
}

#[test]
fn scripts_are_framed_with_foreign_key_checks() {
    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&status_differences())
            .unwrap();

    let off = script.forward_script.find("SET FOREIGN_KEY_CHECKS = 0;").unwrap();
    let on = script.forward_script.find("SET FOREIGN_KEY_CHECKS = 1;").unwrap();
    let body = script.forward_script.find("MODIFY COLUMN").unwrap();
    assert!(off < body && body < on);
    assert!(script.forward_script.contains("-- Statements: 1"));
}

#[test]
fn filters_that_match_nothing_yield_empty_script_with_warning() {
    let filters = SyncFilters {
        schemas: Some(vec!["other".to_string()]),
        ..Default::default()
    };
    let script = SyncScriptGenerator::new(SyncDirection::SourceToTarget, filters)
        .generate(&status_differences())
        .unwrap();

    assert!(script.forward_statements.is_empty());
    assert!(!script.warnings.is_empty());
    assert!(script.validated);
}

#[test]
fn dropping_a_table_sets_data_loss_risk_and_rollback_recreates_it() {
    let mut table = TableInfo::new("audit");
    table.add_column(ColumnInfo::new("id", "int").position(1).nullable(false));
    let source = snapshot_with("app", vec![]);
    let target = snapshot_with("app", vec![table]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();
    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&outcome.differences)
            .unwrap();

    assert!(script.data_loss_risk);
    assert!(script
        .forward_statements
        .iter()
        .any(|s| s == "DROP TABLE IF EXISTS `app`.`audit`;"));
    assert!(script
        .rollback_statements
        .iter()
        .any(|s| s.contains("CREATE TABLE `app`.`audit`")));
}

#[test]
fn missing_definition_yields_placeholder_and_validation_error() {
    let diff = Difference::new(
        DiffType::TableMissingTarget,
        Severity::High,
        "app",
        "ghost",
        "Table 'ghost' exists on source but not on target",
    );
    // No attribute bag attached
    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&[diff])
            .unwrap();

    assert!(!script.validated);
    assert!(!script.validation_errors.is_empty());
    assert!(script
        .forward_statements
        .iter()
        .any(|s| s.starts_with("-- PLACEHOLDER:")));
}

#[test]
fn column_less_table_bag_yields_placeholder_not_malformed_create() {
    let diff = Difference::new(
        DiffType::TableMissingTarget,
        Severity::High,
        "app",
        "ghost",
        "Table 'ghost' exists on source but not on target",
    )
    .values(Some(DiffValue::Table(TableInfo::new("ghost"))), None);

    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&[diff])
            .unwrap();

    assert!(!script.validated);
    assert!(script
        .forward_statements
        .iter()
        .any(|s| s.starts_with("-- PLACEHOLDER:")));
    assert!(!script
        .forward_statements
        .iter()
        .any(|s| s.contains("CREATE TABLE")));
}

#[test]
fn manual_differences_emit_comment_markers() {
    let diff = Difference::new(
        DiffType::IndexDuplicateSource,
        Severity::Low,
        "app",
        "users",
        "Indexes [a, b] on table 'users' cover the same columns",
    )
    .sub_object("b")
    .manual_only();

    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&[diff])
            .unwrap();

    assert!(script
        .forward_statements
        .iter()
        .any(|s| s.starts_with("-- MANUAL:")));
    assert!(!script.warnings.is_empty());
}

#[test]
fn renamed_table_emits_rename_statement() {
    let mut old = TableInfo::new("members");
    old.add_column(ColumnInfo::new("id", "int").position(1).nullable(false));
    let mut new = old.clone();
    new.name = "users".to_string();

    let diff = Difference::new(
        DiffType::TableRenamed,
        Severity::Medium,
        "app",
        "users",
        "Table 'members' on target appears renamed; source calls it 'users'",
    )
    .sub_object("members")
    .values(
        Some(DiffValue::Table(new)),
        Some(DiffValue::Table(old)),
    );

    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&[diff])
            .unwrap();

    assert!(script
        .forward_statements
        .iter()
        .any(|s| s == "RENAME TABLE `app`.`members` TO `app`.`users`;"));
    assert!(script
        .rollback_statements
        .iter()
        .any(|s| s == "RENAME TABLE `app`.`users` TO `app`.`members`;"));
}

#[test]
fn impact_analysis_counts_type_changes() {
    let mut source_table = TableInfo::new("t");
    source_table.add_column(ColumnInfo::new("c", "bigint").position(1));
    let mut target_table = TableInfo::new("t");
    target_table.add_column(ColumnInfo::new("c", "int").position(1));

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine
        .compare(
            &snapshot_with("app", vec![source_table]),
            &snapshot_with("app", vec![target_table]),
        )
        .unwrap();
    let script =
        SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default())
            .generate(&outcome.differences)
            .unwrap();

    assert_eq!(script.estimated_impact.data_type_changes, 1);
    assert!(!script.estimated_impact.potential_locks.is_empty());
    assert!(script.estimated_duration_secs > 0.0);
}
