//! Comparator behavior

use pretty_assertions::assert_eq;
use rstest::rstest;

use schema_diff::compare::CancelToken;
use schema_diff::schema::{
    ColumnInfo, IndexInfo, SchemaInfo, SchemaSnapshot, TableInfo,
};
use schema_diff::{ComparisonEngine, ComparisonOptions, DiffType, Error, Severity};

fn users_table() -> TableInfo {
    let mut table = TableInfo::new("users");
    table.add_column(ColumnInfo::new("id", "int").position(1).nullable(false));
    table.add_column(
        ColumnInfo::new("email", "varchar(255)")
            .position(2)
            .nullable(false),
    );
    table
}

fn snapshot_with(schema_name: &str, tables: Vec<TableInfo>) -> SchemaSnapshot {
    let mut snapshot = SchemaSnapshot::new();
    let mut schema = SchemaInfo::new(schema_name);
    for table in tables {
        schema.add_table(table);
    }
    snapshot.add_schema(schema);
    snapshot
}

#[test]
fn identical_snapshots_produce_no_differences() {
    let source = snapshot_with("app", vec![users_table()]);
    let target = snapshot_with("app", vec![users_table()]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    assert_eq!(outcome.differences.len(), 0);
    assert_eq!(outcome.summary.total_differences, 0);
}

#[test]
fn table_only_on_source_is_missing_target() {
    let source = snapshot_with("app", vec![users_table()]);
    let target = snapshot_with("app", vec![]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    assert_eq!(outcome.differences.len(), 1);
    let diff = &outcome.differences[0];
    assert_eq!(diff.diff_type, DiffType::TableMissingTarget);
    assert_eq!(diff.severity, Severity::High);
    assert!(diff.source_value.is_some());
    assert!(diff.target_value.is_none());
}

#[test]
fn table_only_on_target_warns_about_data_loss() {
    let source = snapshot_with("app", vec![]);
    let target = snapshot_with("app", vec![users_table()]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    let diff = &outcome.differences[0];
    assert_eq!(diff.diff_type, DiffType::TableMissingSource);
    assert!(diff
        .warnings
        .iter()
        .any(|w| w.to_lowercase().contains("data loss")));
}

/// A default change plus a comment removal on one column surfaces as two
/// separate differences, the comment as an auxiliary attribute.
#[test]
fn default_and_comment_deltas_are_two_differences() {
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

    let source = snapshot_with("app", vec![source_table]);
    let target = snapshot_with("app", vec![target_table]);
    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    let mut types: Vec<DiffType> = outcome.differences.iter().map(|d| d.diff_type).collect();
    types.sort_by_key(|t| t.as_str());
    assert_eq!(
        types,
        vec![DiffType::ColumnDefaultChanged, DiffType::ColumnExtraChanged]
    );
    for diff in &outcome.differences {
        assert_eq!(diff.sub_object_name.as_deref(), Some("status"));
        assert!(diff.source_value.is_some() && diff.target_value.is_some());
    }
}

#[rstest]
#[case(true, 1)]
#[case(false, 2)]
fn ignore_comments_suppresses_comment_diffs(#[case] ignore: bool, #[case] expected: usize) {
    let mut source_table = TableInfo::new("t");
    source_table.add_column(
        ColumnInfo::new("c", "int")
            .position(1)
            .default_value("1")
            .comment("counted"),
    );
    let mut target_table = TableInfo::new("t");
    target_table.add_column(ColumnInfo::new("c", "int").position(1).default_value("2"));

    let options = ComparisonOptions {
        ignore_comments: ignore,
        ..Default::default()
    };
    let engine = ComparisonEngine::new(options);
    let outcome = engine
        .compare(
            &snapshot_with("app", vec![source_table]),
            &snapshot_with("app", vec![target_table]),
        )
        .unwrap();

    assert_eq!(outcome.differences.len(), expected);
}

#[test]
fn case_insensitive_pairing_matches_across_cases() {
    let mut source_table = users_table();
    source_table.name = "Users".to_string();
    let source = snapshot_with("App", vec![source_table]);
    let target = snapshot_with("app", vec![users_table()]);

    let options = ComparisonOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let engine = ComparisonEngine::new(options);
    let outcome = engine.compare(&source, &target).unwrap();
    assert_eq!(outcome.differences.len(), 0);
}

#[test]
fn structurally_identical_tables_become_a_rename() {
    let mut renamed = users_table();
    renamed.name = "members".to_string();
    let source = snapshot_with("app", vec![users_table()]);
    let target = snapshot_with("app", vec![renamed]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    assert_eq!(outcome.differences.len(), 1);
    assert_eq!(outcome.differences[0].diff_type, DiffType::TableRenamed);
}

#[test]
fn rename_detection_off_falls_back_to_drop_and_add() {
    let mut renamed = users_table();
    renamed.name = "members".to_string();
    let source = snapshot_with("app", vec![users_table()]);
    let target = snapshot_with("app", vec![renamed]);

    let options = ComparisonOptions {
        rename_detection: false,
        ..Default::default()
    };
    let engine = ComparisonEngine::new(options);
    let outcome = engine.compare(&source, &target).unwrap();

    let types: Vec<DiffType> = outcome.differences.iter().map(|d| d.diff_type).collect();
    assert!(types.contains(&DiffType::TableMissingTarget));
    assert!(types.contains(&DiffType::TableMissingSource));
}

#[test]
fn redundant_indexes_are_flagged_manual() {
    let mut table = users_table();
    table.add_index(IndexInfo::new("idx_email", &["email"]));
    table.add_index(IndexInfo::new("idx_email_dup", &["email"]));
    let source = snapshot_with("app", vec![table.clone()]);
    let target = snapshot_with("app", vec![table]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    let duplicates: Vec<_> = outcome
        .differences
        .iter()
        .filter(|d| {
            matches!(
                d.diff_type,
                DiffType::IndexDuplicateSource | DiffType::IndexDuplicateTarget
            )
        })
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates.iter().all(|d| !d.can_auto_fix));
}

#[test]
fn uniqueness_change_describes_both_sides() {
    let mut source_table = users_table();
    source_table.add_index(IndexInfo::new("idx_email", &["email"]).unique(true));
    let mut target_table = users_table();
    target_table.add_index(IndexInfo::new("idx_email", &["email"]));

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine
        .compare(
            &snapshot_with("app", vec![source_table]),
            &snapshot_with("app", vec![target_table]),
        )
        .unwrap();

    let diff = outcome
        .differences
        .iter()
        .find(|d| d.diff_type == DiffType::IndexUniqueChanged)
        .unwrap();
    assert!(diff
        .description
        .contains("unique on source but non-unique on target"));
    assert!(diff
        .warnings
        .iter()
        .any(|w| w.contains("duplicate values")));
}

#[test]
fn redundant_indexes_on_an_unpaired_table_are_still_flagged() {
    let mut table = users_table();
    table.name = "logs".to_string();
    table.add_index(IndexInfo::new("idx_email", &["email"]));
    table.add_index(IndexInfo::new("idx_email_dup", &["email"]));

    let source = snapshot_with("app", vec![table]);
    let target = snapshot_with("app", vec![]);
    let options = ComparisonOptions {
        rename_detection: false,
        ..Default::default()
    };
    let outcome = ComparisonEngine::new(options).compare(&source, &target).unwrap();

    let duplicate = outcome
        .differences
        .iter()
        .find(|d| d.diff_type == DiffType::IndexDuplicateSource)
        .unwrap();
    assert!(!duplicate.can_auto_fix);
    assert_eq!(duplicate.object_name, "logs");
}

#[test]
fn discovery_error_reports_coarsely_and_continues() {
    let mut source = SchemaSnapshot::new();
    let mut broken = SchemaInfo::new("broken");
    broken.discovery_error = Some("information_schema timeout".to_string());
    source.add_schema(broken);
    let mut healthy = SchemaInfo::new("app");
    healthy.add_table(users_table());
    source.add_schema(healthy);

    let mut target = SchemaSnapshot::new();
    target.add_schema(SchemaInfo::new("broken"));
    target.add_schema(SchemaInfo::new("app"));

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    let coarse = outcome
        .differences
        .iter()
        .find(|d| d.diff_type == DiffType::SchemaMissingSource)
        .unwrap();
    assert!(!coarse.can_auto_fix);
    // The healthy schema was still compared
    assert!(outcome
        .differences
        .iter()
        .any(|d| d.diff_type == DiffType::TableMissingTarget));
}

#[test]
fn schema_presence_diffs_carry_a_value_on_the_existing_side() {
    let source = snapshot_with("staging", vec![users_table()]);
    let target = SchemaSnapshot::new();

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    let schema_diff = outcome
        .differences
        .iter()
        .find(|d| d.diff_type == DiffType::SchemaMissingTarget)
        .unwrap();
    assert_eq!(
        schema_diff.source_value.as_ref().and_then(|v| v.as_scalar()),
        Some("staging")
    );
    assert!(schema_diff.target_value.is_none());

    // Absence means "does not exist on that side": every difference keeps
    // at least one side populated.
    for diff in &outcome.differences {
        assert!(
            diff.source_value.is_some() || diff.target_value.is_some(),
            "difference {:?} carries no value on either side",
            diff.diff_type
        );
    }

    let reversed = engine.compare(&target, &source).unwrap();
    let schema_diff = reversed
        .differences
        .iter()
        .find(|d| d.diff_type == DiffType::SchemaMissingSource)
        .unwrap();
    assert!(schema_diff.source_value.is_none());
    assert_eq!(
        schema_diff.target_value.as_ref().and_then(|v| v.as_scalar()),
        Some("staging")
    );
}

#[test]
fn cancelled_token_aborts_the_run() {
    let token = CancelToken::new();
    token.cancel();
    let engine =
        ComparisonEngine::new(ComparisonOptions::default()).with_cancel_token(token);

    let source = snapshot_with("app", vec![users_table()]);
    let target = snapshot_with("app", vec![]);
    let result = engine.compare(&source, &target);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn inversion_mirrors_type_and_swaps_sides() {
    let source = snapshot_with("app", vec![users_table()]);
    let target = snapshot_with("app", vec![]);
    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    let diff = &outcome.differences[0];
    let inverted = diff.inverted();
    assert_eq!(inverted.diff_type, DiffType::TableMissingSource);
    assert!(inverted.source_value.is_none());
    assert!(inverted.target_value.is_some());
    // Involutive
    let back = inverted.inverted();
    assert_eq!(back.diff_type, diff.diff_type);
    assert_eq!(back.fix_order, diff.fix_order);
}

#[test]
fn inversion_leaves_quoted_object_names_alone() {
    let mut table = users_table();
    table.name = "source_data".to_string();
    let source = snapshot_with("app", vec![table]);
    let target = snapshot_with("app", vec![]);

    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    let diff = outcome
        .differences
        .iter()
        .find(|d| d.diff_type == DiffType::TableMissingTarget)
        .unwrap();
    let inverted = diff.inverted();
    assert_eq!(
        inverted.description,
        "Table 'source_data' exists on target but not on source"
    );
    // Involutive on the description too
    assert_eq!(inverted.inverted().description, diff.description);
}

#[test]
fn drops_order_before_creations() {
    // A dropped column must come out before an added table, and a foreign
    // key creation after the table it depends on.
    let column_drop = DiffType::ColumnAdded.fix_order();
    let table_create = DiffType::TableMissingTarget.fix_order();
    let fk_create = DiffType::ConstraintMissingTarget.fix_order();
    let constraint_drop = DiffType::ConstraintMissingSource.fix_order();

    assert!(column_drop < table_create);
    assert!(constraint_drop < column_drop);
    assert!(table_create < fk_create);
}

#[test]
fn summary_aggregates_counts_and_risks() {
    let source = snapshot_with("app", vec![]);
    let target = snapshot_with("app", vec![users_table()]);
    let engine = ComparisonEngine::new(ComparisonOptions::default());
    let outcome = engine.compare(&source, &target).unwrap();

    assert_eq!(outcome.summary.total_differences, 1);
    assert_eq!(outcome.summary.by_severity.get("high"), Some(&1));
    assert_eq!(
        outcome.summary.by_diff_type.get("table_missing_source"),
        Some(&1)
    );
    assert_eq!(outcome.summary.data_loss_risks.len(), 1);
    assert_eq!(outcome.summary.tables_affected, vec!["app.users".to_string()]);
}
