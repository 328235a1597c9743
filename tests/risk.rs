//! Risk classification and execution behavior

use pretty_assertions::assert_eq;
use rstest::rstest;

use schema_diff::config::DatabaseConfig;
use schema_diff::risk::executor::is_connection_error;
use schema_diff::risk::{
    ExecutionOptions, RiskAnalyzer, RiskLevel, ScriptExecutor, StatementStatus,
};
use schema_diff::{DatabaseConnection, Error};

fn analyze(statements: &[&str]) -> schema_diff::RiskReport {
    let statements: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
    RiskAnalyzer::new().analyze(&statements)
}

#[rstest]
#[case("DROP TABLE `orders`;", RiskLevel::High)]
#[case("DROP TABLE IF EXISTS `app`.`orders`;", RiskLevel::High)]
#[case("DROP DATABASE IF EXISTS `legacy`;", RiskLevel::High)]
#[case("ALTER TABLE `t` DROP COLUMN `c`;", RiskLevel::High)]
#[case("TRUNCATE TABLE `t`;", RiskLevel::High)]
#[case("DROP INDEX `i` ON `t`;", RiskLevel::Medium)]
#[case("ALTER TABLE `t` MODIFY COLUMN `c` int NOT NULL;", RiskLevel::Medium)]
#[case("ALTER TABLE `t` CHANGE COLUMN `a` `b` int;", RiskLevel::Medium)]
#[case("RENAME TABLE `a` TO `b`;", RiskLevel::Medium)]
#[case("ALTER TABLE `t` PARTITION BY HASH (id);", RiskLevel::Medium)]
#[case("FLUSH TABLES;", RiskLevel::Medium)]
#[case("CREATE TABLE `t` (`id` int);", RiskLevel::Low)]
#[case("ALTER TABLE `t` ADD COLUMN `c` int;", RiskLevel::Low)]
#[case("SET FOREIGN_KEY_CHECKS = 0;", RiskLevel::Low)]
fn statement_classification(#[case] statement: &str, #[case] expected: RiskLevel) {
    let report = analyze(&[statement]);
    assert_eq!(report.level, expected);
}

#[test]
fn drop_table_captures_the_object_name() {
    let report = analyze(&["DROP TABLE orders;"]);
    assert_eq!(report.level, RiskLevel::High);
    assert!(report.requires_acknowledgement);
    assert_eq!(report.affected_objects, vec!["orders".to_string()]);
    assert_eq!(report.destructive_operations.len(), 1);
    assert_eq!(report.destructive_operations[0].action, "DROP TABLE");
}

#[test]
fn comments_are_ignored_by_the_scan() {
    let report = analyze(&["-- MANUAL: review duplicate indexes", ""]);
    assert_eq!(report.level, RiskLevel::Low);
    assert!(report.destructive_operations.is_empty());
    assert!(!report.requires_acknowledgement);
}

#[test]
fn worst_statement_sets_the_script_level() {
    let report = analyze(&[
        "CREATE TABLE `t` (`id` int);",
        "ALTER TABLE `t` MODIFY COLUMN `id` bigint;",
        "DROP TABLE `old`;",
    ]);
    assert_eq!(report.level, RiskLevel::High);
}

#[rstest]
#[case("MySQL server has gone away", true)]
#[case("Lost connection to MySQL server during query", true)]
#[case("Connection refused (os error 111)", true)]
#[case("broken pipe", true)]
#[case("Duplicate column name 'status'", false)]
#[case("Syntax error near 'FROM'", false)]
fn connection_error_patterns(#[case] message: &str, #[case] expected: bool) {
    assert_eq!(is_connection_error(message), expected);
}

async fn sqlite_executor() -> ScriptExecutor {
    let connection = DatabaseConnection::connect(&DatabaseConfig {
        driver: "sqlite".to_string(),
        url: "sqlite::memory:".to_string(),
        pool_size: Some(1),
        timeout_seconds: Some(5),
    })
    .await
    .unwrap();
    ScriptExecutor::new(connection)
}

#[tokio::test]
async fn failed_statement_does_not_stop_the_batch() {
    let statements = vec![
        "CREATE TABLE t (id INTEGER);".to_string(),
        "INSERT INTO missing_table VALUES (1);".to_string(),
        "INSERT INTO t VALUES (1);".to_string(),
    ];
    let report = RiskAnalyzer::new().analyze(&statements);
    let executor = sqlite_executor().await;
    let result = executor
        .execute(&statements, &report, &ExecutionOptions::default())
        .await
        .unwrap();

    assert_eq!(result.executed_statements, 2);
    assert_eq!(result.failed_statements, 1);
    assert_eq!(result.statements[1].status, StatementStatus::Failed);
    assert!(result.statements[1].error.is_some());
    assert_eq!(result.statements[2].status, StatementStatus::Executed);
}

#[tokio::test]
async fn comment_statements_are_skipped_not_executed() {
    let statements = vec![
        "-- MANUAL: review before applying".to_string(),
        "CREATE TABLE c (id INTEGER);".to_string(),
    ];
    let report = RiskAnalyzer::new().analyze(&statements);
    let executor = sqlite_executor().await;
    let result = executor
        .execute(&statements, &report, &ExecutionOptions::default())
        .await
        .unwrap();

    assert_eq!(result.skipped_statements, 1);
    assert_eq!(result.executed_statements, 1);
    assert_eq!(result.statements[0].status, StatementStatus::Skipped);
}

#[tokio::test]
async fn high_risk_requires_acknowledgement() {
    let statements = vec![
        "CREATE TABLE doomed (id INTEGER);".to_string(),
        "DROP TABLE doomed;".to_string(),
    ];
    let report = RiskAnalyzer::new().analyze(&statements);
    assert!(report.requires_acknowledgement);

    let executor = sqlite_executor().await;
    let refused = executor
        .execute(&statements, &report, &ExecutionOptions::default())
        .await;
    assert!(matches!(refused, Err(Error::AcknowledgementRequired(_))));

    let acknowledged = executor
        .execute(
            &statements,
            &report,
            &ExecutionOptions {
                acknowledge_high_risk: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(acknowledged.executed_statements, 2);
    assert_eq!(acknowledged.failed_statements, 0);
}
