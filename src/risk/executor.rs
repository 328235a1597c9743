//! Sequential script execution with per-statement outcome tracking
//!
//! Statements run one at a time on one connection. DDL autocommits on the
//! supported engines, so there is no batch transaction and no automatic
//! retry. A failed statement is recorded and the batch continues; only a
//! lost connection (or a refused acknowledgement) aborts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::risk::analyzer::{is_comment, RiskReport};

/// Outcome of a single statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    Executed,
    Failed,
    /// Comment-only statement, never sent to the server
    Skipped,
    /// Never ran because the connection was lost earlier in the batch
    NotAttempted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementOutcome {
    pub statement: String,
    pub status: StatementStatus,
    pub error: Option<String>,
}

/// Complete record of one execution run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub statements: Vec<StatementOutcome>,
    pub executed_statements: usize,
    pub failed_statements: usize,
    pub skipped_statements: usize,
    pub not_attempted_statements: usize,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl ExecutionResult {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            statements: Vec::new(),
            executed_statements: 0,
            failed_statements: 0,
            skipped_statements: 0,
            not_attempted_statements: 0,
            started_at,
            duration_secs: 0.0,
        }
    }

    fn record(&mut self, statement: &str, status: StatementStatus, error: Option<String>) {
        match status {
            StatementStatus::Executed => self.executed_statements += 1,
            StatementStatus::Failed => self.failed_statements += 1,
            StatementStatus::Skipped => self.skipped_statements += 1,
            StatementStatus::NotAttempted => self.not_attempted_statements += 1,
        }
        self.statements.push(StatementOutcome {
            statement: statement.to_string(),
            status,
            error,
        });
    }

    fn finish(&mut self) {
        self.duration_secs = (Utc::now() - self.started_at).num_milliseconds() as f64 / 1000.0;
    }
}

/// Execution switches supplied by the operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Required for scripts the analyzer rated high risk
    pub acknowledge_high_risk: bool,
}

/// Patterns marking an error as connection loss rather than a statement
/// failure. Matched case-insensitively against the driver message.
const CONNECTION_ERROR_PATTERNS: &[&str] = &[
    "lost connection",
    "gone away",
    "connection refused",
    "connection reset",
    "broken pipe",
    "server closed the connection",
    "connection closed",
    "timed out",
    "can't connect",
    "pool timed out",
];

/// True when a driver error indicates the connection itself is gone
pub fn is_connection_error(message: &str) -> bool {
    let lowered = message.to_lowercase();
    CONNECTION_ERROR_PATTERNS
        .iter()
        .any(|p| lowered.contains(p))
}

/// Runs a generated script against one database
pub struct ScriptExecutor {
    connection: DatabaseConnection,
}

impl ScriptExecutor {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Execute the statements sequentially, honoring the risk report's
    /// acknowledgement gate.
    pub async fn execute(
        &self,
        statements: &[String],
        report: &RiskReport,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult> {
        if report.requires_acknowledgement && !options.acknowledge_high_risk {
            let objects = if report.affected_objects.is_empty() {
                "destructive statements present".to_string()
            } else {
                format!("destructive statements affect: {}", report.affected_objects.join(", "))
            };
            return Err(Error::AcknowledgementRequired(objects));
        }

        let mut result = ExecutionResult::new(Utc::now());
        info!(statements = statements.len(), "executing script");

        for (index, statement) in statements.iter().enumerate() {
            if is_comment(statement) {
                result.record(statement, StatementStatus::Skipped, None);
                continue;
            }

            match self.connection.execute(statement).await {
                Ok(rows) => {
                    info!(index, rows, "statement executed");
                    result.record(statement, StatementStatus::Executed, None);
                }
                Err(err) => {
                    let message = err.to_string();
                    if is_connection_error(&message) {
                        error!(index, %message, "connection lost; aborting batch");
                        result.record(statement, StatementStatus::Failed, Some(message.clone()));
                        for remaining in &statements[index + 1..] {
                            result.record(remaining, StatementStatus::NotAttempted, None);
                        }
                        result.finish();
                        return Err(Error::ConnectionLost {
                            reason: message,
                            partial: Box::new(result),
                        });
                    }
                    warn!(index, %message, "statement failed; continuing");
                    result.record(statement, StatementStatus::Failed, Some(message));
                }
            }
        }

        result.finish();
        info!(
            executed = result.executed_statements,
            failed = result.failed_statements,
            skipped = result.skipped_statements,
            "execution complete"
        );
        Ok(result)
    }
}
