//! # schema_diff
//!
//! Compares two normalized database schema snapshots, classifies every
//! structural difference, and generates a dependency-ordered, bidirectional
//! synchronization script with rollback, risk analysis and optional
//! execution.
//!
//! ```
//! use schema_diff::schema::{ColumnInfo, SchemaInfo, SchemaSnapshot, TableInfo};
//! use schema_diff::{
//!     ComparisonEngine, ComparisonOptions, SyncDirection, SyncFilters, SyncScriptGenerator,
//! };
//!
//! let mut source = SchemaSnapshot::new();
//! let mut app = SchemaInfo::new("app");
//! let mut users = TableInfo::new("users");
//! users.add_column(ColumnInfo::new("id", "int").position(1).nullable(false));
//! app.add_table(users);
//! source.add_schema(app);
//! let target = SchemaSnapshot::new();
//!
//! let engine = ComparisonEngine::new(ComparisonOptions::default());
//! let outcome = engine.compare(&source, &target)?;
//!
//! let generator =
//!     SyncScriptGenerator::new(SyncDirection::SourceToTarget, SyncFilters::default());
//! let script = generator.generate(&outcome.differences)?;
//! assert!(script.forward_script.contains("CREATE TABLE"));
//! # Ok::<(), schema_diff::Error>(())
//! ```

pub mod compare;
pub mod config;
pub mod db;
pub mod error;
pub mod risk;
pub mod schema;
pub mod sync;
pub mod utils;

pub use compare::{CancelToken, ComparisonEngine, ComparisonOutcome, Progress};
pub use config::{ComparisonOptions, Config, DatabaseConfig, LoggingConfig};
pub use db::DatabaseConnection;
pub use error::{Error, Result};
pub use risk::{
    ExecutionOptions, ExecutionResult, RiskAnalyzer, RiskLevel, RiskReport, ScriptExecutor,
};
pub use schema::{DiffType, DiffValue, Difference, ObjectType, SchemaSnapshot, Severity};
pub use sync::{ScriptSide, SyncDirection, SyncFilters, SyncScript, SyncScriptGenerator};
