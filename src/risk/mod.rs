//! Risk analysis and script execution

pub mod analyzer;
pub mod executor;

pub use analyzer::{DestructiveOperation, RiskAnalyzer, RiskLevel, RiskReport};
pub use executor::{
    ExecutionOptions, ExecutionResult, ScriptExecutor, StatementOutcome, StatementStatus,
};
