//! Sync script generation

pub mod generator;
pub mod script;
pub mod sql;

pub use generator::SyncScriptGenerator;
pub use script::{ImpactEstimate, ScriptSide, SyncDirection, SyncFilters, SyncScript};
