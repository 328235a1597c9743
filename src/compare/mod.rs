//! Schema comparison

pub mod constraints;
pub mod definitions;
pub mod engine;
pub mod indexes;
pub mod rename;
pub mod tables;

pub use engine::{CancelToken, ComparisonEngine, ComparisonOutcome, ComparisonPhase, Progress};
pub use rename::{RenameDetector, StructuralRenameDetector};
