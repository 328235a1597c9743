//! Sync script model

use serde::{Deserialize, Serialize};

use crate::schema::diff::{Difference, ObjectType, Severity};

/// Which way the synchronization flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Make the target match the source
    SourceToTarget,
    /// Make the source match the target
    TargetToSource,
}

impl SyncDirection {
    pub fn describe(&self) -> &'static str {
        match self {
            SyncDirection::SourceToTarget => "source -> target (make target match source)",
            SyncDirection::TargetToSource => "target -> source (make source match target)",
        }
    }
}

/// Which half of a generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSide {
    Forward,
    Rollback,
}

/// Subset selection applied before generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncFilters {
    pub schemas: Option<Vec<String>>,
    pub object_types: Option<Vec<ObjectType>>,
    pub severities: Option<Vec<Severity>>,
}

impl SyncFilters {
    pub fn matches(&self, difference: &Difference) -> bool {
        if let Some(schemas) = &self.schemas {
            match &difference.schema_name {
                Some(name) if schemas.iter().any(|s| s == name) => {}
                _ => return false,
            }
        }
        if let Some(object_types) = &self.object_types {
            if !object_types.contains(&difference.object_type) {
                return false;
            }
        }
        if let Some(severities) = &self.severities {
            if !severities.contains(&difference.severity) {
                return false;
            }
        }
        true
    }
}

/// Rough cost breakdown of applying a script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub total_changes: usize,
    pub affected_tables: Vec<String>,
    pub index_rebuilds: usize,
    pub constraint_changes: usize,
    pub data_type_changes: usize,
    pub potential_locks: Vec<String>,
    pub risks: Vec<String>,
}

/// A generated synchronization script pair with its analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncScript {
    pub direction: SyncDirection,
    pub forward_script: String,
    pub rollback_script: String,
    pub forward_statements: Vec<String>,
    pub rollback_statements: Vec<String>,
    pub warnings: Vec<String>,
    pub estimated_impact: ImpactEstimate,
    pub estimated_duration_secs: f64,
    pub requires_downtime: bool,
    pub data_loss_risk: bool,
    pub validated: bool,
    pub validation_errors: Vec<String>,
}

impl SyncScript {
    pub fn statements(&self, side: ScriptSide) -> &[String] {
        match side {
            ScriptSide::Forward => &self.forward_statements,
            ScriptSide::Rollback => &self.rollback_statements,
        }
    }
}
