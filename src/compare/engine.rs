//! Comparison engine: lock-step walk over two snapshots
//!
//! The engine is pure over `&SchemaSnapshot` and holds no locks; concurrent
//! comparisons share nothing. Progress is published through a lossy watch
//! channel and cancellation is cooperative, checked at object-kind
//! boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::compare::definitions::{compare_routines, compare_triggers, compare_views};
use crate::compare::rename::{RenameDetector, StructuralRenameDetector};
use crate::compare::tables::compare_schema_tables;
use crate::config::ComparisonOptions;
use crate::error::{Error, Result};
use crate::schema::diff::{self, ComparisonSummary, DiffType, DiffValue, Difference, Severity};
use crate::schema::types::{SchemaInfo, SchemaSnapshot};

/// Run phases, in order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPhase {
    #[default]
    Discovery,
    Comparison,
    Analysis,
    Report,
}

/// Point-in-time progress report. Consumers see the latest value only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    pub phase: ComparisonPhase,
    pub current: usize,
    pub total: usize,
    pub current_object: Option<String>,
}

/// Cooperative cancellation flag, shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Complete result of one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub comparison_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub differences: Vec<Difference>,
    pub warnings: Vec<String>,
    pub summary: ComparisonSummary,
}

/// Compares two normalized snapshots according to `ComparisonOptions`
pub struct ComparisonEngine {
    options: ComparisonOptions,
    rename_detector: Box<dyn RenameDetector>,
    progress: Option<watch::Sender<Progress>>,
    cancel: Option<CancelToken>,
}

impl ComparisonEngine {
    pub fn new(options: ComparisonOptions) -> Self {
        Self {
            options,
            rename_detector: Box::new(StructuralRenameDetector::new()),
            progress: None,
            cancel: None,
        }
    }

    /// Swap in a different rename-matching strategy
    pub fn with_rename_detector(mut self, detector: Box<dyn RenameDetector>) -> Self {
        self.rename_detector = detector;
        self
    }

    pub fn with_progress(mut self, sender: watch::Sender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Compare two snapshots, producing the classified difference list
    pub fn compare(
        &self,
        source: &SchemaSnapshot,
        target: &SchemaSnapshot,
    ) -> Result<ComparisonOutcome> {
        let comparison_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut differences: Vec<Difference> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // Union of schema names, source order first
        let mut schema_names: Vec<String> = Vec::new();
        for name in source.schemas.keys() {
            schema_names.push(name.clone());
        }
        for name in target.schemas.keys() {
            let key = self.options.pairing_key(name);
            if !schema_names
                .iter()
                .any(|n| self.options.pairing_key(n) == key)
            {
                schema_names.push(name.clone());
            }
        }

        let total = schema_names.len();
        self.publish(ComparisonPhase::Discovery, 0, total, None);
        info!(%comparison_id, schemas = total, "starting comparison");

        for (i, name) in schema_names.iter().enumerate() {
            self.check_cancelled()?;
            if !self.options.should_compare_schema(name) {
                continue;
            }
            self.publish(ComparisonPhase::Comparison, i, total, Some(name.clone()));

            let key = self.options.pairing_key(name);
            let source_schema = lookup_schema(&self.options, source, &key);
            let target_schema = lookup_schema(&self.options, target, &key);

            match (source_schema, target_schema) {
                (Some(src), Some(tgt)) => {
                    if self.report_discovery_errors(src, tgt, &mut differences, &mut warnings) {
                        continue;
                    }
                    self.compare_schema_pair(src, tgt, &mut differences)?;
                }
                (Some(src), None) => {
                    differences.push(
                        Difference::new(
                            DiffType::SchemaMissingTarget,
                            Severity::Critical,
                            &src.name,
                            &src.name,
                            &format!(
                                "Schema '{}' exists on source but not on target",
                                src.name
                            ),
                        )
                        .values(Some(DiffValue::Scalar(src.name.clone())), None),
                    );
                    // Descend against an empty schema so every contained
                    // object gets its own creation difference.
                    let empty = SchemaInfo::new(&src.name);
                    self.compare_schema_pair(src, &empty, &mut differences)?;
                }
                (None, Some(tgt)) => {
                    // Dropping the schema cascades; no per-object drops.
                    differences.push(
                        Difference::new(
                            DiffType::SchemaMissingSource,
                            Severity::Critical,
                            &tgt.name,
                            &tgt.name,
                            &format!(
                                "Schema '{}' exists on target but not on source",
                                tgt.name
                            ),
                        )
                        .values(None, Some(DiffValue::Scalar(tgt.name.clone())))
                        .warning(
                            "Potential data loss: synchronizing drops this schema entirely",
                        ),
                    );
                }
                (None, None) => {}
            }
        }

        self.check_cancelled()?;
        self.publish(ComparisonPhase::Analysis, total, total, None);
        let summary = diff::summarize(&differences);
        self.publish(ComparisonPhase::Report, total, total, None);

        let completed_at = Utc::now();
        let duration_secs = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        info!(
            %comparison_id,
            differences = differences.len(),
            duration_secs,
            "comparison complete"
        );

        Ok(ComparisonOutcome {
            comparison_id,
            started_at,
            completed_at,
            duration_secs,
            differences,
            warnings,
            summary,
        })
    }

    fn compare_schema_pair(
        &self,
        source: &SchemaInfo,
        target: &SchemaInfo,
        differences: &mut Vec<Difference>,
    ) -> Result<()> {
        if self.options.compare_tables {
            compare_schema_tables(
                &self.options,
                self.rename_detector.as_ref(),
                &source.name,
                source,
                target,
                differences,
            );
        }
        self.check_cancelled()?;
        if self.options.compare_views {
            compare_views(&self.options, &source.name, source, target, differences);
        }
        self.check_cancelled()?;
        if self.options.compare_triggers {
            compare_triggers(&self.options, &source.name, source, target, differences);
        }
        self.check_cancelled()?;
        if self.options.compare_routines {
            compare_routines(&self.options, &source.name, source, target, differences);
        }
        Ok(())
    }

    /// A side whose discovery failed is reported coarsely instead of being
    /// trusted. Returns true when content comparison must be skipped.
    fn report_discovery_errors(
        &self,
        source: &SchemaInfo,
        target: &SchemaInfo,
        differences: &mut Vec<Difference>,
        warnings: &mut Vec<String>,
    ) -> bool {
        let mut skip = false;
        if let Some(reason) = &source.discovery_error {
            warnings.push(format!(
                "Schema '{}' could not be fully discovered on source: {}",
                source.name, reason
            ));
            differences.push(
                Difference::new(
                    DiffType::SchemaMissingSource,
                    Severity::Critical,
                    &source.name,
                    &source.name,
                    &format!(
                        "Schema '{}' snapshot is incomplete on source ({}); treated as unavailable",
                        source.name, reason
                    ),
                )
                .values(None, Some(DiffValue::Scalar(target.name.clone())))
                .manual_only(),
            );
            skip = true;
        }
        if let Some(reason) = &target.discovery_error {
            warnings.push(format!(
                "Schema '{}' could not be fully discovered on target: {}",
                target.name, reason
            ));
            differences.push(
                Difference::new(
                    DiffType::SchemaMissingTarget,
                    Severity::Critical,
                    &target.name,
                    &target.name,
                    &format!(
                        "Schema '{}' snapshot is incomplete on target ({}); treated as unavailable",
                        target.name, reason
                    ),
                )
                .values(Some(DiffValue::Scalar(source.name.clone())), None)
                .manual_only(),
            );
            skip = true;
        }
        skip
    }

    fn publish(
        &self,
        phase: ComparisonPhase,
        current: usize,
        total: usize,
        current_object: Option<String>,
    ) {
        if let Some(sender) = &self.progress {
            sender.send_replace(Progress {
                phase,
                current,
                total,
                current_object,
            });
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

fn lookup_schema<'a>(
    options: &ComparisonOptions,
    snapshot: &'a SchemaSnapshot,
    key: &str,
) -> Option<&'a SchemaInfo> {
    snapshot
        .schemas
        .values()
        .find(|s| options.pairing_key(&s.name) == key)
}
