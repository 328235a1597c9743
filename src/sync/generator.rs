//! Sync script generation
//!
//! Emission rules are written once, in the make-target-match-source frame.
//! The opposite direction and the rollback script both reuse the same rules
//! over an inverted difference list. The authoritative attribute bag is
//! therefore always `source_value`.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::diff::{ChangeClass, DiffType, Difference, ObjectType};
use crate::schema::types::ConstraintKind;
use crate::sync::script::{ImpactEstimate, SyncDirection, SyncFilters, SyncScript};
use crate::sync::sql;

/// Generates forward and rollback DDL from a difference list.
///
/// Generation is pure: the same differences, direction and filters always
/// produce the same script, so output may be cached.
pub struct SyncScriptGenerator {
    direction: SyncDirection,
    filters: SyncFilters,
}

#[derive(Default)]
struct EmissionState {
    rebuilt_columns: HashSet<(String, String, String)>,
    rebuilt_indexes: HashSet<(String, String, String)>,
    rebuilt_constraints: HashSet<(String, String, String)>,
    warnings: Vec<String>,
    validation_errors: Vec<String>,
}

impl EmissionState {
    fn warn_once(&mut self, warning: String) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

impl SyncScriptGenerator {
    pub fn new(direction: SyncDirection, filters: SyncFilters) -> Self {
        Self { direction, filters }
    }

    /// Generate the forward and rollback scripts for the differences
    pub fn generate(&self, differences: &[Difference]) -> Result<SyncScript> {
        let selected: Vec<&Difference> = differences
            .iter()
            .filter(|d| self.filters.matches(d))
            .collect();

        let mut script_warnings: Vec<String> = Vec::new();
        if selected.is_empty() && !differences.is_empty() {
            script_warnings
                .push("No differences matched the filters; the script is empty".to_string());
        }

        // Orient into the make-target-match-source frame
        let oriented: Vec<Difference> = match self.direction {
            SyncDirection::SourceToTarget => selected.into_iter().cloned().collect(),
            SyncDirection::TargetToSource => selected.iter().map(|d| d.inverted()).collect(),
        };
        let reversed: Vec<Difference> = oriented.iter().map(|d| d.inverted()).collect();

        let mut forward_state = EmissionState::default();
        let forward_statements = self.emit(&oriented, &mut forward_state);
        let mut rollback_state = EmissionState::default();
        let rollback_statements = self.emit(&reversed, &mut rollback_state);

        for warning in forward_state.warnings {
            if !script_warnings.contains(&warning) {
                script_warnings.push(warning);
            }
        }

        let estimated_impact = analyze_impact(&oriented);
        let estimated_duration_secs = estimate_duration(&oriented, forward_statements.len());
        let requires_downtime = requires_downtime(&oriented);
        let data_loss_risk = has_data_loss_risk(&oriented);

        if data_loss_risk {
            warn!(
                statements = forward_statements.len(),
                "generated script carries data loss risk"
            );
        }
        debug!(
            forward = forward_statements.len(),
            rollback = rollback_statements.len(),
            "script generation complete"
        );

        let validation_errors = forward_state.validation_errors;
        let forward_script = format_script(
            "forward",
            self.direction,
            &forward_statements,
            &script_warnings,
        );
        let rollback_script = format_script(
            "rollback",
            self.direction,
            &rollback_statements,
            &rollback_state.warnings,
        );

        Ok(SyncScript {
            direction: self.direction,
            forward_script,
            rollback_script,
            forward_statements,
            rollback_statements,
            warnings: script_warnings,
            estimated_impact,
            estimated_duration_secs,
            requires_downtime,
            data_loss_risk,
            validated: validation_errors.is_empty(),
            validation_errors,
        })
    }

    /// Sort by fix order and emit statements, consolidating rebuilds
    fn emit(&self, differences: &[Difference], state: &mut EmissionState) -> Vec<String> {
        let mut ordered: Vec<&Difference> = differences.iter().collect();
        ordered.sort_by(|a, b| {
            (a.fix_order, &a.schema_name, &a.object_name, &a.sub_object_name).cmp(&(
                b.fix_order,
                &b.schema_name,
                &b.object_name,
                &b.sub_object_name,
            ))
        });

        let mut statements: Vec<String> = Vec::new();
        for difference in ordered {
            statements.extend(self.statements_for(difference, state));
        }
        statements
    }

    fn statements_for(&self, diff: &Difference, state: &mut EmissionState) -> Vec<String> {
        if !diff.can_auto_fix {
            state.warn_once(format!("Manual action required: {}", diff.description));
            return vec![format!("-- MANUAL: {}", diff.description)];
        }

        let schema = diff.schema_name.clone().unwrap_or_default();
        let table = diff.object_name.clone();

        use DiffType::*;
        match diff.diff_type {
            SchemaMissingTarget => vec![sql::render_create_database(&schema)],
            SchemaMissingSource => vec![sql::render_drop_database(&schema)],

            TableMissingTarget => match diff.source_value.as_ref().and_then(|v| v.as_table()) {
                // A bag without columns cannot render a valid CREATE TABLE
                Some(bag) if !bag.columns.is_empty() => sql::render_create_table(&schema, bag),
                _ => self.placeholder(diff, state),
            },
            TableMissingSource => vec![sql::render_drop_table(&schema, &table)],
            TableRenamed => {
                let new_name = diff.source_value.as_ref().and_then(|v| v.as_table());
                let old_name = diff.target_value.as_ref().and_then(|v| v.as_table());
                match (old_name, new_name) {
                    (Some(old), Some(new)) => vec![format!(
                        "RENAME TABLE {} TO {};",
                        sql::qualified(&schema, &old.name),
                        sql::qualified(&schema, &new.name)
                    )],
                    _ => self.placeholder(diff, state),
                }
            }
            TableOptionsChanged => self.table_option_statement(diff, &schema, &table, state),

            ColumnRemoved => match diff.source_value.as_ref().and_then(|v| v.as_column()) {
                Some(bag) => vec![format!(
                    "ALTER TABLE {} ADD COLUMN {};",
                    sql::qualified(&schema, &table),
                    sql::render_column_definition(bag)
                )],
                None => self.placeholder(diff, state),
            },
            ColumnAdded => match &diff.sub_object_name {
                Some(column) => vec![format!(
                    "ALTER TABLE {} DROP COLUMN {};",
                    sql::qualified(&schema, &table),
                    sql::quote_ident(column)
                )],
                None => self.placeholder(diff, state),
            },
            ColumnRenamed => {
                let new_bag = diff.source_value.as_ref().and_then(|v| v.as_column());
                let old_bag = diff.target_value.as_ref().and_then(|v| v.as_column());
                match (old_bag, new_bag) {
                    (Some(old), Some(new)) => vec![format!(
                        "ALTER TABLE {} CHANGE COLUMN {} {};",
                        sql::qualified(&schema, &table),
                        sql::quote_ident(&old.name),
                        sql::render_column_definition(new)
                    )],
                    _ => self.placeholder(diff, state),
                }
            }
            ColumnTypeChanged | ColumnNullableChanged | ColumnDefaultChanged
            | ColumnExtraChanged => {
                // Every attribute change for one column collapses into a
                // single complete MODIFY COLUMN.
                let column = diff.sub_object_name.clone().unwrap_or_default();
                let key = (schema.clone(), table.clone(), column);
                if !state.rebuilt_columns.insert(key) {
                    return Vec::new();
                }
                match diff.source_value.as_ref().and_then(|v| v.as_column()) {
                    Some(bag) => vec![format!(
                        "ALTER TABLE {} MODIFY COLUMN {};",
                        sql::qualified(&schema, &table),
                        sql::render_column_definition(bag)
                    )],
                    None => self.placeholder(diff, state),
                }
            }

            IndexMissingTarget => match diff.source_value.as_ref().and_then(|v| v.as_index()) {
                Some(bag) => vec![sql::render_create_index(&schema, &table, bag)],
                None => self.placeholder(diff, state),
            },
            IndexMissingSource => match &diff.sub_object_name {
                Some(index) => vec![sql::render_drop_index(&schema, &table, index)],
                None => self.placeholder(diff, state),
            },
            IndexColumnsChanged | IndexTypeChanged | IndexUniqueChanged => {
                let index = diff.sub_object_name.clone().unwrap_or_default();
                let key = (schema.clone(), table.clone(), index.clone());
                if !state.rebuilt_indexes.insert(key) {
                    return Vec::new();
                }
                match diff.source_value.as_ref().and_then(|v| v.as_index()) {
                    Some(bag) => vec![
                        sql::render_drop_index(&schema, &table, &index),
                        sql::render_create_index(&schema, &table, bag),
                    ],
                    None => self.placeholder(diff, state),
                }
            }
            // Duplicate-index differences never auto-fix; handled above.
            IndexDuplicateSource | IndexDuplicateTarget => self.placeholder(diff, state),

            ConstraintMissingTarget => {
                match diff.source_value.as_ref().and_then(|v| v.as_constraint()) {
                    Some(bag) => vec![sql::render_add_constraint(&schema, &table, bag)],
                    None => self.placeholder(diff, state),
                }
            }
            ConstraintMissingSource => {
                match diff.target_value.as_ref().and_then(|v| v.as_constraint()) {
                    Some(bag) => vec![sql::render_drop_constraint(&schema, &table, bag)],
                    None => self.placeholder(diff, state),
                }
            }
            ConstraintDefinitionChanged => {
                let name = diff.sub_object_name.clone().unwrap_or_default();
                let key = (schema.clone(), table.clone(), name);
                if !state.rebuilt_constraints.insert(key) {
                    return Vec::new();
                }
                let new_bag = diff.source_value.as_ref().and_then(|v| v.as_constraint());
                let old_bag = diff.target_value.as_ref().and_then(|v| v.as_constraint());
                match (old_bag, new_bag) {
                    (Some(old), Some(new)) => vec![
                        sql::render_drop_constraint(&schema, &table, old),
                        sql::render_add_constraint(&schema, &table, new),
                    ],
                    _ => self.placeholder(diff, state),
                }
            }

            ViewMissingTarget | ViewDefinitionChanged => {
                match diff.source_value.as_ref().and_then(|v| v.as_view()) {
                    Some(bag) => vec![format!(
                        "CREATE OR REPLACE VIEW {} AS {};",
                        sql::qualified(&schema, &bag.name),
                        bag.definition.trim_end_matches(';')
                    )],
                    None => self.placeholder(diff, state),
                }
            }
            ViewMissingSource => vec![format!(
                "DROP VIEW IF EXISTS {};",
                sql::qualified(&schema, &table)
            )],

            TriggerMissingTarget => match diff.source_value.as_ref().and_then(|v| v.as_trigger()) {
                Some(bag) => vec![render_create_trigger(&schema, bag)],
                None => self.placeholder(diff, state),
            },
            TriggerMissingSource => vec![format!(
                "DROP TRIGGER IF EXISTS {};",
                sql::qualified(&schema, &table)
            )],
            TriggerDefinitionChanged => {
                match diff.source_value.as_ref().and_then(|v| v.as_trigger()) {
                    Some(bag) => vec![
                        format!(
                            "DROP TRIGGER IF EXISTS {};",
                            sql::qualified(&schema, &bag.name)
                        ),
                        render_create_trigger(&schema, bag),
                    ],
                    None => self.placeholder(diff, state),
                }
            }

            RoutineMissingTarget | RoutineDefinitionChanged => {
                match diff.source_value.as_ref().and_then(|v| v.as_routine()) {
                    Some(bag) => {
                        let mut definition = bag.definition.trim().to_string();
                        if !definition.ends_with(';') {
                            definition.push(';');
                        }
                        vec![
                            format!(
                                "DROP {} IF EXISTS {};",
                                bag.kind.keyword(),
                                sql::qualified(&schema, &bag.name)
                            ),
                            definition,
                        ]
                    }
                    None => self.placeholder(diff, state),
                }
            }
            RoutineMissingSource => match diff.target_value.as_ref().and_then(|v| v.as_routine()) {
                Some(bag) => vec![format!(
                    "DROP {} IF EXISTS {};",
                    bag.kind.keyword(),
                    sql::qualified(&schema, &bag.name)
                )],
                None => self.placeholder(diff, state),
            },

            PartitionMissingTarget => {
                match diff.source_value.as_ref().and_then(|v| v.as_partition()) {
                    Some(bag) => {
                        let boundary = bag.description.clone().unwrap_or_default();
                        vec![format!(
                            "ALTER TABLE {} ADD PARTITION (PARTITION {} {});",
                            sql::qualified(&schema, &table),
                            sql::quote_ident(&bag.name),
                            boundary
                        )]
                    }
                    None => self.placeholder(diff, state),
                }
            }
            PartitionMissingSource => match &diff.sub_object_name {
                Some(partition) => vec![format!(
                    "ALTER TABLE {} DROP PARTITION {};",
                    sql::qualified(&schema, &table),
                    sql::quote_ident(partition)
                )],
                None => self.placeholder(diff, state),
            },
            PartitionMethodChanged => {
                match diff.source_value.as_ref().and_then(|v| v.as_scalar()) {
                    Some(scheme) => {
                        state.warn_once(format!(
                            "Repartitioning table '{}' rebuilds it entirely; review partition boundaries first",
                            table
                        ));
                        vec![
                            format!(
                                "-- WARNING: repartitioning rebuilds {} and boundary definitions must be reviewed",
                                sql::qualified(&schema, &table)
                            ),
                            format!(
                                "ALTER TABLE {} PARTITION BY {};",
                                sql::qualified(&schema, &table),
                                scheme
                            ),
                        ]
                    }
                    None => self.placeholder(diff, state),
                }
            }
        }
    }

    fn table_option_statement(
        &self,
        diff: &Difference,
        schema: &str,
        table: &str,
        state: &mut EmissionState,
    ) -> Vec<String> {
        let value = diff.source_value.as_ref().and_then(|v| v.as_scalar());
        let clause = match (diff.sub_object_name.as_deref(), value) {
            (Some("engine"), Some(engine)) => format!("ENGINE={}", engine),
            (Some("collation"), Some(collation)) => format!("COLLATE={}", collation),
            (Some("comment"), value) => {
                format!("COMMENT={}", sql::quote_string(value.unwrap_or("")))
            }
            _ => return self.placeholder(diff, state),
        };
        vec![format!(
            "ALTER TABLE {} {};",
            sql::qualified(schema, table),
            clause
        )]
    }

    /// An emission rule exists but the data to apply it is missing. The
    /// script stays usable; a marker, a warning and a validation error
    /// record the gap.
    fn placeholder(&self, diff: &Difference, state: &mut EmissionState) -> Vec<String> {
        let message = format!(
            "Cannot generate DDL for {} ({}): required definition missing",
            diff.qualified_object(),
            diff.diff_type.as_str()
        );
        state.warn_once(message.clone());
        state.validation_errors.push(message);
        vec![format!("-- PLACEHOLDER: {}", diff.description)]
    }
}

fn render_create_trigger(schema: &str, trigger: &crate::schema::types::TriggerInfo) -> String {
    format!(
        "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {};",
        sql::qualified(schema, &trigger.name),
        trigger.timing,
        trigger.event,
        sql::qualified(schema, &trigger.table),
        trigger.statement.trim_end_matches(';')
    )
}

fn format_script(
    side: &str,
    direction: SyncDirection,
    statements: &[String],
    warnings: &[String],
) -> String {
    let mut lines = vec![
        "-- ============================================================".to_string(),
        format!("-- Schema synchronization script ({})", side),
        format!("-- Direction: {}", direction.describe()),
        format!("-- Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        format!("-- Statements: {}", statements.len()),
        "-- ============================================================".to_string(),
    ];
    for warning in warnings {
        lines.push(format!("-- WARNING: {}", warning));
    }
    lines.push(String::new());
    lines.push("SET FOREIGN_KEY_CHECKS = 0;".to_string());
    lines.push(String::new());
    for statement in statements {
        lines.push(statement.clone());
    }
    lines.push(String::new());
    lines.push("SET FOREIGN_KEY_CHECKS = 1;".to_string());
    lines.join("\n")
}

fn analyze_impact(differences: &[Difference]) -> ImpactEstimate {
    let mut impact = ImpactEstimate {
        total_changes: differences.len(),
        ..Default::default()
    };

    for diff in differences {
        if matches!(
            diff.object_type,
            ObjectType::Table | ObjectType::Column | ObjectType::Index | ObjectType::Constraint
        ) {
            let table = diff.qualified_object();
            if !impact.affected_tables.contains(&table) {
                impact.affected_tables.push(table);
            }
        }
        match diff.object_type {
            ObjectType::Index => {
                impact.index_rebuilds += 1;
                impact.potential_locks.push(format!(
                    "Index work on {} may lock writes",
                    diff.qualified_object()
                ));
            }
            ObjectType::Constraint => impact.constraint_changes += 1,
            _ => {}
        }
        if diff.diff_type == DiffType::ColumnTypeChanged {
            impact.data_type_changes += 1;
            impact.potential_locks.push(format!(
                "Type change on {} rewrites the table",
                diff.qualified_object()
            ));
        }
        for warning in &diff.warnings {
            if !impact.risks.contains(warning) {
                impact.risks.push(warning.clone());
            }
        }
    }

    impact
}

fn estimate_duration(differences: &[Difference], statement_count: usize) -> f64 {
    let mut seconds = statement_count as f64 * 0.5;
    for diff in differences {
        seconds += match diff.diff_type {
            DiffType::ColumnTypeChanged => 60.0,
            DiffType::PartitionMethodChanged => 300.0,
            _ if diff.object_type == ObjectType::Index => 30.0,
            _ => 0.0,
        };
    }
    seconds
}

fn requires_downtime(differences: &[Difference]) -> bool {
    differences.iter().any(|diff| {
        if diff.diff_type == DiffType::PartitionMethodChanged {
            return true;
        }
        let touches_primary_key = |value: &Option<crate::schema::diff::DiffValue>| {
            value
                .as_ref()
                .and_then(|v| v.as_constraint())
                .map(|c| c.kind == ConstraintKind::PrimaryKey)
                .unwrap_or(false)
        };
        diff.object_type == ObjectType::Constraint
            && diff.diff_type != DiffType::ConstraintMissingTarget
            && (touches_primary_key(&diff.source_value) || touches_primary_key(&diff.target_value))
    })
}

fn has_data_loss_risk(differences: &[Difference]) -> bool {
    differences.iter().any(|diff| {
        let dropping = diff.diff_type.change_class() == ChangeClass::Drop
            && matches!(
                diff.object_type,
                ObjectType::Schema | ObjectType::Table | ObjectType::Column | ObjectType::Partition
            );
        dropping
            || diff
                .warnings
                .iter()
                .any(|w| w.to_lowercase().contains("data loss"))
    })
}
