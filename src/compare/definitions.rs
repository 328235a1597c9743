//! View, trigger and routine comparison
//!
//! These objects carry a body rather than structured attributes, so the
//! comparison is presence plus whitespace-normalized body equality.

use crate::config::ComparisonOptions;
use crate::schema::diff::{DiffType, DiffValue, Difference, Severity};
use crate::schema::types::SchemaInfo;

pub fn compare_views(
    options: &ComparisonOptions,
    schema_name: &str,
    source: &SchemaInfo,
    target: &SchemaInfo,
    differences: &mut Vec<Difference>,
) {
    for view in source.views.values() {
        let key = options.pairing_key(&view.name);
        let other = target
            .views
            .values()
            .find(|v| options.pairing_key(&v.name) == key);
        match other {
            None => differences.push(
                Difference::new(
                    DiffType::ViewMissingTarget,
                    Severity::Medium,
                    schema_name,
                    &view.name,
                    &format!("View '{}' exists on source but not on target", view.name),
                )
                .values(Some(DiffValue::View(view.clone())), None),
            ),
            Some(other) => {
                if normalize_body(&view.definition) != normalize_body(&other.definition) {
                    differences.push(
                        Difference::new(
                            DiffType::ViewDefinitionChanged,
                            Severity::Medium,
                            schema_name,
                            &view.name,
                            &format!(
                                "View '{}' definition differs between source and target",
                                view.name
                            ),
                        )
                        .values(
                            Some(DiffValue::View(view.clone())),
                            Some(DiffValue::View(other.clone())),
                        ),
                    );
                }
            }
        }
    }
    for view in target.views.values() {
        let key = options.pairing_key(&view.name);
        if !source
            .views
            .values()
            .any(|v| options.pairing_key(&v.name) == key)
        {
            differences.push(
                Difference::new(
                    DiffType::ViewMissingSource,
                    Severity::Medium,
                    schema_name,
                    &view.name,
                    &format!("View '{}' exists on target but not on source", view.name),
                )
                .values(None, Some(DiffValue::View(view.clone()))),
            );
        }
    }
}

pub fn compare_triggers(
    options: &ComparisonOptions,
    schema_name: &str,
    source: &SchemaInfo,
    target: &SchemaInfo,
    differences: &mut Vec<Difference>,
) {
    for trigger in source.triggers.values() {
        let key = options.pairing_key(&trigger.name);
        let other = target
            .triggers
            .values()
            .find(|t| options.pairing_key(&t.name) == key);
        match other {
            None => differences.push(
                Difference::new(
                    DiffType::TriggerMissingTarget,
                    Severity::Medium,
                    schema_name,
                    &trigger.name,
                    &format!(
                        "Trigger '{}' exists on source but not on target",
                        trigger.name
                    ),
                )
                .values(Some(DiffValue::Trigger(trigger.clone())), None),
            ),
            Some(other) => {
                let same = trigger.table == other.table
                    && trigger.timing.eq_ignore_ascii_case(&other.timing)
                    && trigger.event.eq_ignore_ascii_case(&other.event)
                    && normalize_body(&trigger.statement) == normalize_body(&other.statement);
                if !same {
                    differences.push(
                        Difference::new(
                            DiffType::TriggerDefinitionChanged,
                            Severity::Medium,
                            schema_name,
                            &trigger.name,
                            &format!(
                                "Trigger '{}' definition differs between source and target",
                                trigger.name
                            ),
                        )
                        .values(
                            Some(DiffValue::Trigger(trigger.clone())),
                            Some(DiffValue::Trigger(other.clone())),
                        ),
                    );
                }
            }
        }
    }
    for trigger in target.triggers.values() {
        let key = options.pairing_key(&trigger.name);
        if !source
            .triggers
            .values()
            .any(|t| options.pairing_key(&t.name) == key)
        {
            differences.push(
                Difference::new(
                    DiffType::TriggerMissingSource,
                    Severity::Medium,
                    schema_name,
                    &trigger.name,
                    &format!(
                        "Trigger '{}' exists on target but not on source",
                        trigger.name
                    ),
                )
                .values(None, Some(DiffValue::Trigger(trigger.clone()))),
            );
        }
    }
}

pub fn compare_routines(
    options: &ComparisonOptions,
    schema_name: &str,
    source: &SchemaInfo,
    target: &SchemaInfo,
    differences: &mut Vec<Difference>,
) {
    for routine in source.routines.values() {
        let key = options.pairing_key(&routine.name);
        let other = target
            .routines
            .values()
            .find(|r| options.pairing_key(&r.name) == key);
        match other {
            None => differences.push(
                Difference::new(
                    DiffType::RoutineMissingTarget,
                    Severity::Medium,
                    schema_name,
                    &routine.name,
                    &format!(
                        "Routine '{}' exists on source but not on target",
                        routine.name
                    ),
                )
                .values(Some(DiffValue::Routine(routine.clone())), None),
            ),
            Some(other) => {
                let same = routine.kind == other.kind
                    && normalize_body(&routine.definition) == normalize_body(&other.definition);
                if !same {
                    differences.push(
                        Difference::new(
                            DiffType::RoutineDefinitionChanged,
                            Severity::Medium,
                            schema_name,
                            &routine.name,
                            &format!(
                                "Routine '{}' definition differs between source and target",
                                routine.name
                            ),
                        )
                        .values(
                            Some(DiffValue::Routine(routine.clone())),
                            Some(DiffValue::Routine(other.clone())),
                        ),
                    );
                }
            }
        }
    }
    for routine in target.routines.values() {
        let key = options.pairing_key(&routine.name);
        if !source
            .routines
            .values()
            .any(|r| options.pairing_key(&r.name) == key)
        {
            differences.push(
                Difference::new(
                    DiffType::RoutineMissingSource,
                    Severity::Medium,
                    schema_name,
                    &routine.name,
                    &format!(
                        "Routine '{}' exists on target but not on source",
                        routine.name
                    ),
                )
                .values(None, Some(DiffValue::Routine(routine.clone()))),
            );
        }
    }
}

/// Collapse runs of whitespace so formatting-only differences do not count
fn normalize_body(body: &str) -> String {
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}
