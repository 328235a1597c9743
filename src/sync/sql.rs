//! MySQL-dialect DDL templates
//!
//! Every literal piece of SQL the generator emits lives here, so targeting
//! another dialect means replacing this module only.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::types::{ColumnInfo, ConstraintInfo, ConstraintKind, IndexInfo, TableInfo};

/// Quote an identifier with backticks, doubling embedded backticks
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `schema`.`object`
pub fn qualified(schema: &str, object: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(object))
}

/// Escape a string literal body: backslashes first, then quote doubling
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

/// A quoted string literal
pub fn quote_string(value: &str) -> String {
    format!("'{}'", escape_string(value))
}

static EXPRESSION_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(current_timestamp(\(\d*\))?|now\(\)|current_date|current_time|null)$",
    )
    .unwrap()
});

static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// Recognized non-literal default expressions are emitted verbatim;
/// everything else is quoted as a string.
pub fn is_expression_default(value: &str) -> bool {
    let trimmed = value.trim();
    EXPRESSION_DEFAULT.is_match(trimmed)
        || NUMERIC_LITERAL.is_match(trimmed)
        || (trimmed.starts_with('(') && trimmed.ends_with(')'))
}

/// Render a DEFAULT clause value
pub fn render_default(value: &str) -> String {
    if is_expression_default(value) {
        value.trim().to_string()
    } else {
        quote_string(value)
    }
}

/// Render the complete column definition: name, type, charset, collation,
/// nullability, default, extra flags and comment. Used for ADD, MODIFY and
/// CHANGE clauses and inside CREATE TABLE.
pub fn render_column_definition(column: &ColumnInfo) -> String {
    let mut parts = vec![quote_ident(&column.name), column.column_type.clone()];

    if let Some(charset) = &column.charset {
        parts.push(format!("CHARACTER SET {}", charset));
    }
    if let Some(collation) = &column.collation {
        parts.push(format!("COLLATE {}", collation));
    }
    parts.push(if column.is_nullable {
        "NULL".to_string()
    } else {
        "NOT NULL".to_string()
    });
    if let Some(default) = &column.default {
        parts.push(format!("DEFAULT {}", render_default(default)));
    }
    if let Some(extra) = &column.extra {
        if !extra.trim().is_empty() {
            parts.push(extra.trim().to_string());
        }
    }
    if let Some(comment) = &column.comment {
        parts.push(format!("COMMENT {}", quote_string(comment)));
    }

    parts.join(" ")
}

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// CREATE [UNIQUE] INDEX statement
pub fn render_create_index(schema: &str, table: &str, index: &IndexInfo) -> String {
    let unique = if index.is_unique { "UNIQUE " } else { "" };
    let using = index
        .method
        .as_ref()
        .map(|m| format!(" USING {}", m))
        .unwrap_or_default();
    format!(
        "CREATE {}INDEX {} ON {} ({}){};",
        unique,
        quote_ident(&index.name),
        qualified(schema, table),
        column_list(&index.columns),
        using
    )
}

pub fn render_drop_index(schema: &str, table: &str, index_name: &str) -> String {
    format!(
        "DROP INDEX {} ON {};",
        quote_ident(index_name),
        qualified(schema, table)
    )
}

/// Inline constraint clause as it appears in CREATE TABLE or ALTER..ADD
pub fn render_constraint_clause(constraint: &ConstraintInfo) -> String {
    match constraint.kind {
        ConstraintKind::PrimaryKey => {
            format!("PRIMARY KEY ({})", column_list(&constraint.columns))
        }
        ConstraintKind::Unique => format!(
            "CONSTRAINT {} UNIQUE ({})",
            quote_ident(&constraint.name),
            column_list(&constraint.columns)
        ),
        ConstraintKind::ForeignKey => {
            let referenced = match (&constraint.referenced_schema, &constraint.referenced_table) {
                (Some(schema), Some(table)) => qualified(schema, table),
                (None, Some(table)) => quote_ident(table),
                _ => String::new(),
            };
            let mut clause = format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_ident(&constraint.name),
                column_list(&constraint.columns),
                referenced,
                column_list(&constraint.referenced_columns)
            );
            if let Some(rule) = &constraint.update_rule {
                clause.push_str(&format!(" ON UPDATE {}", rule));
            }
            if let Some(rule) = &constraint.delete_rule {
                clause.push_str(&format!(" ON DELETE {}", rule));
            }
            clause
        }
        ConstraintKind::Check => format!(
            "CONSTRAINT {} CHECK ({})",
            quote_ident(&constraint.name),
            constraint.check_clause.as_deref().unwrap_or("TRUE")
        ),
    }
}

pub fn render_add_constraint(schema: &str, table: &str, constraint: &ConstraintInfo) -> String {
    format!(
        "ALTER TABLE {} ADD {};",
        qualified(schema, table),
        render_constraint_clause(constraint)
    )
}

pub fn render_drop_constraint(schema: &str, table: &str, constraint: &ConstraintInfo) -> String {
    let clause = match constraint.kind {
        ConstraintKind::PrimaryKey => "DROP PRIMARY KEY".to_string(),
        ConstraintKind::ForeignKey => {
            format!("DROP FOREIGN KEY {}", quote_ident(&constraint.name))
        }
        ConstraintKind::Unique => format!("DROP INDEX {}", quote_ident(&constraint.name)),
        ConstraintKind::Check => format!("DROP CHECK {}", quote_ident(&constraint.name)),
    };
    format!("ALTER TABLE {} {};", qualified(schema, table), clause)
}

/// PARTITION BY clause from the table's partition list, if any
pub fn render_partition_clause(table: &TableInfo) -> Option<String> {
    let first = table.partitions.values().next()?;
    let mut clause = format!("PARTITION BY {} ({})", first.method, first.expression);
    let parts: Vec<String> = table
        .partitions
        .values()
        .map(|p| match &p.description {
            Some(description) => format!("PARTITION {} {}", quote_ident(&p.name), description),
            None => format!("PARTITION {}", quote_ident(&p.name)),
        })
        .collect();
    if !parts.is_empty() {
        clause.push_str(&format!(" (\n  {}\n)", parts.join(",\n  ")));
    }
    Some(clause)
}

/// Full CREATE TABLE rendering from a table bag: columns in ordinal order,
/// inline primary key / unique / foreign key / check constraints, table
/// options and partitioning. Non-unique secondary indexes follow as
/// separate CREATE INDEX statements.
pub fn render_create_table(schema: &str, table: &TableInfo) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for column in table.ordered_columns() {
        lines.push(format!("  {}", render_column_definition(column)));
    }
    for constraint in table.constraints.values() {
        lines.push(format!("  {}", render_constraint_clause(constraint)));
    }
    for index in table.indexes.values().filter(|i| i.is_unique) {
        lines.push(format!(
            "  UNIQUE KEY {} ({})",
            quote_ident(&index.name),
            column_list(&index.columns)
        ));
    }

    let mut statement = format!(
        "CREATE TABLE {} (\n{}\n)",
        qualified(schema, &table.name),
        lines.join(",\n")
    );
    if let Some(engine) = &table.engine {
        statement.push_str(&format!(" ENGINE={}", engine));
    }
    if let Some(collation) = &table.collation {
        statement.push_str(&format!(" COLLATE={}", collation));
    }
    if let Some(comment) = &table.comment {
        statement.push_str(&format!(" COMMENT={}", quote_string(comment)));
    }
    if let Some(partitioning) = render_partition_clause(table) {
        statement.push_str(&format!("\n{}", partitioning));
    }
    statement.push(';');

    let mut statements = vec![statement];
    for index in table.indexes.values().filter(|i| !i.is_unique) {
        statements.push(render_create_index(schema, &table.name, index));
    }
    statements
}

pub fn render_drop_table(schema: &str, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", qualified(schema, table))
}

pub fn render_create_database(schema: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {};", quote_ident(schema))
}

pub fn render_drop_database(schema: &str) -> String {
    format!("DROP DATABASE IF EXISTS {};", quote_ident(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_defaults_are_escaped() {
        assert_eq!(render_default("O'Brien"), "'O''Brien'");
        assert_eq!(render_default(r"C:\tmp"), r"'C:\\tmp'");
    }

    #[test]
    fn expression_defaults_stay_verbatim() {
        assert_eq!(render_default("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(render_default("CURRENT_TIMESTAMP(6)"), "CURRENT_TIMESTAMP(6)");
        assert_eq!(render_default("NOW()"), "NOW()");
        assert_eq!(render_default("0"), "0");
        assert_eq!(render_default("-3.5"), "-3.5");
        assert_eq!(render_default("(uuid())"), "(uuid())");
    }

    #[test]
    fn column_definition_renders_every_attribute() {
        let column = ColumnInfo::new("status", "varchar(20)")
            .nullable(false)
            .default_value("active")
            .comment("current state");
        assert_eq!(
            render_column_definition(&column),
            "`status` varchar(20) NOT NULL DEFAULT 'active' COMMENT 'current state'"
        );
    }

    #[test]
    fn identifiers_with_backticks_are_doubled() {
        assert_eq!(quote_ident("odd`name"), "`odd``name`");
    }
}
