//! Rename detection between would-be-dropped and would-be-added objects
//!
//! Snapshots carry no identity beyond names, so renames are inferred
//! structurally. The strategy is pluggable; the default scores attribute
//! overlap and only commits to a rename when exactly one candidate clears
//! the configured threshold. Anything ambiguous stays a drop plus an add.

use crate::schema::types::{ColumnInfo, TableInfo};

/// Strategy for pairing dropped objects with added ones as renames
pub trait RenameDetector: Send + Sync {
    /// Match tables present only on one side against tables present only on
    /// the other. Returns `(source_name, target_name)` pairs.
    fn match_tables(
        &self,
        source_only: &[&TableInfo],
        target_only: &[&TableInfo],
        threshold: f64,
    ) -> Vec<(String, String)>;

    /// Match columns of one table the same way
    fn match_columns(
        &self,
        source_only: &[&ColumnInfo],
        target_only: &[&ColumnInfo],
        threshold: f64,
    ) -> Vec<(String, String)>;
}

/// Default detector: structural similarity scoring.
///
/// Tables score by the fraction of columns matching on name and type across
/// both sides. Columns score by type, nullability and ordinal proximity.
#[derive(Debug, Default)]
pub struct StructuralRenameDetector;

impl StructuralRenameDetector {
    pub fn new() -> Self {
        Self
    }

    fn table_similarity(a: &TableInfo, b: &TableInfo) -> f64 {
        if a.columns.is_empty() && b.columns.is_empty() {
            return 0.0;
        }
        let shared = a
            .columns
            .values()
            .filter(|col| {
                b.columns
                    .get(&col.name)
                    .map(|other| other.column_type == col.column_type)
                    .unwrap_or(false)
            })
            .count();
        (2 * shared) as f64 / (a.columns.len() + b.columns.len()) as f64
    }

    fn column_similarity(a: &ColumnInfo, b: &ColumnInfo) -> f64 {
        let mut score = 0.0;
        if a.column_type == b.column_type {
            score += 0.6;
        }
        if a.is_nullable == b.is_nullable {
            score += 0.2;
        }
        let distance = a.ordinal_position.abs_diff(b.ordinal_position);
        if distance <= 1 {
            score += 0.2;
        }
        score
    }

    /// Generic unique-best-match pass. A pair is committed only when the
    /// candidate is the single one at or above the threshold for that
    /// source object, and the source object is likewise the candidate's
    /// only match. Already-claimed targets are skipped.
    fn unique_matches<T, F>(
        source_only: &[&T],
        target_only: &[&T],
        threshold: f64,
        name: fn(&T) -> &str,
        similarity: F,
    ) -> Vec<(String, String)>
    where
        F: Fn(&T, &T) -> f64,
    {
        let mut pairs = Vec::new();
        let mut claimed: Vec<usize> = Vec::new();

        for &src in source_only {
            let mut qualifying: Vec<usize> = Vec::new();
            for (idx, &tgt) in target_only.iter().enumerate() {
                if claimed.contains(&idx) {
                    continue;
                }
                if similarity(src, tgt) >= threshold {
                    qualifying.push(idx);
                }
            }
            // Ambiguity means no rename
            if qualifying.len() != 1 {
                continue;
            }
            let idx = qualifying[0];
            let reverse_qualifying = source_only
                .iter()
                .copied()
                .filter(|&candidate| similarity(candidate, target_only[idx]) >= threshold)
                .count();
            if reverse_qualifying != 1 {
                continue;
            }
            claimed.push(idx);
            pairs.push((name(src).to_string(), name(target_only[idx]).to_string()));
        }

        pairs
    }
}

impl RenameDetector for StructuralRenameDetector {
    fn match_tables(
        &self,
        source_only: &[&TableInfo],
        target_only: &[&TableInfo],
        threshold: f64,
    ) -> Vec<(String, String)> {
        Self::unique_matches(
            source_only,
            target_only,
            threshold,
            |t| &t.name,
            Self::table_similarity,
        )
    }

    fn match_columns(
        &self,
        source_only: &[&ColumnInfo],
        target_only: &[&ColumnInfo],
        threshold: f64,
    ) -> Vec<(String, String)> {
        Self::unique_matches(
            source_only,
            target_only,
            threshold,
            |c| &c.name,
            Self::column_similarity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, columns: &[(&str, &str)]) -> TableInfo {
        let mut t = TableInfo::new(name);
        for (i, (col, ty)) in columns.iter().enumerate() {
            t.add_column(ColumnInfo::new(col, ty).position(i as u32 + 1));
        }
        t
    }

    #[test]
    fn identical_structure_is_a_rename() {
        let old = table("users_old", &[("id", "int"), ("email", "varchar(255)")]);
        let new = table("users", &[("id", "int"), ("email", "varchar(255)")]);
        let detector = StructuralRenameDetector::new();
        let pairs = detector.match_tables(&[&old], &[&new], 0.8);
        assert_eq!(pairs, vec![("users_old".to_string(), "users".to_string())]);
    }

    #[test]
    fn two_equal_candidates_stay_unmatched() {
        let old = table("users_old", &[("id", "int"), ("email", "varchar(255)")]);
        let a = table("users_a", &[("id", "int"), ("email", "varchar(255)")]);
        let b = table("users_b", &[("id", "int"), ("email", "varchar(255)")]);
        let detector = StructuralRenameDetector::new();
        let pairs = detector.match_tables(&[&old], &[&a, &b], 0.8);
        assert!(pairs.is_empty());
    }

    #[test]
    fn dissimilar_tables_do_not_match() {
        let old = table("users", &[("id", "int"), ("email", "varchar(255)")]);
        let new = table("orders", &[("order_id", "bigint"), ("total", "decimal(10,2)")]);
        let detector = StructuralRenameDetector::new();
        let pairs = detector.match_tables(&[&old], &[&new], 0.8);
        assert!(pairs.is_empty());
    }
}
