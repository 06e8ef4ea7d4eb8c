//! Mode × grade pivot of a cycle's observing-time totals.
//!
//! The backend sends a flat list of `(mode, grade, total)` entries. The grid
//! groups them into one row per mode with a trailing row total, and appends a
//! final row of per-grade column totals plus the grand total.
//!
//! Rows are short: a mode only carries cells for the grades it actually has.
//! Column totals are accumulated by grade name, so a missing pair simply
//! contributes nothing to its column.

use std::collections::HashMap;
use tracing::debug;

use super::scope::ViewScope;
use crate::client::ProposalToolApi;
use crate::models::{CycleId, ModeGradeTotal};

/// Label of the column-totals row.
pub const GRADE_TOTALS_LABEL: &str = "Grade Totals";

#[derive(Debug, Clone, PartialEq)]
pub struct GradeCell {
    pub grade_name: String,
    pub total_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModeRow {
    pub mode_name: String,
    /// Cells in grade order, only for grades present for this mode.
    pub cells: Vec<GradeCell>,
    pub total: f64,
}

impl ModeRow {
    pub fn cell(&self, grade_name: &str) -> Option<f64> {
        self.cells
            .iter()
            .find(|c| c.grade_name == grade_name)
            .map(|c| c.total_time)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModeGradeGrid {
    /// Distinct grade names, in first-seen order after sorting.
    pub grade_names: Vec<String>,
    pub rows: Vec<ModeRow>,
    /// Column totals, parallel to `grade_names`.
    pub grade_totals: Vec<f64>,
    pub grand_total: f64,
}

impl ModeGradeGrid {
    /// Build the grid from the flat totals.
    ///
    /// Entries are ordered by mode name descending, then grade name
    /// ascending; repeated `(mode, grade)` pairs are summed into one cell.
    pub fn pivot(totals: &[ModeGradeTotal]) -> Self {
        let mut sorted: Vec<&ModeGradeTotal> = totals.iter().collect();
        sorted.sort_by(|a, b| {
            b.mode_name
                .cmp(&a.mode_name)
                .then_with(|| a.grade_name.cmp(&b.grade_name))
        });

        let mut grade_names: Vec<String> = Vec::new();
        let mut grade_index: HashMap<&str, usize> = HashMap::new();
        for entry in &sorted {
            if !grade_index.contains_key(entry.grade_name.as_str()) {
                grade_index.insert(entry.grade_name.as_str(), grade_names.len());
                grade_names.push(entry.grade_name.clone());
            }
        }

        let mut grade_totals = vec![0.0; grade_names.len()];
        let mut rows: Vec<ModeRow> = Vec::new();
        for entry in sorted {
            let starts_row = rows
                .last()
                .map_or(true, |row| row.mode_name != entry.mode_name);
            if starts_row {
                rows.push(ModeRow {
                    mode_name: entry.mode_name.clone(),
                    cells: Vec::new(),
                    total: 0.0,
                });
            }
            if let Some(row) = rows.last_mut() {
                // Sorted input keeps repeated pairs adjacent; they share one cell.
                match row.cells.last_mut() {
                    Some(cell) if cell.grade_name == entry.grade_name => {
                        cell.total_time += entry.total_time;
                    }
                    _ => row.cells.push(GradeCell {
                        grade_name: entry.grade_name.clone(),
                        total_time: entry.total_time,
                    }),
                }
                row.total += entry.total_time;
            }
            if let Some(&index) = grade_index.get(entry.grade_name.as_str()) {
                grade_totals[index] += entry.total_time;
            }
        }

        let grand_total = grade_totals.iter().sum();
        debug!(
            modes = rows.len(),
            grades = grade_names.len(),
            grand_total,
            "pivoted observing time totals"
        );

        Self {
            grade_names,
            rows,
            grade_totals,
            grand_total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, mode_name: &str) -> Option<&ModeRow> {
        self.rows.iter().find(|r| r.mode_name == mode_name)
    }

    pub fn cell(&self, mode_name: &str, grade_name: &str) -> Option<f64> {
        self.row(mode_name).and_then(|r| r.cell(grade_name))
    }

    pub fn grade_total(&self, grade_name: &str) -> Option<f64> {
        self.grade_names
            .iter()
            .position(|g| g == grade_name)
            .map(|i| self.grade_totals[i])
    }

    /// Column headings: mode, one per grade, then the row-total column.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.grade_names.len() + 2);
        header.push("Mode".to_string());
        header.extend(self.grade_names.iter().cloned());
        header.push("Mode Totals".to_string());
        header
    }

    /// The closing row: label, per-grade totals, grand total.
    pub fn totals_row(&self) -> (&'static str, &[f64], f64) {
        (GRADE_TOTALS_LABEL, &self.grade_totals, self.grand_total)
    }
}

/// Async load state of the table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableState {
    Loading,
    Error(String),
    Ready(ModeGradeGrid),
}

/// Fetch a cycle's totals and pivot them.
pub async fn load_observing_time_table(
    api: &dyn ProposalToolApi,
    scope: &ViewScope,
    cycle: CycleId,
) -> TableState {
    match scope.run(api.observing_time_totals(cycle)).await {
        Ok(totals) => TableState::Ready(ModeGradeGrid::pivot(&totals)),
        Err(err) => TableState::Error(err.user_message()),
    }
}
