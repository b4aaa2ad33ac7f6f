// SPDX-FileCopyrightText: 2025 Russ Fellows <russ.fellows@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

// crates/core/src/table.rs
use std::fmt;

use serde::Serialize;

use crate::stats::{mean, sample_std};
use crate::{PerfError, Result};

/// Rows of named numeric values keyed by ascending run id.
///
/// Each counter owns one of these; the manager joins them column-wise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunTable {
    columns: Vec<String>,
    run_ids: Vec<u64>,
    rows: Vec<Vec<f64>>,
}

impl RunTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            run_ids: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append the values of one run. Run ids must strictly increase.
    pub(crate) fn push(&mut self, owner: &str, run_id: u64, values: Vec<f64>) -> Result<()> {
        if let Some(&last) = self.run_ids.last() {
            if run_id <= last {
                return Err(PerfError::RunIdNotIncreasing {
                    counter: owner.to_string(),
                    run_id,
                    last,
                });
            }
        }
        debug_assert_eq!(values.len(), self.columns.len(), "row width for {owner}");
        self.run_ids.push(run_id);
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn run_ids(&self) -> &[u64] {
        &self.run_ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.run_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.run_ids.is_empty()
    }

    /// All values of the named column, in run order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Value of `column` for `run_id`.
    pub fn value(&self, run_id: u64, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        let row = self.run_ids.iter().position(|&r| r == run_id)?;
        Some(self.rows[row][col])
    }

    /// Join tables horizontally. Every table must cover exactly the same run ids
    /// and column names must be unique across tables.
    pub fn join<'a>(tables: impl IntoIterator<Item = (&'a str, &'a RunTable)>) -> Result<RunTable> {
        let mut joined: Option<RunTable> = None;
        for (owner, table) in tables {
            match joined.as_mut() {
                None => joined = Some(table.clone()),
                Some(acc) => {
                    if let Some(column) = table.columns.iter().find(|c| acc.columns.contains(c)) {
                        return Err(PerfError::DuplicateColumn {
                            counter: owner.to_string(),
                            column: column.clone(),
                        });
                    }
                    if acc.run_ids != table.run_ids {
                        return Err(PerfError::CounterDesync {
                            counter: owner.to_string(),
                            expected: acc.run_ids.clone(),
                            found: table.run_ids.clone(),
                        });
                    }
                    acc.columns.extend(table.columns.iter().cloned());
                    for (row, extra) in acc.rows.iter_mut().zip(&table.rows) {
                        row.extend_from_slice(extra);
                    }
                }
            }
        }
        Ok(joined.unwrap_or_default())
    }

    /// Mean and sample std of every column.
    pub fn summary(&self) -> Summary {
        if self.is_empty() {
            return Summary::default();
        }
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<f64> = self.rows.iter().map(|row| row[idx]).collect();
                ColumnSummary {
                    name: name.clone(),
                    mean: mean(&values).unwrap_or(f64::NAN),
                    std: sample_std(&values),
                }
            })
            .collect();
        Summary { columns }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub mean: f64,
    /// Sample standard deviation; NaN with fewer than two runs.
    pub std: f64,
}

/// Per-column mean/std over completed runs. Empty when no run completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub columns: Vec<ColumnSummary>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.columns {
            writeln!(f, "{:>18}: mean = {:>9.3}; std = {:>9.3}", c.name, c.mean, c.std)?;
        }
        Ok(())
    }
}

/// Row label of the combined results.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RunKey {
    pub workload: String,
    pub dataset: String,
    pub run_id: u64,
}

/// Results of a whole benchmark session, indexed by (workload, dataset, run_id).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    columns: Vec<String>,
    index: Vec<RunKey>,
    rows: Vec<Vec<f64>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label a manager's run table with its workload and dataset.
    pub fn from_runs(workload: &str, dataset: &str, runs: &RunTable) -> Self {
        let index = runs
            .run_ids()
            .iter()
            .map(|&run_id| RunKey {
                workload: workload.to_string(),
                dataset: dataset.to_string(),
                run_id,
            })
            .collect();
        Self {
            columns: runs.columns().to_vec(),
            index,
            rows: runs.rows().to_vec(),
        }
    }

    /// Stack `other` below `self`. Columns are unioned; missing cells become NaN.
    pub fn append(&mut self, other: ResultTable) {
        for col in &other.columns {
            if !self.columns.contains(col) {
                self.columns.push(col.clone());
                for row in &mut self.rows {
                    row.push(f64::NAN);
                }
            }
        }
        for (key, row) in other.index.into_iter().zip(other.rows) {
            let mut aligned = vec![f64::NAN; self.columns.len()];
            for (col, value) in other.columns.iter().zip(row) {
                if let Some(idx) = self.columns.iter().position(|c| c == col) {
                    aligned[idx] = value;
                }
            }
            self.index.push(key);
            self.rows.push(aligned);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[RunKey] {
        &self.index
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn csv_header(&self) -> String {
        let mut fields = vec!["workload".to_string(), "dataset".to_string(), "run_id".to_string()];
        fields.extend(self.columns.iter().map(|c| escape_csv(c)));
        fields.join(",")
    }

    /// Render as CSV. NaN cells are written empty.
    pub fn to_csv(&self) -> String {
        let mut out = self.csv_header();
        out.push('\n');
        for (key, row) in self.index.iter().zip(&self.rows) {
            let mut fields = vec![
                escape_csv(&key.workload),
                escape_csv(&key.dataset),
                key.run_id.to_string(),
            ];
            fields.extend(row.iter().map(|v| if v.is_nan() { String::new() } else { v.to_string() }));
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
