//! Raw tables as handed out by the source gateway.
//!
//! Only two datasets carry a two-level header (home/away standings and club
//! season stats), so those use [`GroupedTable`] with an explicit
//! [`ColumnKey`] instead of a generic nested column structure.

use serde::{Deserialize, Serialize};

use crate::error::{PreviewError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PreviewError::schema(format!("missing column `{name}`")))
    }

    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for col in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| from == col) {
                *col = (*to).to_string();
            }
        }
    }

    /// Appends a column; short rows are padded first so the value lands under it.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        let width = self.columns.len();
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.resize(width, String::new());
            row.push(value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey {
    pub group: String,
    pub name: String,
}

impl ColumnKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Single-level label used once the group level has been dropped.
    pub fn flat_label(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else if self.name.is_empty() {
            self.group.clone()
        } else {
            format!("{} {}", self.group, self.name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTable {
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<Vec<String>>,
}

impl GroupedTable {
    pub fn new(columns: Vec<ColumnKey>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, group: &str, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.group == group && c.name == name)
    }

    /// Keeps only the columns accepted by `keep`, preserving order.
    pub fn select(&self, keep: impl Fn(&ColumnKey) -> bool) -> GroupedTable {
        let idx: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| keep(c))
            .map(|(i, _)| i)
            .collect();
        GroupedTable {
            columns: idx.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| idx.iter().map(|&i| cell(row, i).to_string()).collect())
                .collect(),
        }
    }

    /// Drops the group level, keeping only the sub-column names.
    pub fn drop_group_level(self) -> RawTable {
        RawTable {
            columns: self.columns.into_iter().map(|c| c.name).collect(),
            rows: self.rows,
        }
    }
}

/// Home/away standings come as one table with `Home` and `Away` column groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandingsRaw {
    pub overall: RawTable,
    pub home_away: GroupedTable,
}

pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

pub fn parse_f64(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '+' && *c != '%')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

pub fn parse_i64(raw: &str) -> Option<i64> {
    parse_f64(raw).map(|v| v.round() as i64)
}
