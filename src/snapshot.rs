//! Flat-file snapshots of raw source tables.
//!
//! One CSV per dataset key. Two-level tables are written with two header rows;
//! empty labels are written as `Unnamed: <col>_level_<n>` placeholders and read
//! back as empty.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PreviewError, Result};
use crate::table::{ColumnKey, GroupedTable, RawTable};

const PLACEHOLDER_PREFIX: &str = "Unnamed:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    Schedule,
    Standings,
    StandingsHomeAway,
    ClubMatches(String),
    TeamSeasonStats,
    HeadToHead { home_id: String, away_id: String },
}

impl SnapshotKey {
    pub fn file_name(&self) -> String {
        match self {
            SnapshotKey::Schedule => "schedule.csv".to_string(),
            SnapshotKey::Standings => "standings.csv".to_string(),
            SnapshotKey::StandingsHomeAway => "standings_home_away.csv".to_string(),
            SnapshotKey::ClubMatches(club) => format!("stats_{}.csv", file_safe(club)),
            SnapshotKey::TeamSeasonStats => "team_season_stats.csv".to_string(),
            SnapshotKey::HeadToHead { home_id, away_id } => {
                format!("h2h_{}_{}.csv", file_safe(home_id), file_safe(away_id))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &SnapshotKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn write_flat(&self, key: &SnapshotKey, table: &RawTable) -> Result<PathBuf> {
        let mut records = Vec::with_capacity(table.rows.len() + 1);
        records.push(table.columns.clone());
        records.extend(table.rows.iter().cloned());
        self.write_records(key, &records)
    }

    pub fn read_flat(&self, key: &SnapshotKey) -> Result<RawTable> {
        let mut records = self.read_records(key)?;
        if records.is_empty() {
            return Err(PreviewError::schema(format!("{} has no header row", key.file_name())));
        }
        let columns = records.remove(0);
        let rows = fit_rows(records, columns.len(), key)?;
        Ok(RawTable::new(columns, rows))
    }

    pub fn write_grouped(&self, key: &SnapshotKey, table: &GroupedTable) -> Result<PathBuf> {
        let groups = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| label_or_placeholder(&c.group, i, 0))
            .collect();
        let names = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| label_or_placeholder(&c.name, i, 1))
            .collect();
        let mut records = Vec::with_capacity(table.rows.len() + 2);
        records.push(groups);
        records.push(names);
        records.extend(table.rows.iter().cloned());
        self.write_records(key, &records)
    }

    pub fn read_grouped(&self, key: &SnapshotKey) -> Result<GroupedTable> {
        let mut records = self.read_records(key)?;
        if records.len() < 2 {
            return Err(PreviewError::schema(format!(
                "{} needs two header rows",
                key.file_name()
            )));
        }
        let groups = records.remove(0);
        let names = records.remove(0);
        if groups.len() != names.len() {
            return Err(PreviewError::schema(format!(
                "{} header rows differ in length ({} vs {})",
                key.file_name(),
                groups.len(),
                names.len()
            )));
        }
        let columns: Vec<ColumnKey> = groups
            .iter()
            .zip(&names)
            .map(|(g, n)| ColumnKey::new(strip_placeholder(g), strip_placeholder(n)))
            .collect();
        let rows = fit_rows(records, columns.len(), key)?;
        Ok(GroupedTable::new(columns, rows))
    }

    fn write_records(&self, key: &SnapshotKey, records: &[Vec<String>]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("csv.tmp");
        let written = write_csv(&tmp, records)
            .and_then(|()| fs::rename(&tmp, &path).map_err(PreviewError::from));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        debug!(path = %path.display(), rows = records.len(), "snapshot written");
        Ok(path)
    }

    fn read_records(&self, key: &SnapshotKey) -> Result<Vec<Vec<String>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Err(PreviewError::SnapshotMissing { path });
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;
        let mut out = Vec::new();
        for record in rdr.records() {
            let record = record?;
            out.push(record.iter().map(|s| s.to_string()).collect());
        }
        debug!(path = %path.display(), rows = out.len(), "snapshot read");
        Ok(out)
    }
}

fn write_csv(path: &Path, records: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for record in records {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn fit_rows(rows: Vec<Vec<String>>, width: usize, key: &SnapshotKey) -> Result<Vec<Vec<String>>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            if row.len() > width {
                return Err(PreviewError::schema(format!(
                    "{} row {} has {} fields, header has {}",
                    key.file_name(),
                    i,
                    row.len(),
                    width
                )));
            }
            row.resize(width, String::new());
            Ok(row)
        })
        .collect()
}

fn label_or_placeholder(label: &str, col: usize, level: usize) -> String {
    if label.is_empty() {
        format!("{PLACEHOLDER_PREFIX} {col}_level_{level}")
    } else {
        label.to_string()
    }
}

fn strip_placeholder(label: &str) -> String {
    if label.starts_with(PLACEHOLDER_PREFIX) {
        String::new()
    } else {
        label.trim().to_string()
    }
}

fn file_safe(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}
