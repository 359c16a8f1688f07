//! Result tables: projection, ordering and header-less CSV I/O.

use crate::measure::{Column, MeasurementRow};
use anyhow::{Context, bail};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{Read, Write};

/// Rows plus the columns a consumer chose to keep, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<Column>,
    rows: Vec<MeasurementRow>,
}

impl ResultTable {
    /// Build a table keeping only `columns` of each row.
    pub fn new(columns: &[Column], rows: impl IntoIterator<Item = MeasurementRow>) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: rows.into_iter().map(|r| project(&r, columns)).collect(),
        }
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn select(&self, columns: &[Column]) -> Self {
        Self::new(columns, self.rows.iter().cloned())
    }

    /// Stable sort by `keys` in order. Cells that both parse as numbers are
    /// compared numerically, anything else as text; absent cells sort first.
    pub fn sort_by(&mut self, keys: &[Column]) {
        self.rows.sort_by(|a, b| {
            keys.iter()
                .map(|&k| compare_cells(a.get(k), b.get(k)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Write rows as CSV without a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for row in &self.rows {
            wtr.write_record(self.columns.iter().map(|&c| row.get(c).unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &str) -> anyhow::Result<()> {
        let file = File::create(path).with_context(|| format!("create csv file {}", path))?;
        self.write_csv(file)
            .with_context(|| format!("write csv file {}", path))
    }

    /// Read a header-less CSV whose columns are `columns`, in order.
    pub fn read_csv<R: Read>(reader: R, columns: &[Column]) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (lineno, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != columns.len() {
                bail!(
                    "csv row {}: expected {} columns, found {}",
                    lineno + 1,
                    columns.len(),
                    record.len()
                );
            }
            let mut row = MeasurementRow::default();
            for (&column, value) in columns.iter().zip(record.iter()) {
                row.set(column, value);
            }
            rows.push(row);
        }

        Ok(Self {
            columns: columns.to_vec(),
            rows,
        })
    }

    pub fn read_csv_file(path: &str, columns: &[Column]) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("open csv file {}", path))?;
        Self::read_csv(file, columns).with_context(|| format!("read csv file {}", path))
    }
}

fn project(row: &MeasurementRow, columns: &[Column]) -> MeasurementRow {
    let mut out = MeasurementRow::default();
    for &c in columns {
        if let Some(v) = row.get(c) {
            out.set(c, v);
        }
    }
    out
}

fn compare_cells(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            _ => a.cmp(b),
        },
    }
}
