//! A small pivot table: a sorted integer index and named float columns with
//! missing cells.

use anyhow::{anyhow, bail};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    index: Vec<u64>,
    columns: Vec<Series>,
}

impl Frame {
    /// Pivot `(index, column, value)` cells. Columns come out sorted by name;
    /// a repeated `(index, column)` pair is an error.
    pub fn pivot<I>(cells: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (u64, String, f64)>,
    {
        let mut by_column: BTreeMap<String, BTreeMap<u64, f64>> = BTreeMap::new();
        let mut index = BTreeSet::new();
        for (i, column, value) in cells {
            index.insert(i);
            let slot = by_column.entry(column.clone()).or_default();
            if slot.insert(i, value).is_some() {
                bail!("duplicate entry for index {} in column {:?}", i, column);
            }
        }

        let index: Vec<u64> = index.into_iter().collect();
        let columns = by_column
            .into_iter()
            .map(|(name, cells)| Series {
                values: index.iter().map(|i| cells.get(i).copied()).collect(),
                name,
            })
            .collect();
        Ok(Self { index, columns })
    }

    /// Single-column frame from `(index, value)` points.
    pub fn from_points<I>(name: &str, points: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (u64, f64)>,
    {
        Self::pivot(points.into_iter().map(|(i, v)| (i, name.to_string(), v)))
    }

    pub fn index(&self) -> &[u64] {
        &self.index
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value at `index` in column `name`.
    pub fn get(&self, index: u64, name: &str) -> Option<f64> {
        let row = self.index.binary_search(&index).ok()?;
        self.column(name)?.values[row]
    }

    /// Keep only `names`, in that order.
    pub fn select(&self, names: &[&str]) -> anyhow::Result<Self> {
        let columns = names
            .iter()
            .map(|n| {
                self.column(n)
                    .cloned()
                    .ok_or_else(|| anyhow!("no column {:?}", n))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            index: self.index.clone(),
            columns,
        })
    }

    pub fn drop_column(&self, name: &str) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
        }
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        for c in &mut self.columns {
            if c.name == from {
                c.name = to.to_string();
            }
        }
        self
    }

    pub fn map_names(mut self, f: impl Fn(&str) -> String) -> Self {
        for c in &mut self.columns {
            c.name = f(&c.name);
        }
        self
    }

    pub fn scale(mut self, factor: f64) -> Self {
        for c in &mut self.columns {
            for v in c.values.iter_mut().flatten() {
                *v *= factor;
            }
        }
        self
    }

    /// Outer join on the index, keeping column order of the inputs.
    pub fn concat(frames: &[Frame]) -> Self {
        let index: Vec<u64> = frames
            .iter()
            .flat_map(|f| f.index.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = Vec::new();
        for f in frames {
            for c in &f.columns {
                columns.push(Series {
                    name: c.name.clone(),
                    values: index.iter().map(|&i| f.get(i, &c.name)).collect(),
                });
            }
        }
        Self { index, columns }
    }

    /// Cell-wise sum over the union of both indexes and columns. A cell present
    /// on one side only keeps that side's value.
    pub fn add_filled(&self, other: &Frame) -> Self {
        let index: Vec<u64> = self
            .index
            .iter()
            .chain(other.index.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        for c in &other.columns {
            if !names.contains(&c.name.as_str()) {
                names.push(&c.name);
            }
        }

        let columns = names
            .iter()
            .map(|&name| Series {
                name: name.to_string(),
                values: index
                    .iter()
                    .map(|&i| match (self.get(i, name), other.get(i, name)) {
                        (Some(a), Some(b)) => Some(a + b),
                        (a, b) => a.or(b),
                    })
                    .collect(),
            })
            .collect();
        Self { index, columns }
    }

    /// Add `other[other_column]` to `self[column]` row by row; a cell missing
    /// on either side becomes missing.
    pub fn add_column_from(
        &mut self,
        column: &str,
        other: &Frame,
        other_column: &str,
    ) -> anyhow::Result<()> {
        if other.column(other_column).is_none() {
            bail!("no column {:?}", other_column);
        }
        let index = self.index.clone();
        let series = self
            .columns
            .iter_mut()
            .find(|c| c.name == column)
            .ok_or_else(|| anyhow!("no column {:?}", column))?;
        for (v, &i) in series.values.iter_mut().zip(&index) {
            *v = match (*v, other.get(i, other_column)) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            };
        }
        Ok(())
    }

    /// Fill cells missing in `self` with the rate model.
    ///
    /// For each column the per-unit rate `value / index` is forward-filled
    /// and multiplied back by the index; only cells missing in `self` take
    /// the estimate. The result covers the rows from the last fully measured
    /// row onward plus every estimated row.
    pub fn extrapolate_rate(&self) -> anyhow::Result<Self> {
        if self.index.contains(&0) {
            bail!("cannot extrapolate a rate at index 0");
        }

        let mut estimated = Frame {
            index: Vec::new(),
            columns: self
                .columns
                .iter()
                .map(|c| Series {
                    name: c.name.clone(),
                    values: Vec::new(),
                })
                .collect(),
        };

        let mut rates: Vec<Option<f64>> = vec![None; self.columns.len()];
        for (row, &i) in self.index.iter().enumerate() {
            let mut cells = Vec::with_capacity(self.columns.len());
            for (c, series) in self.columns.iter().enumerate() {
                match series.values[row] {
                    Some(v) => {
                        rates[c] = Some(v / i as f64);
                        cells.push(None);
                    }
                    None => cells.push(rates[c].map(|r| r * i as f64)),
                }
            }
            if cells.iter().any(Option::is_some) {
                estimated.index.push(i);
                for (series, cell) in estimated.columns.iter_mut().zip(cells) {
                    series.values.push(cell);
                }
            }
        }

        let last_full = (0..self.index.len())
            .rev()
            .find(|&row| self.columns.iter().all(|c| c.values[row].is_some()))
            .ok_or_else(|| anyhow!("no fully measured row to extrapolate from"))?;

        let tail = Frame {
            index: self.index[last_full..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Series {
                    name: c.name.clone(),
                    values: c.values[last_full..].to_vec(),
                })
                .collect(),
        };

        Ok(tail.add_filled(&estimated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(index: &[u64], columns: Vec<(&str, Vec<Option<f64>>)>) -> Frame {
        Frame {
            index: index.to_vec(),
            columns: columns
                .into_iter()
                .map(|(n, values)| Series {
                    name: n.to_string(),
                    values,
                })
                .collect(),
        }
    }

    #[test]
    fn pivot_sorts_index_and_columns() {
        let f = Frame::pivot(vec![
            (16, "Verify".to_string(), 2.0),
            (8, "Prove".to_string(), 10.0),
            (16, "Prove".to_string(), 20.0),
        ])
        .unwrap();

        assert_eq!(
            f,
            frame(
                &[8, 16],
                vec![
                    ("Prove", vec![Some(10.0), Some(20.0)]),
                    ("Verify", vec![None, Some(2.0)]),
                ]
            )
        );
    }

    #[test]
    fn pivot_rejects_duplicates() {
        let err = Frame::pivot(vec![(8, "A".to_string(), 1.0), (8, "A".to_string(), 2.0)])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn concat_outer_joins() {
        let a = Frame::from_points("A", vec![(2, 1.0), (4, 2.0)]).unwrap();
        let b = Frame::from_points("B", vec![(4, 3.0), (8, 4.0)]).unwrap();
        assert_eq!(
            Frame::concat(&[a, b]),
            frame(
                &[2, 4, 8],
                vec![
                    ("A", vec![Some(1.0), Some(2.0), None]),
                    ("B", vec![None, Some(3.0), Some(4.0)]),
                ]
            )
        );
    }

    #[test]
    fn extrapolates_linearly_from_last_rate() {
        let f = frame(&[4, 8], vec![("A", vec![Some(7.5), None])]);
        let e = f.extrapolate_rate().unwrap();
        assert_eq!(e.get(8, "A"), Some(15.0));
        assert_eq!(e.get(4, "A"), Some(7.5));
    }

    #[test]
    fn extrapolation_combines_with_measured_series() {
        let f = frame(
            &[4, 8, 16, 32],
            vec![
                ("A", vec![Some(10.0), Some(20.0), None, None]),
                ("B", vec![Some(1.0), Some(2.0), Some(3.0), None]),
            ],
        );

        let e = f.extrapolate_rate().unwrap();
        assert_eq!(
            e,
            frame(
                &[8, 16, 32],
                vec![
                    ("A", vec![Some(20.0), Some(40.0), Some(80.0)]),
                    ("B", vec![Some(2.0), Some(3.0), Some(6.0)]),
                ]
            )
        );
    }

    #[test]
    fn extrapolation_needs_a_full_row() {
        let f = frame(
            &[2, 4],
            vec![("A", vec![Some(1.0), None]), ("B", vec![None, Some(1.0)])],
        );
        assert!(f.extrapolate_rate().is_err());
    }

    #[test]
    fn column_addition_propagates_missing() {
        let mut a = frame(&[2, 4, 8], vec![("A", vec![Some(1.0), Some(2.0), None])]);
        let b = frame(&[2, 4], vec![("M", vec![Some(10.0), None])]);
        a.add_column_from("A", &b, "M").unwrap();
        assert_eq!(a.column("A").unwrap().values, vec![Some(11.0), None, None]);
        assert!(a.add_column_from("A", &b, "missing").is_err());
    }
}
