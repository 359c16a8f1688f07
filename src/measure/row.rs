use crate::measure::filter::RawMeasurement;
use crate::measure::name::NameFields;
use anyhow::{Context, anyhow};

/// Columns a [`MeasurementRow`] can be projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Testname,
    Benchtime,
    Time,
    TimeUnits,
    Memusage,
    MemusageUnits,
    Mallocs,
    MallocsUnits,
    Cores,
    Txn,
    Ell,
    Operation,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Testname,
        Column::Benchtime,
        Column::Time,
        Column::TimeUnits,
        Column::Memusage,
        Column::MemusageUnits,
        Column::Mallocs,
        Column::MallocsUnits,
        Column::Cores,
        Column::Txn,
        Column::Ell,
        Column::Operation,
    ];

    /// Look a column up by its table name, ignoring case.
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| anyhow!("unknown column {:?}", name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Column::Testname => "Testname",
            Column::Benchtime => "Benchtime",
            Column::Time => "Time",
            Column::TimeUnits => "Time_Units",
            Column::Memusage => "Memusage",
            Column::MemusageUnits => "Memusage_Units",
            Column::Mallocs => "Mallocs",
            Column::MallocsUnits => "Mallocs_Units",
            Column::Cores => "cores",
            Column::Txn => "Txn",
            Column::Ell => "Ell",
            Column::Operation => "Operation",
        }
    }
}

/// One decomposed benchmark output line.
///
/// Values are kept as the original text tokens; optional fields are those
/// recovered from the test name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementRow {
    pub testname: String,
    pub benchtime: String,
    pub time: String,
    pub time_units: String,
    pub memusage: String,
    pub memusage_units: String,
    pub mallocs: String,
    pub mallocs_units: String,
    pub cores: Option<String>,
    pub txn: Option<String>,
    pub ell: Option<String>,
    pub operation: Option<String>,
}

impl MeasurementRow {
    pub fn new(raw: RawMeasurement, name: NameFields) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            testname: name.base,
            benchtime: raw.benchtime,
            time: raw.time,
            time_units: raw.time_units,
            memusage: raw.memusage,
            memusage_units: raw.memusage_units,
            mallocs: raw.mallocs,
            mallocs_units: raw.mallocs_units,
            cores: present(name.cores),
            txn: present(name.txn),
            ell: present(name.height),
            operation: present(name.operation),
        }
    }

    /// Cell text for `column`; `None` when the field is absent.
    pub fn get(&self, column: Column) -> Option<&str> {
        fn non_empty(s: &str) -> Option<&str> {
            Some(s).filter(|s| !s.is_empty())
        }
        match column {
            Column::Testname => non_empty(&self.testname),
            Column::Benchtime => non_empty(&self.benchtime),
            Column::Time => non_empty(&self.time),
            Column::TimeUnits => non_empty(&self.time_units),
            Column::Memusage => non_empty(&self.memusage),
            Column::MemusageUnits => non_empty(&self.memusage_units),
            Column::Mallocs => non_empty(&self.mallocs),
            Column::MallocsUnits => non_empty(&self.mallocs_units),
            Column::Cores => self.cores.as_deref().and_then(non_empty),
            Column::Txn => self.txn.as_deref().and_then(non_empty),
            Column::Ell => self.ell.as_deref().and_then(non_empty),
            Column::Operation => self.operation.as_deref().and_then(non_empty),
        }
    }

    /// Set a cell; an empty value clears it.
    pub fn set(&mut self, column: Column, value: &str) {
        let optional = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
        match column {
            Column::Testname => self.testname = value.to_string(),
            Column::Benchtime => self.benchtime = value.to_string(),
            Column::Time => self.time = value.to_string(),
            Column::TimeUnits => self.time_units = value.to_string(),
            Column::Memusage => self.memusage = value.to_string(),
            Column::MemusageUnits => self.memusage_units = value.to_string(),
            Column::Mallocs => self.mallocs = value.to_string(),
            Column::MallocsUnits => self.mallocs_units = value.to_string(),
            Column::Cores => self.cores = optional,
            Column::Txn => self.txn = optional,
            Column::Ell => self.ell = optional,
            Column::Operation => self.operation = optional,
        }
    }

    /// Parse a cell as a number.
    pub fn number(&self, column: Column) -> anyhow::Result<f64> {
        let text = self
            .get(column)
            .ok_or_else(|| anyhow!("missing {} in row {:?}", column.name(), self.testname))?;
        text.parse::<f64>()
            .with_context(|| format!("bad {} value {:?}", column.name(), text))
    }
}
