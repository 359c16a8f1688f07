use crate::measure::Column;
use crate::model::frame::Frame;
use crate::profile::Profile;
use crate::table::ResultTable;
use anyhow::{Context, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;

/// Go benchmark times are in nanoseconds; charts are in seconds.
const NS_PER_S: f64 = 1e9;

pub const HYPERPROOFS: &str = "Hyperproofs";
pub const MERKLE: &str = "Merkle";
const VERIFIER_OPERATION: &str = "G1MulVecBinary";

/// One row of a SNARK prover CSV (no header row; times in seconds).
#[derive(Debug, Clone, Deserialize)]
pub struct ProverRecord {
    pub kind: String,
    pub swaps: u64,
    pub height: u64,
    pub init: f64,
    pub paramgen: f64,
    pub synth: f64,
    pub prover: f64,
    pub verifier: f64,
}

impl ProverRecord {
    fn value(&self, column: &str) -> anyhow::Result<f64> {
        Ok(match column {
            "init" => self.init,
            "paramgen" => self.paramgen,
            "synth" => self.synth,
            "prover" => self.prover,
            "verifier" => self.verifier,
            other => bail!("unknown prover column {:?}", other),
        })
    }
}

/// A prover CSV and the series it contributes.
#[derive(Debug, Clone)]
pub struct ProverSource {
    pub path: String,
    pub column: String,
    pub tag: String,
}

#[derive(Debug, Clone)]
pub struct AggregationInputs {
    pub provers: Vec<ProverSource>,
    /// CSV written by `parse --profile aggregation`.
    pub hyperproofs: String,
    /// JSON object keyed by `"N;M;operation"`.
    pub verifier: String,
}

/// Measured and extrapolated series of one chart.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub file_name: &'static str,
    pub y_label: &'static str,
    pub measured: Frame,
    pub extrapolated: Option<Frame>,
}

/// Load the SNARK prover series. The index is the number of Merkle proofs
/// checked: two per swap.
pub fn load_prover(source: &ProverSource) -> anyhow::Result<Frame> {
    let file = File::open(&source.path)
        .with_context(|| format!("open prover csv {}", source.path))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(file);

    let mut points = Vec::new();
    for record in rdr.deserialize::<ProverRecord>() {
        let record = record.with_context(|| format!("read prover csv {}", source.path))?;
        log::debug!(
            "{}: {} swaps at height {}",
            record.kind,
            record.swaps,
            record.height
        );
        points.push((2 * record.swaps, record.value(&source.column)?));
    }
    Frame::from_points(&source.tag, points)
}

/// Load one Hyperproofs operation from an aggregation table, in seconds.
pub fn load_hyperproofs(path: &str, operation: &str) -> anyhow::Result<Frame> {
    let table = ResultTable::read_csv_file(path, Profile::Aggregation.columns())?;

    let mut cells = Vec::new();
    for row in table.rows() {
        let txn = row.number(Column::Txn)? as u64;
        let op = row.get(Column::Operation).unwrap_or_default().to_string();
        cells.push((txn, op, row.number(Column::Time)? / NS_PER_S));
    }

    let frame = Frame::pivot(cells).with_context(|| format!("pivot {}", path))?;
    Ok(frame
        .select(&[operation])
        .with_context(|| format!("operation {} in {}", operation, path))?
        .rename(operation, HYPERPROOFS))
}

/// Split a `"N;M;operation"` key.
fn parse_verifier_key(key: &str) -> anyhow::Result<(u64, u64, String)> {
    let parts: Vec<&str> = key.split(';').collect();
    let [n, m, op] = parts.as_slice() else {
        bail!("verifier key must be N;M;operation: {:?}", key);
    };
    let n = n
        .parse()
        .with_context(|| format!("bad N in verifier key {:?}", key))?;
    let m = m
        .parse()
        .with_context(|| format!("bad M in verifier key {:?}", key))?;
    Ok((n, m, op.to_string()))
}

/// Load the SNARK verifier timings (ns in the file), in seconds.
pub fn load_verifier(path: &str) -> anyhow::Result<Frame> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read verifier json {}", path))?;
    let db: BTreeMap<String, f64> = serde_json::from_str(&text)
        .with_context(|| format!("parse verifier json {}", path))?;
    verifier_frame(&db).with_context(|| format!("verifier json {}", path))
}

fn verifier_frame(db: &BTreeMap<String, f64>) -> anyhow::Result<Frame> {
    let mut cells = Vec::new();
    for (key, &ns) in db {
        let (n, _m, op) = parse_verifier_key(key)?;
        cells.push((n, op, ns));
    }
    Ok(Frame::pivot(cells)?
        .select(&[VERIFIER_OPERATION])?
        .rename(VERIFIER_OPERATION, MERKLE)
        .scale(1.0 / NS_PER_S))
}

/// Rate-model extension of the SNARK prover series.
pub fn extrapolate_provers(prove: &Frame) -> anyhow::Result<Frame> {
    Ok(prove
        .drop_column(HYPERPROOFS)
        .extrapolate_rate()?
        .map_names(|n| format!("{} (extrapolated)", n)))
}

/// Build the prover, verifier and end-to-end charts.
pub fn build_charts(inputs: &AggregationInputs) -> anyhow::Result<Vec<ChartData>> {
    let mut prove = vec![load_hyperproofs(&inputs.hyperproofs, "Prove")?];
    for source in &inputs.provers {
        prove.push(load_prover(source)?);
    }
    let prove = Frame::concat(&prove);

    let verify = Frame::concat(&[
        load_hyperproofs(&inputs.hyperproofs, "Verify")?,
        load_verifier(&inputs.verifier)?,
    ]);

    assemble_charts(&prove, &verify)
}

fn assemble_charts(prove: &Frame, verify: &Frame) -> anyhow::Result<Vec<ChartData>> {
    let extrapolated = extrapolate_provers(prove)?;

    let mut e2e = prove.clone();
    let mut e2e_extrapolated = extrapolated.clone();
    for series in prove.columns() {
        let verifier_column = if series.name == HYPERPROOFS {
            HYPERPROOFS
        } else {
            MERKLE
        };
        e2e.add_column_from(&series.name, verify, verifier_column)?;
        if series.name != HYPERPROOFS {
            let name = format!("{} (extrapolated)", series.name);
            e2e_extrapolated
                .add_column_from(&name, verify, verifier_column)
                .map_err(|e| anyhow!("end-to-end {}: {}", series.name, e))?;
        }
    }

    Ok(vec![
        ChartData {
            file_name: "aggregation-prover-log.svg",
            y_label: "Proving time (s)",
            measured: prove.clone(),
            extrapolated: Some(extrapolated),
        },
        ChartData {
            file_name: "aggregation-verifier-log.svg",
            y_label: "Verification time (s)",
            measured: verify.clone(),
            extrapolated: None,
        },
        ChartData {
            file_name: "aggregation-e2e-log.svg",
            y_label: "Proving + Verification time (s)",
            measured: e2e,
            extrapolated: Some(e2e_extrapolated),
        },
    ])
}
