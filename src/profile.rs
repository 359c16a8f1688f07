//! Parsing profiles: which reader mode, name rule and output columns each
//! family of benchmark transcripts uses.

use crate::measure::{
    Column, MeasurementRow, NameRule, NameTokenizer, PathShape, measurement_lines,
};
use crate::table::ResultTable;
use crate::transcript::{LogRecord, ReadMode, open_log_file};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Aggregate prove/verify benchmarks: Operation, Txn, Time.
    Aggregation,
    /// Hash function benchmarks: Operation, Benchtime, Time, Txn (input size).
    Hashing,
    /// Pruned VCS micro/macro benchmarks, sorted by height and transactions.
    MicroMacro,
}

impl Profile {
    pub fn read_mode(self) -> ReadMode {
        match self {
            Profile::Aggregation => ReadMode::Plain,
            Profile::Hashing | Profile::MicroMacro => ReadMode::MergeContinuations,
        }
    }

    pub fn name_rule(self) -> NameRule {
        match self {
            Profile::Aggregation => NameRule {
                strip_operation: Some("Aggregate".into()),
                ..NameRule::default()
            },
            Profile::Hashing => NameRule {
                path: PathShape::Operation,
                ..NameRule::default()
            },
            Profile::MicroMacro => NameRule {
                strip_base: Some("BenchmarkPrunedVCS".into()),
                ..NameRule::default()
            },
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Profile::Aggregation => &[Column::Operation, Column::Txn, Column::Time],
            Profile::Hashing => &[
                Column::Operation,
                Column::Benchtime,
                Column::Time,
                Column::Txn,
            ],
            Profile::MicroMacro => &[
                Column::Operation,
                Column::Testname,
                Column::Benchtime,
                Column::Txn,
                Column::Ell,
                Column::Time,
            ],
        }
    }

    pub fn sort_keys(self) -> &'static [Column] {
        match self {
            Profile::MicroMacro => &[
                Column::Ell,
                Column::Txn,
                Column::Testname,
                Column::Benchtime,
            ],
            Profile::Aggregation | Profile::Hashing => &[],
        }
    }

    /// Filter and decompose `records`, sort by this profile's keys, then
    /// project onto `columns` (usually [`Profile::columns`]).
    pub fn build_table<I>(self, records: I, columns: &[Column]) -> anyhow::Result<ResultTable>
    where
        I: IntoIterator<Item = LogRecord>,
    {
        let tokenizer = NameTokenizer::new(self.name_rule())?;
        let rows = measurement_lines(records).into_iter().map(|raw| {
            let name = tokenizer.decompose(&raw.testname);
            MeasurementRow::new(raw, name)
        });

        let mut table = ResultTable::new(&Column::ALL, rows);
        if !self.sort_keys().is_empty() {
            table.sort_by(self.sort_keys());
        }
        Ok(table.select(columns))
    }

    /// Read a transcript file in full and build this profile's table.
    pub fn parse_log_file(
        self,
        path: &str,
        columns: &[Column],
    ) -> anyhow::Result<ResultTable> {
        let records = open_log_file(path, self.read_mode())?
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::debug!("read {} records from {}", records.len(), path);
        for r in &records {
            // package-level results carry no test name
            if let (Some(action @ ("pass" | "fail")), None) = (r.action.as_deref(), &r.test) {
                log::info!(
                    "package {} {} after {:.2}s at {}",
                    r.package.as_deref().unwrap_or("?"),
                    action,
                    r.elapsed.unwrap_or_default(),
                    r.time.as_deref().unwrap_or("?")
                );
            }
        }
        self.build_table(records, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::read::LogRecords;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn csv_of(profile: Profile, transcript: &str) -> String {
        let records = LogRecords::new(Cursor::new(transcript), profile.read_mode())
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap();
        let table = profile.build_table(records, profile.columns()).unwrap();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn aggregation_profile() {
        let transcript = concat!(
            r#"{"Time":"2021-06-01T10:00:00Z","Action":"output","Package":"vcs","Output":"Curve order 52435\n"}"#,
            "\n",
            r#"{"Action":"output","Package":"vcs","Output":"BenchmarkVCSAgg/30/AggregateProve;8-8 \t       1\t2364412 ns/op\t  2544 B/op\t  36 allocs/op\n"}"#,
            "\n",
            r#"{"Action":"output","Package":"vcs","Output":"BenchmarkVCSAgg/30/AggregateVerify;8-8 \t       3\t991100 ns/op\t  1024 B/op\t  12 allocs/op\n"}"#,
            "\n",
            r#"{"Action":"pass","Package":"vcs","Elapsed":41.2}"#,
            "\n",
        );
        assert_eq!(
            csv_of(Profile::Aggregation, transcript),
            "Prove,8,2364412\nVerify,8,991100\n"
        );
    }

    #[test]
    fn hashing_profile_merges_split_output() {
        let transcript = concat!(
            r#"{"Action":"output","Output":"BenchmarkHashing/Poseidon;5-8         \t"}"#,
            "\n",
            r#"{"Action":"output","Output":"    1000\t   12345 ns/op\t  640 B/op\t  9 allocs/op\n"}"#,
            "\n",
            r#"{"Action":"output","Output":"BenchmarkHashing/Blake2b256;5-8 \t  50000\t 321 ns/op\t 0 B/op\t 0 allocs/op\n"}"#,
            "\n",
        );
        assert_eq!(
            csv_of(Profile::Hashing, transcript),
            "Poseidon,1000,12345,5\nBlake2b256,50000,321,5\n"
        );
    }

    #[test]
    fn micro_macro_profile_sorts_rows() {
        let line = |name: &str, iters: u32, ns: u32| {
            format!(
                "{{\"Output\":\"{} \\t {}\\t {} ns/op\\t 1 B/op\\t 1 allocs/op\\n\"}}\n",
                name, iters, ns
            )
        };
        let transcript = [
            line("BenchmarkPrunedVCSMacro/26/UpdateProofTreeBulk;1024-8", 1, 900),
            line("BenchmarkPrunedVCSMicro/26/UpdateComVec;64-8", 10, 300),
            line("BenchmarkPrunedVCSMicro/24/UpdateComVec;64-8", 10, 200),
            line("BenchmarkPrunedVCSMicro/26/UpdateComVec;128-8", 5, 400),
        ]
        .concat();

        assert_eq!(
            csv_of(Profile::MicroMacro, &transcript),
            concat!(
                "UpdateComVec,Micro,10,64,24,200\n",
                "UpdateComVec,Micro,10,64,26,300\n",
                "UpdateComVec,Micro,5,128,26,400\n",
                "UpdateProofTreeBulk,Macro,1,1024,26,900\n",
            )
        );
    }

    #[test]
    fn column_override_reads_full_rows() {
        let transcript = concat!(
            r#"{"Action":"output","Output":"BenchmarkVCSAgg/30/AggregateProve;8-8 \t       1\t2364412 ns/op\t  2544 B/op\t  36 allocs/op\n"}"#,
            "\n",
        );
        let records = LogRecords::new(Cursor::new(transcript), ReadMode::Plain)
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap();
        let columns = [Column::Memusage, Column::Cores, Column::Time, Column::Ell];
        let table = Profile::Aggregation.build_table(records, &columns).unwrap();

        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "2544,8,2364412,30\n");
    }
}
