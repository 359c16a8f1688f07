use crate::transcript::LogRecord;
use anyhow::bail;

/// Substring every benchmark result line carries in its name.
pub const BENCHMARK_MARKER: &str = "Benchmark";
/// Time unit marking a measurement line (as opposed to a bare `BenchmarkX` header).
pub const THROUGHPUT_MARKER: &str = "ns/op";

const FIELD_COUNT: usize = 8;

/// The eight whitespace-separated fields of a `-benchmem` result line.
///
/// Example:
/// BenchmarkFoo-8;5/10/Aggregate   1000   250 ns/op   32 B/op   2 allocs/op
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMeasurement {
    pub testname: String,
    pub benchtime: String,
    pub time: String,
    pub time_units: String,
    pub memusage: String,
    pub memusage_units: String,
    pub mallocs: String,
    pub mallocs_units: String,
}

/// Split one output line into its eight positional fields.
pub fn parse_measurement_line(line: &str) -> anyhow::Result<RawMeasurement> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [
        testname,
        benchtime,
        time,
        time_units,
        memusage,
        memusage_units,
        mallocs,
        mallocs_units,
    ] = fields.as_slice()
    else {
        bail!(
            "expected {} fields, found {}: {:?}",
            FIELD_COUNT,
            fields.len(),
            line.trim()
        );
    };

    Ok(RawMeasurement {
        testname: testname.to_string(),
        benchtime: benchtime.to_string(),
        time: time.to_string(),
        time_units: time_units.to_string(),
        memusage: memusage.to_string(),
        memusage_units: memusage_units.to_string(),
        mallocs: mallocs.to_string(),
        mallocs_units: mallocs_units.to_string(),
    })
}

/// Keep the measurement lines among `records`, in order.
///
/// Records without output, without both markers, or with the wrong field
/// count are dropped.
pub fn measurement_lines<I>(records: I) -> Vec<RawMeasurement>
where
    I: IntoIterator<Item = LogRecord>,
{
    let mut out = Vec::new();
    for record in records {
        let Some(text) = record.output_text() else {
            continue;
        };
        if !text.contains(BENCHMARK_MARKER) || !text.contains(THROUGHPUT_MARKER) {
            continue;
        }
        match parse_measurement_line(text) {
            Ok(raw) => out.push(raw),
            Err(e) => log::debug!("dropping measurement line: {:#}", e),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn output(text: &str) -> LogRecord {
        LogRecord {
            output: Some(text.to_string()),
            ..LogRecord::default()
        }
    }

    #[test]
    fn splits_into_eight_fields() {
        let raw = parse_measurement_line(
            "BenchmarkFoo-8;5/10/Aggregate 1000 250 ns/op 32 B/op 2 allocs/op",
        )
        .unwrap();

        assert_eq!(
            raw,
            RawMeasurement {
                testname: "BenchmarkFoo-8;5/10/Aggregate".into(),
                benchtime: "1000".into(),
                time: "250".into(),
                time_units: "ns/op".into(),
                memusage: "32".into(),
                memusage_units: "B/op".into(),
                mallocs: "2".into(),
                mallocs_units: "allocs/op".into(),
            }
        );
    }

    #[test]
    fn tabs_and_newlines_are_whitespace() {
        let raw = parse_measurement_line(
            "BenchmarkX-4   \t       3\t 412345 ns/op\t  2544 B/op\t  36 allocs/op\n",
        )
        .unwrap();
        assert_eq!(raw.testname, "BenchmarkX-4");
        assert_eq!(raw.time, "412345");
        assert_eq!(raw.mallocs_units, "allocs/op");
    }

    #[test]
    fn wrong_arity_is_reported() {
        let err = parse_measurement_line("BenchmarkVCS/10/Commit;8   1234 ns/op").unwrap_err();
        assert!(err.to_string().contains("expected 8 fields, found 3"));
    }

    #[test]
    fn filter_keeps_only_measurements() {
        let records = vec![
            LogRecord::default(),
            output(""),
            output("goos: linux\n"),
            output("BenchmarkVCSAgg\n"),
            output("Curve order 5243587517512619047944774050818596583769055250052763782260365869993858118657\n"),
            output("BenchmarkA;8-8 \t 10\t 100 ns/op\t 1 B/op\t 1 allocs/op\n"),
            output("BenchmarkB;8-8 \t 10\t 100 ns/op\n"),
            output("BenchmarkC;16-8 \t 20\t 200 ns/op\t 2 B/op\t 3 allocs/op\n"),
            output("PASS\n"),
        ];

        let rows = measurement_lines(records);
        let names: Vec<&str> = rows.iter().map(|r| r.testname.as_str()).collect();
        assert_eq!(names, vec!["BenchmarkA;8-8", "BenchmarkC;16-8"]);
    }
}
