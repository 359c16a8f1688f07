use crate::transcript::record::LogRecord;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Raw line ending the upstream logger leaves on a fragment whose output
/// continues in the next record.
const CONTINUATION_SUFFIX: &str = r#"\t"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// One record per JSON-object line.
    Plain,
    /// Re-join Output fields that were split across consecutive records.
    MergeContinuations,
}

/// Lazy sequence of records from a line-delimited JSON transcript.
///
/// Lines that are not JSON objects are skipped. In
/// [`ReadMode::MergeContinuations`] a fragment still buffered at end of input
/// is dropped.
pub struct LogRecords<R> {
    lines: std::io::Lines<R>,
    mode: ReadMode,
    pending: String,
    lineno: usize,
}

impl<R: BufRead> LogRecords<R> {
    pub fn new(reader: R, mode: ReadMode) -> Self {
        Self {
            lines: reader.lines(),
            mode,
            pending: String::new(),
            lineno: 0,
        }
    }

    fn next_object(&mut self) -> Option<anyhow::Result<(String, LogRecord)>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e).context("read log line")),
            };
            self.lineno += 1;

            match parse_record(&line) {
                Some(record) => return Some(Ok((line, record))),
                None => {
                    if !line.trim().is_empty() {
                        log::debug!("skipping non-object line {}: {:?}", self.lineno, line);
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for LogRecords<R> {
    type Item = anyhow::Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (line, mut record) = match self.next_object() {
                Some(Ok(v)) => v,
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    if !self.pending.is_empty() {
                        log::debug!(
                            "dropping unterminated output at end of log: {:?}",
                            self.pending
                        );
                        self.pending.clear();
                    }
                    return None;
                }
            };

            if self.mode == ReadMode::Plain {
                return Some(Ok(record));
            }

            let Some(output) = record.output.take() else {
                return Some(Ok(record));
            };

            if line.trim_end().ends_with(CONTINUATION_SUFFIX) {
                self.pending.push_str(&output);
                continue;
            }

            let mut merged = std::mem::take(&mut self.pending);
            merged.push_str(&output);
            record.output = Some(merged);
            return Some(Ok(record));
        }
    }
}

/// Open a transcript file for lazy reading.
pub fn open_log_file(
    path: &str,
    mode: ReadMode,
) -> anyhow::Result<LogRecords<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("open log file {}", path))?;
    Ok(LogRecords::new(BufReader::new(file), mode))
}

fn parse_record(line: &str) -> Option<LogRecord> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.as_object().map(LogRecord::from_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn read_all(text: &str, mode: ReadMode) -> Vec<LogRecord> {
        LogRecords::new(Cursor::new(text), mode)
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap()
    }

    fn outputs(records: &[LogRecord]) -> Vec<Option<&str>> {
        records.iter().map(|r| r.output.as_deref()).collect()
    }

    #[test]
    fn keeps_only_json_object_lines() {
        let text = r#"{"Time":"2021-06-01T10:00:00Z","Action":"start","Package":"vcs"}
not json at all
{"Action":"output","Package":"vcs","Output":"PASS\n"}
[1, 2, 3]

"just a string"
{"Action":"pass","Package":"vcs","Elapsed":12.5}
{"Action":"output","Output":"broken"
"#;
        let records = read_all(text, ReadMode::Plain);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].time.as_deref(), Some("2021-06-01T10:00:00Z"));
        assert_eq!(records[0].action.as_deref(), Some("start"));
        assert_eq!(records[1].output.as_deref(), Some("PASS\n"));
        assert_eq!(records[2].elapsed, Some(12.5));
        assert_eq!(records[2].package.as_deref(), Some("vcs"));
    }

    #[test]
    fn mistyped_keys_do_not_drop_the_line() {
        let text = concat!(
            "{\"Time\":1622541600,\"Output\":\"x\"}\n",
            "{\"Elapsed\":\"1.5\",\"Action\":\"pass\"}\n",
            "{\"Test\":null,\"Output\":\"y\"}\n",
            "{\"Output\":42,\"Elapsed\":3}\n",
        );
        let records = read_all(text, ReadMode::Plain);

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].time, None);
        assert_eq!(records[0].output.as_deref(), Some("x"));
        assert_eq!(records[1].elapsed, None);
        assert_eq!(records[1].action.as_deref(), Some("pass"));
        assert_eq!(records[2].test, None);
        assert_eq!(records[2].output.as_deref(), Some("y"));
        assert_eq!(records[3].output, None);
        assert_eq!(records[3].elapsed, Some(3.0));
    }

    #[test]
    fn plain_mode_does_not_merge() {
        let text = "{\"Output\":\"foo\\t\"}\n{\"Output\":\"bar\"}\n";
        let records = read_all(text, ReadMode::Plain);
        assert_eq!(outputs(&records), vec![Some("foo\t"), Some("bar")]);
    }

    #[test]
    fn merges_continuation_fragments() {
        let text = "{\"Output\":\"foo\\t\"}\n{\"Output\":\"bar\"}\n";
        let records = read_all(text, ReadMode::MergeContinuations);
        assert_eq!(outputs(&records), vec![Some("foo\tbar")]);
    }

    #[test]
    fn merges_go_benchmark_output() {
        let text = concat!(
            r#"{"Action":"output","Package":"vcs","Output":"BenchmarkVCSAgg/30/AggregateProve;8-8         \t"}"#,
            "\n",
            r#"{"Action":"output","Package":"vcs","Output":"       1\t2364412 ns/op\t  2544 B/op\t  36 allocs/op\n"}"#,
            "\n",
            r#"{"Action":"output","Package":"vcs","Output":"PASS\n"}"#,
            "\n",
        );
        let records = read_all(text, ReadMode::MergeContinuations);
        assert_eq!(
            outputs(&records),
            vec![
                Some(
                    "BenchmarkVCSAgg/30/AggregateProve;8-8         \t       1\t2364412 ns/op\t  2544 B/op\t  36 allocs/op\n"
                ),
                Some("PASS\n"),
            ]
        );
    }

    #[test]
    fn records_without_output_pass_through() {
        let text = concat!(
            "{\"Output\":\"a\\t\"}\n",
            "{\"Action\":\"pause\"}\n",
            "{\"Output\":\"b\\t\"}\n",
            "{\"Output\":\"c\"}\n",
        );
        let records = read_all(text, ReadMode::MergeContinuations);
        assert_eq!(outputs(&records), vec![None, Some("a\tb\tc")]);
        assert_eq!(records[0].action.as_deref(), Some("pause"));
    }

    #[test]
    fn trailing_fragment_is_dropped() {
        let text = "{\"Output\":\"done\"}\n{\"Output\":\"dangling\\t\"}\n";
        let records = read_all(text, ReadMode::MergeContinuations);
        assert_eq!(outputs(&records), vec![Some("done")]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = open_log_file("/nonexistent/bench.json", ReadMode::Plain)
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/bench.json"));
    }
}
