use serde_json::{Map, Value};

/// A single line of a `go test -json` transcript.
///
/// Every key is optional; unknown keys are ignored, and a known key whose
/// value has an unexpected type counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    pub time: Option<String>,
    pub action: Option<String>,
    pub package: Option<String>,
    pub test: Option<String>,
    pub output: Option<String>,
    pub elapsed: Option<f64>,
}

impl LogRecord {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            time: text("Time"),
            action: text("Action"),
            package: text("Package"),
            test: text("Test"),
            output: text("Output"),
            elapsed: map.get("Elapsed").and_then(Value::as_f64),
        }
    }

    /// Output text, treating an empty string the same as a missing field.
    pub fn output_text(&self) -> Option<&str> {
        self.output.as_deref().filter(|s| !s.is_empty())
    }
}
