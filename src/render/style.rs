use anyhow::Context;
use serde::Deserialize;

/// Visual settings for every chart. Passed explicitly to the renderer; a
/// JSON file may override any subset of the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub font_weight: String,
    pub font_size: f64,
    /// Extra size for axis labels and tick labels.
    pub label_size_delta: f64,
    pub line_width: f64,
    pub marker_size: f64,
    pub x_tick_step: u32,
    pub x_label: String,
    pub grid: bool,
    pub palette: Vec<String>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_weight: "bold".to_string(),
            font_size: 35.0,
            label_size_delta: 5.0,
            line_width: 6.0,
            marker_size: 20.0,
            x_tick_step: 2,
            x_label: "Aggregation size (log2 scale)".to_string(),
            grid: true,
            palette: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl PlotStyle {
    /// Defaults, overridden by the JSON file at `path` when given.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read style file {}", path))?;
        serde_json::from_str(&text).with_context(|| format!("parse style file {}", path))
    }

    pub fn color(&self, i: usize) -> &str {
        if self.palette.is_empty() {
            return "#000000";
        }
        &self.palette[i % self.palette.len()]
    }

    pub fn label_size(&self) -> f64 {
        self.font_size + self.label_size_delta
    }
}
