use crate::model::{ChartData, Frame};
use crate::render::style::PlotStyle;
use anyhow::bail;
use std::fmt::Write;

/// A series ready to draw: screen-independent `(log2 x, y)` points, split at
/// missing cells.
struct Trace<'a> {
    name: &'a str,
    color: String,
    dotted: bool,
    segments: Vec<Vec<(f64, f64)>>,
}

fn traces<'a>(
    frame: &'a Frame,
    dotted: bool,
    color_of: impl Fn(&str, usize) -> String,
) -> Vec<Trace<'a>> {
    frame
        .columns()
        .iter()
        .enumerate()
        .map(|(i, series)| {
            let mut segments = vec![Vec::new()];
            for (&x, v) in frame.index().iter().zip(&series.values) {
                match v {
                    Some(y) if y.is_finite() && *y > 0.0 && x > 0 => {
                        if let Some(seg) = segments.last_mut() {
                            seg.push(((x as f64).log2(), *y));
                        }
                    }
                    _ => segments.push(Vec::new()),
                }
            }
            segments.retain(|s| !s.is_empty());
            Trace {
                name: &series.name,
                color: color_of(&series.name, i),
                dotted,
                segments,
            }
        })
        .collect()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render one chart as a standalone SVG document: log2 x axis, log10 y axis,
/// extrapolated series dotted in the color of their measured counterpart.
pub fn render_svg_chart(chart: &ChartData, style: &PlotStyle) -> anyhow::Result<String> {
    let measured = traces(&chart.measured, false, |_, i| style.color(i).to_string());
    let extrapolated = match &chart.extrapolated {
        Some(frame) => traces(frame, true, |name, i| {
            let base = name.trim_end_matches(" (extrapolated)");
            match measured.iter().position(|t| t.name == base) {
                Some(j) => style.color(j).to_string(),
                None => style.color(measured.len() + i).to_string(),
            }
        }),
        None => Vec::new(),
    };

    let points: Vec<(f64, f64)> = measured
        .iter()
        .chain(&extrapolated)
        .flat_map(|t| t.segments.iter().flatten().copied())
        .collect();
    if points.is_empty() {
        bail!("nothing to plot in {}", chart.file_name);
    }

    let (mut x_min, mut x_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
            (lo.min(x), hi.max(x))
        });
    if x_min == x_max {
        x_min -= 1.0;
        x_max += 1.0;
    }
    let pad = (x_max - x_min) * 0.05;
    x_min -= pad;
    x_max += pad;

    let y_lo = points
        .iter()
        .map(|p| p.1)
        .fold(f64::INFINITY, f64::min)
        .log10()
        .floor();
    let mut y_hi = points
        .iter()
        .map(|p| p.1)
        .fold(f64::NEG_INFINITY, f64::max)
        .log10()
        .ceil();
    if y_hi <= y_lo {
        y_hi = y_lo + 1.0;
    }

    let w = style.width as f64;
    let h = style.height as f64;
    let label = style.label_size();
    let left = label * 3.5;
    let bottom = label * 2.8;
    let top = label * 0.5;
    let right = label * 0.5;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;

    let sx = |x: f64| left + (x - x_min) / (x_max - x_min) * plot_w;
    let sy = |y: f64| top + plot_h - (y.log10() - y_lo) / (y_hi - y_lo) * plot_h;

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}" font-weight="{}" font-size="{}">"#,
        escape_xml(&style.font_family),
        escape_xml(&style.font_weight),
        style.font_size,
    )?;
    writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

    // y decades: grid, minor grid, labels
    for k in (y_lo as i32)..=(y_hi as i32) {
        let y = sy(10f64.powi(k));
        if style.grid {
            writeln!(
                out,
                r##"<line x1="{left:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#b0b0b0" stroke-width="1"/>"##,
                left + plot_w
            )?;
            if k < y_hi as i32 {
                for m in 2..10 {
                    let ym = sy(m as f64 * 10f64.powi(k));
                    writeln!(
                        out,
                        r##"<line x1="{left:.1}" y1="{ym:.1}" x2="{:.1}" y2="{ym:.1}" stroke="#e0e0e0" stroke-width="1"/>"##,
                        left + plot_w
                    )?;
                }
            }
        }
        writeln!(
            out,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{left:.1}" y2="{y:.1}" stroke="black" stroke-width="2"/>"#,
            left - 10.0
        )?;
        writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="{label}">10<tspan dy="-0.6em" font-size="70%">{k}</tspan></text>"#,
            left - 20.0,
            y + label * 0.35
        )?;
    }

    // x ticks on multiples of the tick step
    let step = style.x_tick_step.max(1) as f64;
    let mut tick = (x_min / step).ceil() * step;
    while tick <= x_max {
        let x = sx(tick);
        if style.grid {
            writeln!(
                out,
                r##"<line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{:.1}" stroke="#b0b0b0" stroke-width="1"/>"##,
                top + plot_h
            )?;
        }
        writeln!(
            out,
            r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="black" stroke-width="2"/>"#,
            top + plot_h,
            top + plot_h + 10.0
        )?;
        writeln!(
            out,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="{label}">{:.0}</text>"#,
            top + plot_h + 20.0 + label,
            tick
        )?;
        tick += step;
    }

    writeln!(
        out,
        r#"<rect x="{left:.1}" y="{top:.1}" width="{plot_w:.1}" height="{plot_h:.1}" fill="none" stroke="black" stroke-width="2"/>"#
    )?;

    for trace in measured.iter().chain(&extrapolated) {
        let dash = if trace.dotted {
            format!(
                r#" stroke-dasharray="{:.1},{:.1}""#,
                style.line_width * 0.1,
                style.line_width * 2.0
            )
        } else {
            String::new()
        };
        for seg in &trace.segments {
            let pts: Vec<String> = seg
                .iter()
                .map(|&(x, y)| format!("{:.1},{:.1}", sx(x), sy(y)))
                .collect();
            if pts.len() > 1 {
                writeln!(
                    out,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round"{dash}/>"#,
                    pts.join(" "),
                    escape_xml(&trace.color),
                    style.line_width
                )?;
            }
            for &(x, y) in seg {
                writeln!(
                    out,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"#,
                    sx(x),
                    sy(y),
                    style.marker_size / 4.0,
                    escape_xml(&trace.color)
                )?;
            }
        }
    }

    // legend lists measured series only
    for (i, trace) in measured.iter().enumerate() {
        let y = top + style.font_size * (1.0 + 1.2 * i as f64);
        let x = left + style.font_size * 0.5;
        writeln!(
            out,
            r#"<line x1="{x:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-width="{}"/>"#,
            x + style.font_size * 1.5,
            escape_xml(&trace.color),
            style.line_width
        )?;
        writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
            x + style.font_size * 2.0,
            y + style.font_size * 0.35,
            escape_xml(trace.name)
        )?;
    }

    writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="{label}">{}</text>"#,
        left + plot_w / 2.0,
        h - label * 0.4,
        escape_xml(&style.x_label)
    )?;
    writeln!(
        out,
        r#"<text transform="translate({:.1},{:.1}) rotate(-90)" text-anchor="middle" font-size="{label}">{}</text>"#,
        label * 0.9,
        top + plot_h / 2.0,
        escape_xml(chart.y_label)
    )?;
    writeln!(out, "</svg>")?;

    Ok(out)
}
