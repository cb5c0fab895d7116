//! Chart rendering for the visualisation tools.
//!
//! Charts are rendered as self-contained SVG documents, written to a
//! configurable output directory with a millisecond-timestamped filename,
//! and returned inline as a base64 payload.
//!
//! Data-shape problems (missing arrays, mismatched lengths) are reported as
//! payloads with an `error` field; only environment failures (an unwritable
//! output directory) surface as [`ChartError`].

// Chart layout is pixel arithmetic over small values: index/size casts
// cannot overflow or lose meaningful precision here
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

pub mod svg;

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;

use crate::expr;
use svg::{Frame, SvgCanvas, AXIS, PALETTE};

/// Environment-level chart failures.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The chart output directory could not be created.
    #[error("failed to create chart output directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A rendered chart could not be written to disk.
    #[error("failed to write chart file {path}: {source}")]
    WriteFile {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// The supported chart types for `create_chart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Line chart over x/y arrays.
    Line,
    /// Bar chart over categories/values.
    Bar,
    /// Scatter plot over x/y arrays.
    Scatter,
    /// Pie chart over labels/values.
    Pie,
    /// Histogram over a values array.
    Histogram,
    /// Box plot over one or more datasets.
    Box,
}

/// The supported shapes for `visualize_geometry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// A circle from radius and centre.
    Circle,
    /// An axis-aligned rectangle from width, height, and centre.
    Rectangle,
    /// A triangle from exactly three vertices.
    Triangle,
    /// A polygon from three or more vertices.
    Polygon,
}

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// Renders charts as SVG files plus inline base64 payloads.
pub struct ChartRenderer {
    output_dir: PathBuf,
    width: f64,
    height: f64,
}

impl ChartRenderer {
    /// Creates a renderer, ensuring the output directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::CreateDir`] if the directory cannot be created.
    pub fn new(output_dir: &Path, width: u32, height: u32) -> Result<Self, ChartError> {
        std::fs::create_dir_all(output_dir).map_err(|source| ChartError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            width: f64::from(width),
            height: f64::from(height),
        })
    }

    fn plot_region(&self) -> (f64, f64, f64, f64) {
        (
            MARGIN_LEFT,
            MARGIN_TOP,
            self.width - MARGIN_LEFT - MARGIN_RIGHT,
            self.height - MARGIN_TOP - MARGIN_BOTTOM,
        )
    }

    /// Saves a rendered document and builds the tool result payload.
    fn save(&self, chart_name: &str, svg_document: &str) -> Result<Value, ChartError> {
        let timestamp = Utc::now().timestamp_millis();
        let filename = format!("{chart_name}_{timestamp}.svg");
        let filepath = self.output_dir.join(&filename);

        std::fs::write(&filepath, svg_document).map_err(|source| ChartError::WriteFile {
            path: filepath.clone(),
            source,
        })?;

        Ok(json!({
            "success": true,
            "chart_type": chart_name,
            "file_path": filepath.display().to_string(),
            "filename": filename,
            "image_format": "svg",
            "image_base64": BASE64_STANDARD.encode(svg_document.as_bytes()),
            "description": format!("Chart saved as {filename}"),
        }))
    }

    /// Creates a chart of the given kind from a data object.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] only for environment failures; bad data shapes
    /// produce `{"error": ...}` payloads.
    pub fn create_chart(
        &self,
        kind: ChartKind,
        data: &Value,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) -> Result<Value, ChartError> {
        match kind {
            ChartKind::Line => self.line_chart(data, title, xlabel, ylabel),
            ChartKind::Bar => self.bar_chart(data, title, xlabel, ylabel),
            ChartKind::Scatter => self.scatter_chart(data, title, xlabel, ylabel),
            ChartKind::Pie => self.pie_chart(data, title),
            ChartKind::Histogram => self.histogram(data, title, xlabel, ylabel),
            ChartKind::Box => self.box_plot(data, title, xlabel, ylabel),
        }
    }

    fn line_chart(
        &self,
        data: &Value,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) -> Result<Value, ChartError> {
        let (Some(x), Some(y)) = (number_series(data, "x"), number_series(data, "y")) else {
            return Ok(data_error("Line chart requires 'x' and 'y' data arrays"));
        };
        if x.is_empty() || y.is_empty() {
            return Ok(data_error("Line chart requires 'x' and 'y' data arrays"));
        }
        if x.len() != y.len() {
            return Ok(data_error("x and y arrays must have the same length"));
        }

        let mut canvas = SvgCanvas::new(self.width, self.height);
        let frame = Frame::new(self.plot_region(), span(&x), span(&y));
        frame.draw_axes(&mut canvas);
        frame.draw_labels(&mut canvas, title, xlabel, ylabel);

        let points: Vec<(f64, f64)> = x
            .iter()
            .zip(&y)
            .map(|(&px, &py)| (frame.x(px), frame.y(py)))
            .collect();
        canvas.polyline(&points, PALETTE[0], 2.0);
        for &(px, py) in &points {
            canvas.circle(px, py, 3.5, PALETTE[0], "#ffffff", 1.0);
        }

        self.save("line_chart", &canvas.finish())
    }

    fn bar_chart(
        &self,
        data: &Value,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) -> Result<Value, ChartError> {
        let categories = label_series(data, "categories").or_else(|| label_series(data, "x"));
        let values = number_series(data, "values").or_else(|| number_series(data, "y"));
        let (Some(categories), Some(values)) = (categories, values) else {
            return Ok(data_error(
                "Bar chart requires 'categories' and 'values' data arrays",
            ));
        };
        if categories.is_empty() || values.is_empty() {
            return Ok(data_error(
                "Bar chart requires 'categories' and 'values' data arrays",
            ));
        }
        if categories.len() != values.len() {
            return Ok(data_error(
                "categories and values arrays must have the same length",
            ));
        }

        let mut canvas = SvgCanvas::new(self.width, self.height);
        let (y_lo, y_hi) = span(&values);
        let frame = Frame::new(
            self.plot_region(),
            (0.0, categories.len() as f64),
            (y_lo.min(0.0), y_hi.max(0.0)),
        );
        frame.draw_axes_without_x_ticks(&mut canvas);
        frame.draw_labels(&mut canvas, title, xlabel, ylabel);

        let slot = frame.width / categories.len() as f64;
        let bar_width = slot * 0.7;
        let baseline = frame.y(0.0);

        for (i, (category, &value)) in categories.iter().zip(&values).enumerate() {
            let x_centre = frame.left + (i as f64 + 0.5) * slot;
            let y_px = frame.y(value);
            let (top, height) = if value >= 0.0 {
                (y_px, baseline - y_px)
            } else {
                (baseline, y_px - baseline)
            };
            canvas.rect(
                x_centre - bar_width / 2.0,
                top,
                bar_width,
                height,
                PALETTE[i % PALETTE.len()],
                "none",
                0.0,
            );
            canvas.text(
                x_centre,
                frame.top + frame.height + 18.0,
                category,
                11.0,
                "middle",
                AXIS,
            );
        }

        self.save("bar_chart", &canvas.finish())
    }

    fn scatter_chart(
        &self,
        data: &Value,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) -> Result<Value, ChartError> {
        let (Some(x), Some(y)) = (number_series(data, "x"), number_series(data, "y")) else {
            return Ok(data_error("Scatter plot requires 'x' and 'y' data arrays"));
        };
        if x.is_empty() || y.is_empty() {
            return Ok(data_error("Scatter plot requires 'x' and 'y' data arrays"));
        }
        if x.len() != y.len() {
            return Ok(data_error("x and y arrays must have the same length"));
        }

        // Optional per-point sizes (marker area) and colour ranks
        let sizes = number_series(data, "sizes");
        let uniform_size = data.get("sizes").and_then(Value::as_f64);
        let colors = number_series(data, "colors");

        let mut canvas = SvgCanvas::new(self.width, self.height);
        let frame = Frame::new(self.plot_region(), span(&x), span(&y));
        frame.draw_axes(&mut canvas);
        frame.draw_labels(&mut canvas, title, xlabel, ylabel);

        let colour_span = colors.as_deref().map(span);

        for (i, (&px, &py)) in x.iter().zip(&y).enumerate() {
            let area = sizes
                .as_ref()
                .and_then(|s| s.get(i).copied())
                .or(uniform_size)
                .unwrap_or(50.0);
            let radius = (area.max(1.0)).sqrt() * 0.7;

            let fill = match (&colors, colour_span) {
                (Some(values), Some((lo, hi))) if hi > lo => {
                    let t = (values[i] - lo) / (hi - lo);
                    PALETTE[((t * (PALETTE.len() - 1) as f64).round() as usize)
                        .min(PALETTE.len() - 1)]
                }
                _ => PALETTE[0],
            };

            canvas.circle(frame.x(px), frame.y(py), radius, fill, "#ffffff", 0.5);
        }

        self.save("scatter_plot", &canvas.finish())
    }

    fn pie_chart(&self, data: &Value, title: Option<&str>) -> Result<Value, ChartError> {
        let (Some(labels), Some(values)) = (
            label_series(data, "labels"),
            number_series(data, "values"),
        ) else {
            return Ok(data_error("Pie chart requires 'labels' and 'values' data arrays"));
        };
        if labels.is_empty() || values.is_empty() {
            return Ok(data_error("Pie chart requires 'labels' and 'values' data arrays"));
        }
        if labels.len() != values.len() {
            return Ok(data_error("labels and values arrays must have the same length"));
        }
        if values.iter().any(|v| *v < 0.0) || values.iter().sum::<f64>() <= 0.0 {
            return Ok(data_error("Pie chart values must be non-negative and sum to a positive total"));
        }

        let mut canvas = SvgCanvas::new(self.width, self.height);
        if let Some(title) = title {
            canvas.bold_text(self.width / 2.0, 30.0, title, 16.0, "middle");
        }

        let legend_width = 180.0;
        let cx = (self.width - legend_width) / 2.0;
        let cy = self.height / 2.0 + 10.0;
        let radius = ((self.width - legend_width).min(self.height) / 2.0 - 50.0).max(40.0);

        let total: f64 = values.iter().sum();
        // Start at 12 o'clock, sweep clockwise
        let mut angle = -std::f64::consts::FRAC_PI_2;

        for (i, &value) in values.iter().enumerate() {
            let sweep = value / total * std::f64::consts::TAU;
            let colour = PALETTE[i % PALETTE.len()];

            if sweep >= std::f64::consts::TAU - 1e-9 {
                canvas.circle(cx, cy, radius, colour, "#ffffff", 1.0);
            } else if sweep > 0.0 {
                let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
                let end = angle + sweep;
                let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
                let large_arc = i32::from(sweep > std::f64::consts::PI);
                canvas.path(
                    &format!(
                        "M {cx:.2} {cy:.2} L {x1:.2} {y1:.2} A {radius:.2} {radius:.2} 0 {large_arc} 1 {x2:.2} {y2:.2} Z"
                    ),
                    colour,
                    "#ffffff",
                    1.0,
                );
            }

            if value > 0.0 {
                let mid = angle + sweep / 2.0;
                let lx = cx + radius * 0.6 * mid.cos();
                let ly = cy + radius * 0.6 * mid.sin();
                canvas.text(
                    lx,
                    ly + 4.0,
                    &format!("{:.1}%", value / total * 100.0),
                    12.0,
                    "middle",
                    "#ffffff",
                );
            }

            angle += sweep;
        }

        // Legend
        let legend_x = self.width - legend_width + 10.0;
        for (i, label) in labels.iter().enumerate() {
            let y = 60.0 + i as f64 * 22.0;
            canvas.rect(legend_x, y - 10.0, 12.0, 12.0, PALETTE[i % PALETTE.len()], "none", 0.0);
            canvas.text(legend_x + 18.0, y, label, 12.0, "start", AXIS);
        }

        self.save("pie_chart", &canvas.finish())
    }

    fn histogram(
        &self,
        data: &Value,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) -> Result<Value, ChartError> {
        let values = number_series(data, "values").or_else(|| number_series(data, "x"));
        let Some(values) = values.filter(|v| !v.is_empty()) else {
            return Ok(data_error("Histogram requires 'values' data array"));
        };

        let bins = data
            .get("bins")
            .and_then(Value::as_u64)
            .unwrap_or(30)
            .clamp(1, 200) as usize;

        let mut canvas = SvgCanvas::new(self.width, self.height);
        draw_histogram_panel(
            &mut canvas,
            self.plot_region(),
            &values,
            bins,
            title,
            xlabel,
            Some(ylabel.unwrap_or("Frequency")),
        );

        self.save("histogram", &canvas.finish())
    }

    fn box_plot(
        &self,
        data: &Value,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) -> Result<Value, ChartError> {
        let Some(datasets) = box_datasets(data) else {
            return Ok(data_error("Box plot requires 'values' data"));
        };

        let labels = label_series(data, "labels").unwrap_or_else(|| {
            if datasets.len() == 1 {
                vec!["Data".to_string()]
            } else {
                (1..=datasets.len()).map(|i| format!("Dataset {i}")).collect()
            }
        });

        let mut canvas = SvgCanvas::new(self.width, self.height);
        let all: Vec<f64> = datasets.iter().flatten().copied().collect();
        let frame = Frame::new(
            self.plot_region(),
            (0.0, datasets.len() as f64),
            span(&all),
        );
        frame.draw_axes_without_x_ticks(&mut canvas);
        frame.draw_labels(&mut canvas, title, xlabel, ylabel);

        for (i, dataset) in datasets.iter().enumerate() {
            let colour = PALETTE[i % PALETTE.len()];
            let x_centre = frame.left + (i as f64 + 0.5) * (frame.width / datasets.len() as f64);
            draw_box(&mut canvas, &frame, dataset, x_centre, colour);

            if let Some(label) = labels.get(i) {
                canvas.text(
                    x_centre,
                    frame.top + frame.height + 18.0,
                    label,
                    11.0,
                    "middle",
                    AXIS,
                );
            }
        }

        self.save("box_plot", &canvas.finish())
    }

    /// Plots a mathematical function over a range.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] only for environment failures; a malformed
    /// expression produces an `{"error": ...}` payload.
    pub fn plot_function(
        &self,
        expression: &str,
        x_range: (f64, f64),
        num_points: usize,
        title: Option<&str>,
    ) -> Result<Value, ChartError> {
        let parsed = match expr::parse(expression) {
            Ok(parsed) => parsed,
            Err(e) => return Ok(plot_error(expression, &e.to_string())),
        };

        let (x_min, x_max) = x_range;
        if x_min >= x_max {
            return Ok(plot_error(expression, "x_range must satisfy min < max"));
        }

        let num_points = num_points.clamp(10, 10_000);
        let step = (x_max - x_min) / (num_points - 1) as f64;

        // Sample the function, splitting the curve at non-finite values
        let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        let mut y_values: Vec<f64> = Vec::new();

        for i in 0..num_points {
            let x = x_min + i as f64 * step;
            match parsed.eval(Some(x)) {
                Ok(y) if y.is_finite() => {
                    current.push((x, y));
                    y_values.push(y);
                }
                Ok(_) => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                Err(e) => return Ok(plot_error(expression, &e.to_string())),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        if y_values.is_empty() {
            return Ok(plot_error(
                expression,
                "expression produced no finite values over the range",
            ));
        }

        let mut canvas = SvgCanvas::new(self.width, self.height);
        let frame = Frame::new(self.plot_region(), (x_min, x_max), span(&y_values));
        frame.draw_axes(&mut canvas);

        let default_title = format!("Plot of y = {expression}");
        frame.draw_labels(
            &mut canvas,
            Some(title.unwrap_or(&default_title)),
            Some("x"),
            Some("y"),
        );

        // Axes through the origin where visible
        let (y_lo, y_hi) = frame.y_range();
        if y_lo < 0.0 && y_hi > 0.0 {
            canvas.line(frame.left, frame.y(0.0), frame.left + frame.width, frame.y(0.0), AXIS, 0.5);
        }
        if x_min < 0.0 && x_max > 0.0 {
            canvas.line(frame.x(0.0), frame.top, frame.x(0.0), frame.top + frame.height, AXIS, 0.5);
        }

        for segment in &segments {
            let points: Vec<(f64, f64)> = segment
                .iter()
                .map(|&(x, y)| (frame.x(x), frame.y(y)))
                .collect();
            canvas.polyline(&points, PALETTE[0], 2.0);
        }

        self.save("function_plot", &canvas.finish())
    }

    /// Renders the 2×2 statistical summary for a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] only for environment failures.
    pub fn create_statistics_chart(
        &self,
        data: &[f64],
        chart_type: &str,
        title: Option<&str>,
    ) -> Result<Value, ChartError> {
        if data.is_empty() {
            return Ok(json!({"error": "No data provided for statistical analysis"}));
        }
        if chart_type != "all" {
            return Ok(json!({
                "error": format!("Unsupported statistics chart type: {chart_type}")
            }));
        }

        let mut canvas = SvgCanvas::new(self.width, self.height);
        if let Some(title) = title {
            canvas.bold_text(self.width / 2.0, 24.0, title, 16.0, "middle");
        }

        let panel = |row: usize, col: usize| -> (f64, f64, f64, f64) {
            let cell_w = self.width / 2.0;
            let cell_h = (self.height - 30.0) / 2.0;
            (
                col as f64 * cell_w + 65.0,
                30.0 + row as f64 * cell_h + 45.0,
                cell_w - 95.0,
                cell_h - 85.0,
            )
        };

        // Distribution
        draw_histogram_panel(
            &mut canvas,
            panel(0, 0),
            data,
            20,
            Some("Distribution"),
            Some("Value"),
            Some("Frequency"),
        );

        // Box plot
        let region = panel(0, 1);
        let frame = Frame::new(region, (0.0, 1.0), span(data));
        frame.draw_axes_without_x_ticks(&mut canvas);
        frame.draw_labels(&mut canvas, Some("Box Plot"), None, Some("Value"));
        draw_box(&mut canvas, &frame, data, frame.left + frame.width / 2.0, PALETTE[0]);

        // Quantile plot
        let region = panel(1, 0);
        let mut sorted = data.to_vec();
        sorted.sort_by(f64::total_cmp);
        let frame = Frame::new(region, (0.0, 1.0), span(&sorted));
        frame.draw_axes(&mut canvas);
        frame.draw_labels(
            &mut canvas,
            Some("Quantile Plot"),
            Some("Theoretical Quantiles"),
            Some("Sample Quantiles"),
        );
        let n = sorted.len();
        for (i, &value) in sorted.iter().enumerate() {
            let theoretical = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
            canvas.circle(frame.x(theoretical), frame.y(value), 2.5, PALETTE[0], "none", 0.0);
        }
        canvas.dashed_line(
            frame.x(0.0),
            frame.y(sorted[0]),
            frame.x(1.0),
            frame.y(sorted[n - 1]),
            PALETTE[3],
            1.5,
        );

        // Statistics summary
        let (sx, sy, _, _) = panel(1, 1);
        canvas.bold_text(sx, sy - 20.0, "Statistics Summary", 13.0, "start");
        for (i, line) in summary_lines(data).iter().enumerate() {
            canvas.text(sx, sy + i as f64 * 20.0, line, 12.0, "start", AXIS);
        }

        self.save("statistics_summary", &canvas.finish())
    }

    /// Visualises a geometric shape with an equal-aspect frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] only for environment failures; invalid vertex
    /// counts produce `{"error": ...}` payloads.
    pub fn visualize_geometry(
        &self,
        shape: ShapeKind,
        parameters: &Value,
        title: Option<&str>,
    ) -> Result<Value, ChartError> {
        match shape {
            ShapeKind::Circle => self.draw_circle(parameters, title),
            ShapeKind::Rectangle => self.draw_rectangle(parameters, title),
            ShapeKind::Triangle => self.draw_triangle(parameters, title),
            ShapeKind::Polygon => self.draw_polygon(parameters, title),
        }
    }

    /// Builds a square canvas and an equal-aspect frame centred on the given
    /// data region.
    fn shape_canvas(&self, centre: (f64, f64), half_span: f64) -> (SvgCanvas, Frame) {
        let side = self.height.min(self.width);
        let canvas = SvgCanvas::new(side, side);
        let frame = Frame::new(
            (55.0, 55.0, side - 110.0, side - 110.0),
            (centre.0 - half_span, centre.0 + half_span),
            (centre.1 - half_span, centre.1 + half_span),
        );
        (canvas, frame)
    }

    fn draw_circle(&self, params: &Value, title: Option<&str>) -> Result<Value, ChartError> {
        let radius = param_f64(params, "radius").unwrap_or(1.0);
        if radius <= 0.0 {
            return Ok(data_error("Circle radius must be positive"));
        }
        let centre = param_point(params, "center").unwrap_or((0.0, 0.0));

        let (mut canvas, frame) = self.shape_canvas(centre, radius * 1.2);
        frame.draw_axes(&mut canvas);

        let default_title = format!("Circle (radius={})", svg::format_tick(radius));
        frame.draw_labels(&mut canvas, Some(title.unwrap_or(&default_title)), None, None);

        let pixel_radius = frame.x(centre.0 + radius) - frame.x(centre.0);
        canvas.circle(frame.x(centre.0), frame.y(centre.1), pixel_radius, "none", PALETTE[0], 2.0);
        canvas.circle(frame.x(centre.0), frame.y(centre.1), 4.0, PALETTE[3], "none", 0.0);

        self.save("circle", &canvas.finish())
    }

    fn draw_rectangle(&self, params: &Value, title: Option<&str>) -> Result<Value, ChartError> {
        let width = param_f64(params, "width").unwrap_or(2.0);
        let height = param_f64(params, "height").unwrap_or(1.0);
        if width <= 0.0 || height <= 0.0 {
            return Ok(data_error("Rectangle width and height must be positive"));
        }
        let centre = param_point(params, "center").unwrap_or((0.0, 0.0));

        let half_span = width.max(height) * 0.7;
        let (mut canvas, frame) = self.shape_canvas(centre, half_span);
        frame.draw_axes(&mut canvas);

        let default_title = format!(
            "Rectangle ({}×{})",
            svg::format_tick(width),
            svg::format_tick(height)
        );
        frame.draw_labels(&mut canvas, Some(title.unwrap_or(&default_title)), None, None);

        let x0 = frame.x(centre.0 - width / 2.0);
        let y0 = frame.y(centre.1 + height / 2.0);
        canvas.rect(
            x0,
            y0,
            frame.x(centre.0 + width / 2.0) - x0,
            frame.y(centre.1 - height / 2.0) - y0,
            "none",
            PALETTE[0],
            2.0,
        );
        canvas.circle(frame.x(centre.0), frame.y(centre.1), 4.0, PALETTE[3], "none", 0.0);

        self.save("rectangle", &canvas.finish())
    }

    fn draw_triangle(&self, params: &Value, title: Option<&str>) -> Result<Value, ChartError> {
        let vertices = if params.get("vertices").is_some() {
            match param_vertices(params) {
                Some(vertices) => vertices,
                None => return Ok(data_error("Shape vertices must be [x, y] pairs")),
            }
        } else {
            vec![(0.0, 0.0), (1.0, 0.0), (0.5, 1.0)]
        };
        if vertices.len() != 3 {
            return Ok(data_error("Triangle requires exactly 3 vertices"));
        }

        self.draw_vertex_shape("triangle", &vertices, title.unwrap_or("Triangle"))
    }

    fn draw_polygon(&self, params: &Value, title: Option<&str>) -> Result<Value, ChartError> {
        let Some(vertices) = param_vertices(params).or_else(|| {
            params.get("vertices").is_none().then(Vec::new)
        }) else {
            return Ok(data_error("Shape vertices must be [x, y] pairs"));
        };
        if vertices.len() < 3 {
            return Ok(data_error("Polygon requires at least 3 vertices"));
        }

        let default_title = format!("Polygon ({} vertices)", vertices.len());
        let title = title.map_or(default_title, str::to_string);
        self.draw_vertex_shape("polygon", &vertices, &title)
    }

    fn draw_vertex_shape(
        &self,
        chart_name: &str,
        vertices: &[(f64, f64)],
        title: &str,
    ) -> Result<Value, ChartError> {
        let xs: Vec<f64> = vertices.iter().map(|v| v.0).collect();
        let ys: Vec<f64> = vertices.iter().map(|v| v.1).collect();
        let (x_lo, x_hi) = span(&xs);
        let (y_lo, y_hi) = span(&ys);

        let centre = ((x_lo + x_hi) / 2.0, (y_lo + y_hi) / 2.0);
        let half_span = ((x_hi - x_lo).max(y_hi - y_lo) / 2.0).max(0.5) * 1.4;

        let (mut canvas, frame) = self.shape_canvas(centre, half_span);
        frame.draw_axes(&mut canvas);
        frame.draw_labels(&mut canvas, Some(title), None, None);

        let points: Vec<(f64, f64)> = vertices
            .iter()
            .map(|&(x, y)| (frame.x(x), frame.y(y)))
            .collect();
        canvas.polygon(&points, "#aed6f1", PALETTE[0], 2.0);

        for (i, &(px, py)) in points.iter().enumerate() {
            canvas.circle(px, py, 4.0, PALETTE[3], "none", 0.0);
            canvas.text(px + 7.0, py - 7.0, &format!("V{}", i + 1), 11.0, "start", AXIS);
        }

        self.save(chart_name, &canvas.finish())
    }
}

/// Draws a histogram into the given region; shared between the standalone
/// histogram and the statistics summary panel.
#[allow(clippy::too_many_arguments)]
fn draw_histogram_panel(
    canvas: &mut SvgCanvas,
    region: (f64, f64, f64, f64),
    values: &[f64],
    bins: usize,
    title: Option<&str>,
    xlabel: Option<&str>,
    ylabel: Option<&str>,
) {
    let (mut lo, mut hi) = span(values);
    if hi - lo <= 0.0 {
        lo -= 0.5;
        hi += 0.5;
    }

    let bin_width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(1) as f64;

    let frame = Frame::new(region, (lo, hi), (0.0, max_count));
    frame.draw_axes(canvas);
    frame.draw_labels(canvas, title, xlabel, ylabel);

    for (i, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let x0 = frame.x(lo + i as f64 * bin_width);
        let x1 = frame.x(lo + (i as f64 + 1.0) * bin_width);
        let y = frame.y(count as f64);
        canvas.rect(
            x0,
            y,
            (x1 - x0 - 1.0).max(1.0),
            frame.y(0.0) - y,
            PALETTE[0],
            "#ffffff",
            0.5,
        );
    }
}

/// Builds the `{"error": ...}` payload for a data-shape problem.
fn data_error(message: &str) -> Value {
    json!({ "error": message })
}

/// Builds the error payload for a failed function plot.
fn plot_error(expression: &str, detail: &str) -> Value {
    json!({
        "error": format!("Error plotting function '{expression}': {detail}"),
        "suggestion": "Check that the expression uses valid mathematical operations",
    })
}

/// Extracts a numeric array from a data object.
fn number_series(data: &Value, key: &str) -> Option<Vec<f64>> {
    data.get(key)?
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect()
}

/// Extracts an array of labels from a data object, stringifying scalars.
fn label_series(data: &Value, key: &str) -> Option<Vec<String>> {
    let items = data.get(key)?.as_array()?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

/// Reads a numeric shape parameter.
fn param_f64(params: &Value, key: &str) -> Option<f64> {
    params.get(key).and_then(Value::as_f64)
}

/// Reads a `[x, y]` point parameter.
fn param_point(params: &Value, key: &str) -> Option<(f64, f64)> {
    let pair = params.get(key)?.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    Some((pair[0].as_f64()?, pair[1].as_f64()?))
}

/// Reads the `vertices` parameter: an array of `[x, y]` pairs.
fn param_vertices(params: &Value) -> Option<Vec<(f64, f64)>> {
    let items = params.get("vertices")?.as_array()?;
    items
        .iter()
        .map(|item| {
            let pair = item.as_array()?;
            if pair.len() != 2 {
                return None;
            }
            Some((pair[0].as_f64()?, pair[1].as_f64()?))
        })
        .collect()
}

/// Parses box-plot input: a flat dataset or a list of datasets.
fn box_datasets(data: &Value) -> Option<Vec<Vec<f64>>> {
    let values = data.get("values")?.as_array()?;
    if values.is_empty() {
        return None;
    }

    if values[0].is_array() {
        let datasets: Option<Vec<Vec<f64>>> = values
            .iter()
            .map(|v| v.as_array()?.iter().map(Value::as_f64).collect())
            .collect();
        datasets.filter(|sets| sets.iter().all(|set| !set.is_empty()))
    } else {
        let flat: Option<Vec<f64>> = values.iter().map(Value::as_f64).collect();
        flat.map(|set| vec![set])
    }
}

/// Min/max of a non-empty slice.
fn span(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// Draws a single box-and-whisker glyph centred at `x_centre`.
fn draw_box(canvas: &mut SvgCanvas, frame: &Frame, data: &[f64], x_centre: f64, colour: &str) {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 25.0);
    let median = percentile(&sorted, 50.0);
    let q3 = percentile(&sorted, 75.0);
    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];

    let half_width = (frame.width * 0.08).clamp(8.0, 40.0);

    // Whiskers with caps
    canvas.line(x_centre, frame.y(lo), x_centre, frame.y(q1), AXIS, 1.0);
    canvas.line(x_centre, frame.y(q3), x_centre, frame.y(hi), AXIS, 1.0);
    for value in [lo, hi] {
        canvas.line(
            x_centre - half_width / 2.0,
            frame.y(value),
            x_centre + half_width / 2.0,
            frame.y(value),
            AXIS,
            1.0,
        );
    }

    // Interquartile box and median
    canvas.rect(
        x_centre - half_width,
        frame.y(q3),
        half_width * 2.0,
        frame.y(q1) - frame.y(q3),
        colour,
        AXIS,
        1.0,
    );
    canvas.line(
        x_centre - half_width,
        frame.y(median),
        x_centre + half_width,
        frame.y(median),
        AXIS,
        1.5,
    );
}

/// Linear-interpolation percentile over pre-sorted data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation.
fn std_dev(data: &[f64]) -> f64 {
    let m = mean(data);
    (data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / data.len() as f64).sqrt()
}

/// The statistics summary lines for the 2×2 panel.
fn summary_lines(data: &[f64]) -> Vec<String> {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    vec![
        format!("Count: {}", data.len()),
        format!("Mean: {:.3}", mean(data)),
        format!("Median: {:.3}", percentile(&sorted, 50.0)),
        format!("Std Dev: {:.3}", std_dev(data)),
        format!("Min: {:.3}", sorted[0]),
        format!("Max: {:.3}", sorted[sorted.len() - 1]),
        format!("Q1: {:.3}", percentile(&sorted, 25.0)),
        format!("Q3: {:.3}", percentile(&sorted, 75.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn renderer(dir: &std::path::Path) -> ChartRenderer {
        ChartRenderer::new(dir, 960, 600).unwrap()
    }

    fn decode_svg(payload: &Value) -> String {
        let encoded = payload["image_base64"].as_str().unwrap();
        String::from_utf8(BASE64_STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn line_chart_success_payload() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .create_chart(
                ChartKind::Line,
                &json!({"x": [1, 2, 3], "y": [2, 4, 6]}),
                Some("Growth"),
                Some("t"),
                Some("v"),
            )
            .unwrap();

        assert_eq!(payload["success"], true);
        assert_eq!(payload["chart_type"], "line_chart");
        assert!(payload["filename"]
            .as_str()
            .unwrap()
            .starts_with("line_chart_"));

        let svg = decode_svg(&payload);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("polyline"));
        assert!(svg.contains("Growth"));

        // The file exists on disk and matches the inline payload
        let on_disk = std::fs::read_to_string(payload["file_path"].as_str().unwrap()).unwrap();
        assert_eq!(on_disk, svg);
    }

    #[test]
    fn line_chart_requires_matching_arrays() {
        let dir = tempdir().unwrap();
        let r = renderer(dir.path());

        let payload = r
            .create_chart(ChartKind::Line, &json!({"x": [1, 2]}), None, None, None)
            .unwrap();
        assert_eq!(payload["error"], "Line chart requires 'x' and 'y' data arrays");

        let payload = r
            .create_chart(
                ChartKind::Line,
                &json!({"x": [1, 2], "y": [1]}),
                None,
                None,
                None,
            )
            .unwrap();
        assert_eq!(payload["error"], "x and y arrays must have the same length");
    }

    #[test]
    fn bar_chart_accepts_x_y_aliases() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .create_chart(
                ChartKind::Bar,
                &json!({"x": ["A", "B", "C"], "y": [10, 20, 15]}),
                None,
                None,
                None,
            )
            .unwrap();
        assert_eq!(payload["success"], true);
        assert!(decode_svg(&payload).contains("rect"));
    }

    #[test]
    fn pie_chart_slices_and_legend() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .create_chart(
                ChartKind::Pie,
                &json!({"labels": ["A", "B"], "values": [30, 70]}),
                Some("Share"),
                None,
                None,
            )
            .unwrap();
        assert_eq!(payload["success"], true);

        let svg = decode_svg(&payload);
        assert!(svg.contains("path"));
        assert!(svg.contains("70.0%"));
        assert!(svg.contains(">A<"));
    }

    #[test]
    fn pie_chart_rejects_non_positive_totals() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .create_chart(
                ChartKind::Pie,
                &json!({"labels": ["A"], "values": [0]}),
                None,
                None,
                None,
            )
            .unwrap();
        assert!(payload["error"].as_str().unwrap().contains("positive"));
    }

    #[test]
    fn histogram_counts_bins() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .create_chart(
                ChartKind::Histogram,
                &json!({"values": [1, 2, 2, 3, 3, 3, 4, 4, 5], "bins": 5}),
                None,
                None,
                None,
            )
            .unwrap();
        assert_eq!(payload["success"], true);
        assert_eq!(payload["chart_type"], "histogram");
    }

    #[test]
    fn box_plot_single_and_multiple_datasets() {
        let dir = tempdir().unwrap();
        let r = renderer(dir.path());

        let payload = r
            .create_chart(
                ChartKind::Box,
                &json!({"values": [1, 2, 3, 4, 5, 6, 7, 8, 9]}),
                None,
                None,
                None,
            )
            .unwrap();
        assert_eq!(payload["success"], true);
        assert!(decode_svg(&payload).contains(">Data<"));

        let payload = r
            .create_chart(
                ChartKind::Box,
                &json!({"values": [[1, 2, 3], [4, 5, 6]]}),
                None,
                None,
                None,
            )
            .unwrap();
        assert!(decode_svg(&payload).contains("Dataset 2"));
    }

    #[test]
    fn function_plot_quadratic() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .plot_function("x**2", (-10.0, 10.0), 100, None)
            .unwrap();

        assert_eq!(payload["success"], true);
        assert_eq!(payload["chart_type"], "function_plot");
        assert!(decode_svg(&payload).contains("Plot of y = x**2"));
    }

    #[test]
    fn function_plot_skips_singularities() {
        let dir = tempdir().unwrap();
        // 1/x is non-finite at x = 0; the curve splits but still renders
        let payload = renderer(dir.path())
            .plot_function("1/x", (-5.0, 5.0), 101, None)
            .unwrap();
        assert_eq!(payload["success"], true);
    }

    #[test]
    fn function_plot_reports_bad_expressions() {
        let dir = tempdir().unwrap();
        let payload = renderer(dir.path())
            .plot_function("frob(x)", (-1.0, 1.0), 50, None)
            .unwrap();
        let error = payload["error"].as_str().unwrap();
        assert!(error.contains("Error plotting function 'frob(x)'"));
        assert!(payload.get("suggestion").is_some());
    }

    #[test]
    fn statistics_chart_panels() {
        let dir = tempdir().unwrap();
        let data: Vec<f64> = (1..=50).map(f64::from).collect();
        let payload = renderer(dir.path())
            .create_statistics_chart(&data, "all", Some("Sample"))
            .unwrap();

        assert_eq!(payload["success"], true);
        let svg = decode_svg(&payload);
        assert!(svg.contains("Distribution"));
        assert!(svg.contains("Quantile Plot"));
        assert!(svg.contains("Mean: 25.500"));
        assert!(svg.contains("Q3: 37.750"));
    }

    #[test]
    fn statistics_chart_rejects_empty_and_unknown() {
        let dir = tempdir().unwrap();
        let r = renderer(dir.path());

        let payload = r.create_statistics_chart(&[], "all", None).unwrap();
        assert_eq!(payload["error"], "No data provided for statistical analysis");

        let payload = r.create_statistics_chart(&[1.0], "violin", None).unwrap();
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .contains("Unsupported statistics chart type"));
    }

    #[test]
    fn geometry_shapes() {
        let dir = tempdir().unwrap();
        let r = renderer(dir.path());

        let payload = r
            .visualize_geometry(ShapeKind::Circle, &json!({"radius": 2.5}), None)
            .unwrap();
        assert_eq!(payload["success"], true);
        assert!(decode_svg(&payload).contains("Circle (radius=2.5)"));

        let payload = r
            .visualize_geometry(
                ShapeKind::Polygon,
                &json!({"vertices": [[0, 0], [2, 0], [2, 2], [0, 2]]}),
                None,
            )
            .unwrap();
        assert!(decode_svg(&payload).contains("Polygon (4 vertices)"));
        assert!(decode_svg(&payload).contains("V4"));
    }

    #[test]
    fn geometry_vertex_count_errors() {
        let dir = tempdir().unwrap();
        let r = renderer(dir.path());

        let payload = r
            .visualize_geometry(
                ShapeKind::Triangle,
                &json!({"vertices": [[0, 0], [1, 0]]}),
                None,
            )
            .unwrap();
        assert_eq!(payload["error"], "Triangle requires exactly 3 vertices");

        let payload = r
            .visualize_geometry(ShapeKind::Polygon, &json!({"vertices": []}), None)
            .unwrap();
        assert_eq!(payload["error"], "Polygon requires at least 3 vertices");
    }

    #[test]
    fn percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&sorted, 100.0) - 4.0).abs() < 1e-12);
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
    }
}
