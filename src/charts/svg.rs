//! SVG document building blocks for the chart renderer.
//!
//! [`SvgCanvas`] accumulates shape elements and produces a self-contained
//! SVG document. [`Frame`] maps data coordinates into a pixel region of the
//! canvas, with the y axis inverted for display.

#![allow(clippy::cast_precision_loss)] // tick indices are tiny

use std::fmt::Write;

/// Categorical colour palette, cycled per series/slice.
pub const PALETTE: [&str; 8] = [
    "#4c78a8", "#f58518", "#54a24b", "#e45756", "#72b7b2", "#eeca3b", "#b279a2", "#9d755d",
];

/// Grid line colour.
pub const GRID: &str = "#e0e0e0";

/// Axis and border colour.
pub const AXIS: &str = "#333333";

/// Escapes text content for embedding in SVG.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Formats an axis tick value compactly.
pub fn format_tick(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() >= 10_000.0 || value.abs() < 0.001 {
        return format!("{value:.2e}");
    }

    let formatted = format!("{value:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// An SVG document under construction.
pub struct SvgCanvas {
    width: f64,
    height: f64,
    body: String,
}

impl SvgCanvas {
    /// Creates a canvas with a white background.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let mut canvas = Self {
            width,
            height,
            body: String::new(),
        };
        canvas.rect(0.0, 0.0, width, height, "#ffffff", "none", 0.0);
        canvas
    }

    /// Canvas width in pixels.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Canvas height in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Adds a line segment.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, stroke_width: f64) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        );
    }

    /// Adds a dashed line segment.
    pub fn dashed_line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: &str,
        stroke_width: f64,
    ) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{stroke}" stroke-width="{stroke_width}" stroke-dasharray="6 4"/>"#
        );
    }

    /// Adds an open polyline through the given pixel points.
    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, stroke_width: f64) {
        if points.is_empty() {
            return;
        }
        let coords = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            self.body,
            r#"<polyline points="{coords}" fill="none" stroke="{stroke}" stroke-width="{stroke_width}" stroke-linejoin="round"/>"#
        );
    }

    /// Adds a closed polygon.
    pub fn polygon(&mut self, points: &[(f64, f64)], fill: &str, stroke: &str, stroke_width: f64) {
        if points.is_empty() {
            return;
        }
        let coords = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            self.body,
            r#"<polygon points="{coords}" fill="{fill}" fill-opacity="0.3" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        );
    }

    /// Adds a rectangle.
    pub fn rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: &str,
        stroke: &str,
        stroke_width: f64,
    ) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        );
    }

    /// Adds a circle.
    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str, stroke: &str, stroke_width: f64) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        );
    }

    /// Adds an arbitrary path.
    pub fn path(&mut self, d: &str, fill: &str, stroke: &str, stroke_width: f64) {
        let _ = writeln!(
            self.body,
            r#"<path d="{d}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        );
    }

    /// Adds a text element. `anchor` is one of `start`, `middle`, `end`.
    pub fn text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: &str, fill: &str) {
        let _ = writeln!(
            self.body,
            r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{size}" text-anchor="{anchor}" fill="{fill}">{}</text>"#,
            escape(content)
        );
    }

    /// Adds a bold text element.
    pub fn bold_text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: &str) {
        let _ = writeln!(
            self.body,
            r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{size}" font-weight="bold" text-anchor="{anchor}" fill="{AXIS}">{}</text>"#,
            escape(content)
        );
    }

    /// Finalises the document.
    #[must_use]
    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" viewBox=\"0 0 {w:.0} {h:.0}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }
}

/// A rectangular pixel region with an attached data coordinate system.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Left edge of the plot region, in pixels.
    pub left: f64,
    /// Top edge of the plot region, in pixels.
    pub top: f64,
    /// Region width in pixels.
    pub width: f64,
    /// Region height in pixels.
    pub height: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    /// Creates a frame mapping the given data ranges onto a pixel region.
    ///
    /// Degenerate (zero-span) ranges are widened so every point stays
    /// representable.
    #[must_use]
    pub fn new(
        (left, top, width, height): (f64, f64, f64, f64),
        (mut x_min, mut x_max): (f64, f64),
        (mut y_min, mut y_max): (f64, f64),
    ) -> Self {
        if x_max - x_min <= 0.0 {
            let pad = if x_min == 0.0 { 1.0 } else { x_min.abs() * 0.5 };
            x_min -= pad;
            x_max += pad;
        }
        if y_max - y_min <= 0.0 {
            let pad = if y_min == 0.0 { 1.0 } else { y_min.abs() * 0.5 };
            y_min -= pad;
            y_max += pad;
        }

        Self {
            left,
            top,
            width,
            height,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Maps a data x value to a pixel x coordinate.
    #[must_use]
    pub fn x(&self, x: f64) -> f64 {
        self.left + (x - self.x_min) / (self.x_max - self.x_min) * self.width
    }

    /// Maps a data y value to a pixel y coordinate (inverted).
    #[must_use]
    pub fn y(&self, y: f64) -> f64 {
        self.top + self.height - (y - self.y_min) / (self.y_max - self.y_min) * self.height
    }

    /// Data x range.
    #[must_use]
    pub const fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    /// Data y range.
    #[must_use]
    pub const fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    /// Draws the plot border, gridlines, and tick labels.
    pub fn draw_axes(&self, canvas: &mut SvgCanvas) {
        const TICKS: usize = 5;

        // Horizontal gridlines and y tick labels
        for i in 0..=TICKS {
            let t = i as f64 / TICKS as f64;
            let value = self.y_min + t * (self.y_max - self.y_min);
            let py = self.y(value);
            if i > 0 && i < TICKS {
                canvas.line(self.left, py, self.left + self.width, py, GRID, 1.0);
            }
            canvas.text(self.left - 8.0, py + 4.0, &format_tick(value), 11.0, "end", AXIS);
        }

        // Vertical gridlines and x tick labels
        for i in 0..=TICKS {
            let t = i as f64 / TICKS as f64;
            let value = self.x_min + t * (self.x_max - self.x_min);
            let px = self.x(value);
            if i > 0 && i < TICKS {
                canvas.line(px, self.top, px, self.top + self.height, GRID, 1.0);
            }
            canvas.text(
                px,
                self.top + self.height + 18.0,
                &format_tick(value),
                11.0,
                "middle",
                AXIS,
            );
        }

        // Border
        canvas.rect(self.left, self.top, self.width, self.height, "none", AXIS, 1.0);
    }

    /// Draws the border, horizontal gridlines, and y tick labels only.
    ///
    /// Used by categorical charts (bar, box) that label slots instead of a
    /// continuous x axis.
    pub fn draw_axes_without_x_ticks(&self, canvas: &mut SvgCanvas) {
        const TICKS: usize = 5;

        for i in 0..=TICKS {
            let t = i as f64 / TICKS as f64;
            let value = self.y_min + t * (self.y_max - self.y_min);
            let py = self.y(value);
            if i > 0 && i < TICKS {
                canvas.line(self.left, py, self.left + self.width, py, GRID, 1.0);
            }
            canvas.text(self.left - 8.0, py + 4.0, &format_tick(value), 11.0, "end", AXIS);
        }

        canvas.rect(self.left, self.top, self.width, self.height, "none", AXIS, 1.0);
    }

    /// Draws the chart title and axis labels around the region.
    pub fn draw_labels(
        &self,
        canvas: &mut SvgCanvas,
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
    ) {
        if let Some(title) = title {
            canvas.bold_text(self.left + self.width / 2.0, self.top - 14.0, title, 16.0, "middle");
        }
        if let Some(xlabel) = xlabel {
            canvas.text(
                self.left + self.width / 2.0,
                self.top + self.height + 38.0,
                xlabel,
                12.0,
                "middle",
                AXIS,
            );
        }
        if let Some(ylabel) = ylabel {
            // Rotated 90° around its anchor point on the far left
            let x = self.left - 42.0;
            let y = self.top + self.height / 2.0;
            let _ = std::fmt::Write::write_fmt(
                &mut canvas.body,
                format_args!(
                    r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="12" text-anchor="middle" fill="{AXIS}" transform="rotate(-90 {x:.2} {y:.2})">{}</text>
"#,
                    escape(ylabel)
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_produces_valid_document() {
        let mut canvas = SvgCanvas::new(100.0, 50.0);
        canvas.line(0.0, 0.0, 100.0, 50.0, "#000", 1.0);
        canvas.text(10.0, 10.0, "a < b & c", 12.0, "start", "#000");

        let svg = canvas.finish();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn frame_maps_corners() {
        let frame = Frame::new((10.0, 10.0, 100.0, 100.0), (0.0, 10.0), (0.0, 5.0));

        assert!((frame.x(0.0) - 10.0).abs() < 1e-9);
        assert!((frame.x(10.0) - 110.0).abs() < 1e-9);
        // y is inverted: data minimum sits at the bottom
        assert!((frame.y(0.0) - 110.0).abs() < 1e-9);
        assert!((frame.y(5.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn frame_widens_degenerate_ranges() {
        let frame = Frame::new((0.0, 0.0, 100.0, 100.0), (3.0, 3.0), (0.0, 0.0));
        let (x_min, x_max) = frame.x_range();
        let (y_min, y_max) = frame.y_range();
        assert!(x_max > x_min);
        assert!(y_max > y_min);
        // The original point remains inside the widened range
        assert!(x_min < 3.0 && 3.0 < x_max);
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(10.0), "10");
        assert_eq!(format_tick(0.125), "0.125");
        assert!(format_tick(1.0e6).contains('e'));
    }
}
